//! Metrics infrastructure for the MSAP node.
//!
//! Every metric the engine and runner emit is declared here as a [`Metric`]
//! constant, so names and label keys live in one place. The `metrics` crate
//! is re-exported for convenience.
//!
//! # Example
//!
//! ```rust,ignore
//! use msap_metrics::{describe_metrics, metric_defs, MetricLabels};
//!
//! describe_metrics();
//!
//! let labels = MetricLabels::new("node_1", "sink");
//! metrics::counter!(metric_defs::FRAMES_RECEIVED.name, &labels.with_function("stack_start"))
//!     .increment(1);
//! ```

pub use metrics;

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

/// The kind of metric (counter, gauge, or histogram).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// A monotonically increasing counter.
    Counter,
    /// A gauge that can go up and down.
    Gauge,
    /// A histogram for recording distributions.
    Histogram,
}

impl MetricKind {
    /// Returns the kind as a lowercase string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric declaration with its metadata.
///
/// ```rust
/// use msap_metrics::{Metric, MetricKind};
/// use metrics::Unit;
///
/// const RETRIES: Metric = Metric::counter("msap.link.retries")
///     .with_description("Link retries")
///     .with_unit(Unit::Count)
///     .with_labels(&["node"]);
///
/// assert_eq!(RETRIES.name, "msap.link.retries");
/// assert_eq!(RETRIES.kind, MetricKind::Counter);
/// ```
#[derive(Debug, Clone)]
pub struct Metric {
    /// The metric name (e.g., "msap.frames.received").
    pub name: &'static str,
    /// The kind of metric.
    pub kind: MetricKind,
    /// Human-readable description.
    pub description: &'static str,
    /// The unit of measurement (optional).
    pub unit: Option<Unit>,
    /// Expected label keys.
    pub labels: &'static [&'static str],
}

impl Metric {
    const fn new(name: &'static str, kind: MetricKind) -> Self {
        Self {
            name,
            kind,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    /// Creates a new counter metric.
    pub const fn counter(name: &'static str) -> Self {
        Self::new(name, MetricKind::Counter)
    }

    /// Creates a new gauge metric.
    pub const fn gauge(name: &'static str) -> Self {
        Self::new(name, MetricKind::Gauge)
    }

    /// Creates a new histogram metric.
    pub const fn histogram(name: &'static str) -> Self {
        Self::new(name, MetricKind::Histogram)
    }

    /// Sets the description.
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Sets the unit.
    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Sets the expected label keys.
    pub const fn with_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    /// Registers this metric's description with the installed recorder.
    pub fn describe(&self) {
        match (self.kind, self.unit) {
            (MetricKind::Counter, Some(unit)) => {
                describe_counter!(self.name, unit, self.description);
            }
            (MetricKind::Counter, None) => {
                describe_counter!(self.name, self.description);
            }
            (MetricKind::Gauge, Some(unit)) => {
                describe_gauge!(self.name, unit, self.description);
            }
            (MetricKind::Gauge, None) => {
                describe_gauge!(self.name, self.description);
            }
            (MetricKind::Histogram, Some(unit)) => {
                describe_histogram!(self.name, unit, self.description);
            }
            (MetricKind::Histogram, None) => {
                describe_histogram!(self.name, self.description);
            }
        }
    }
}

/// All metric definitions for the node.
pub mod metric_defs {
    use super::{Metric, Unit};

    /// Labels present on every node-scoped metric.
    pub const STANDARD_LABELS: &[&str] = &["node", "role"];

    // ========================================================================
    // Frame Dispatch
    // ========================================================================

    /// Request frames accepted for dispatch.
    pub const FRAMES_RECEIVED: Metric = Metric::counter("msap.frames.received")
        .with_description("Request frames accepted for dispatch")
        .with_unit(Unit::Count)
        .with_labels(&["node", "role", "function"]);

    /// Request frames dropped because their payload length was wrong.
    pub const FRAMES_REJECTED: Metric = Metric::counter("msap.frames.rejected")
        .with_description("Request frames rejected before any side effect")
        .with_unit(Unit::Count)
        .with_labels(&["node", "role", "function"]);

    /// Frames with a function code no handler is registered for.
    pub const FRAMES_UNHANDLED: Metric = Metric::counter("msap.frames.unhandled")
        .with_description("Frames with an unknown function code")
        .with_unit(Unit::Count)
        .with_labels(&["node", "role"]);

    /// Confirms produced by handlers.
    pub const CONFIRMS_SENT: Metric = Metric::counter("msap.confirms.sent")
        .with_description("Confirms handed to the transport")
        .with_unit(Unit::Count)
        .with_labels(&["node", "role", "function"]);

    /// Time spent inside a handler.
    ///
    /// Scratchpad clear and block writes can block for seconds.
    pub const HANDLER_DURATION: Metric = Metric::histogram("msap.handler.duration_us")
        .with_description("Handler execution time in microseconds")
        .with_unit(Unit::Microseconds)
        .with_labels(&["node", "role", "function"]);

    /// Items could not be reserved because a pool was empty.
    pub const POOL_EXHAUSTED: Metric = Metric::counter("msap.pool.exhausted")
        .with_description("Item reservations that found the pool empty")
        .with_unit(Unit::Count)
        .with_labels(&["node", "role", "pool"]);

    // ========================================================================
    // Indications
    // ========================================================================

    /// Indications queued for the host.
    pub const INDICATIONS_QUEUED: Metric = Metric::counter("msap.indications.queued")
        .with_description("Indications queued for the host")
        .with_unit(Unit::Count)
        .with_labels(&["node", "role", "indication"]);

    /// Indications dropped because no item was free.
    pub const INDICATIONS_DROPPED: Metric = Metric::counter("msap.indications.dropped")
        .with_description("Indications dropped for lack of a free item")
        .with_unit(Unit::Count)
        .with_labels(&["node", "role", "indication"]);

    /// Indications currently waiting to be sent.
    pub const INDICATIONS_PENDING: Metric = Metric::gauge("msap.indications.pending")
        .with_description("Indications waiting to be sent")
        .with_unit(Unit::Count)
        .with_labels(&["node", "role"]);

    // ========================================================================
    // Node Lifecycle
    // ========================================================================

    /// Scratchpad image bytes accepted.
    pub const SCRATCHPAD_BYTES_WRITTEN: Metric = Metric::counter("msap.scratchpad.bytes_written")
        .with_description("Scratchpad image bytes accepted")
        .with_unit(Unit::Bytes)
        .with_labels(&["node", "role"]);

    /// Reboots performed after a stack stop confirm.
    pub const NODE_REBOOTS: Metric = Metric::counter("msap.node.reboots")
        .with_description("Reboots performed after a stack stop")
        .with_unit(Unit::Count)
        .with_labels(&["node", "role"]);

    /// Host connections accepted by the runner.
    pub const HOST_CONNECTIONS: Metric = Metric::counter("msap.host.connections")
        .with_description("Host connections accepted")
        .with_unit(Unit::Count)
        .with_labels(&["node", "role"]);

    /// Every metric declared above.
    pub const ALL: &[&Metric] = &[
        &FRAMES_RECEIVED,
        &FRAMES_REJECTED,
        &FRAMES_UNHANDLED,
        &CONFIRMS_SENT,
        &HANDLER_DURATION,
        &POOL_EXHAUSTED,
        &INDICATIONS_QUEUED,
        &INDICATIONS_DROPPED,
        &INDICATIONS_PENDING,
        &SCRATCHPAD_BYTES_WRITTEN,
        &NODE_REBOOTS,
        &HOST_CONNECTIONS,
    ];
}

/// Labels identifying the node a metric belongs to.
#[derive(Debug, Clone, Default)]
pub struct MetricLabels {
    /// Node name.
    pub node: String,
    /// Node role (sink, router, leaf).
    pub role: String,
}

impl MetricLabels {
    /// Creates labels for a node.
    pub fn new(node: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            role: role.into(),
        }
    }

    /// Converts the labels to the metrics crate label format.
    pub fn to_labels(&self) -> Vec<(&'static str, String)> {
        vec![("node", self.node.clone()), ("role", self.role.clone())]
    }

    /// Returns labels with additional key-value pairs.
    pub fn with(&self, extra: &[(&'static str, String)]) -> Vec<(&'static str, String)> {
        let mut labels = self.to_labels();
        labels.extend_from_slice(extra);
        labels
    }

    /// Returns labels with a `function` label appended.
    pub fn with_function(&self, function: &str) -> Vec<(&'static str, String)> {
        self.with(&[("function", function.to_string())])
    }
}

/// Describes all metrics with the installed recorder.
///
/// Call once at startup, after the recorder is installed.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}
