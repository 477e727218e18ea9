//! The MSAP dispatch engine.
//!
//! [`Msap`] owns the injected platform, the two item pools and the
//! indication queue. The transport drives it one frame at a time:
//!
//! ```text
//! accept(frame) -> handle(item) -> pre_send(item) -> transmit -> post_send(item)
//! ```
//!
//! Indications are queued by the `notify_*` methods and drained with
//! [`Msap::next_indication`], passing through the same pre/post-send steps.

use std::time::Instant;

use msap_metrics::{metric_defs, MetricLabels};
use msap_protocol::*;
use tracing::{debug, info, warn};

use crate::config::MsapConfig;
use crate::handlers;
use crate::indication::{self, IndicationQueue};
use crate::item::{Item, ItemKind, ItemPool, PostSend, PreSend};
use crate::platform::Platform;

/// What happened to a request item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The item now holds the confirm; send it.
    Responded,
    /// The request was malformed or could not be answered; send nothing.
    Rejected,
    /// No handler exists for the function code; the item is untouched.
    Unhandled,
}

/// The MSAP engine.
pub struct Msap<P> {
    platform: P,
    requests: ItemPool,
    indications: ItemPool,
    queue: IndicationQueue,
    labels: MetricLabels,
}

impl<P: Platform> Msap<P> {
    /// Create an engine around a platform.
    pub fn new(platform: P, config: MsapConfig) -> Self {
        Msap {
            platform,
            requests: ItemPool::new(ItemKind::Request, config.request_items),
            indications: ItemPool::new(ItemKind::Indication, config.indication_items),
            queue: IndicationQueue::default(),
            labels: MetricLabels::new(config.name, "node"),
        }
    }

    /// Replace the labels attached to every metric.
    pub fn with_labels(mut self, labels: MetricLabels) -> Self {
        self.labels = labels;
        self
    }

    /// The platform.
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// The platform, mutably.
    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    // ========================================================================
    // Request Path
    // ========================================================================

    /// Reserve a request item for an inbound frame.
    ///
    /// Returns `None` when every request item is in flight.
    pub fn accept(&mut self, frame: Frame) -> Option<Item> {
        let Some(mut item) = self.requests.reserve() else {
            warn!(function = frame.function, "request pool exhausted, dropping frame");
            metrics::counter!(
                metric_defs::POOL_EXHAUSTED.name,
                &self.labels.with(&[("pool", ItemKind::Request.name().to_string())])
            )
            .increment(1);
            return None;
        };
        item.load(frame);
        Some(item)
    }

    /// Dispatch a request item to its handler.
    ///
    /// On [`Outcome::Responded`] the item has been rewritten into its confirm.
    pub fn handle(&mut self, item: &mut Item) -> Outcome {
        let code = match RequestCode::try_from(item.frame.function) {
            Ok(code) => code,
            Err(_) => {
                warn!(function = item.frame.function, "no handler for function code");
                metrics::counter!(metric_defs::FRAMES_UNHANDLED.name, &self.labels.to_labels())
                    .increment(1);
                return Outcome::Unhandled;
            }
        };

        let labels = self.labels.with_function(code.name());
        metrics::counter!(metric_defs::FRAMES_RECEIVED.name, &labels).increment(1);

        let request = match Request::decode(&item.frame) {
            Ok(request) => request,
            Err(err) => {
                warn!(%err, function = code.name(), "rejecting malformed request");
                metrics::counter!(metric_defs::FRAMES_REJECTED.name, &labels).increment(1);
                return Outcome::Rejected;
            }
        };

        debug!(
            function = code.name(),
            seq = item.frame.sequence_id,
            "handling request"
        );

        let block_len = match &request {
            Request::ScratchpadBlock { bytes, .. } => bytes.len(),
            _ => 0,
        };

        let started = Instant::now();
        let reply = handlers::dispatch(&mut self.platform, request);
        metrics::histogram!(metric_defs::HANDLER_DURATION.name, &labels)
            .record(started.elapsed().as_micros() as f64);

        let Some(reply) = reply else {
            metrics::counter!(metric_defs::FRAMES_REJECTED.name, &labels).increment(1);
            return Outcome::Rejected;
        };

        if let Confirm::ScratchpadBlock(
            ScratchpadBlockResult::Success
            | ScratchpadBlockResult::CompletedOk
            | ScratchpadBlockResult::CompletedError,
        ) = reply.confirm
        {
            metrics::counter!(
                metric_defs::SCRATCHPAD_BYTES_WRITTEN.name,
                &self.labels.to_labels()
            )
            .increment(block_len as u64);
        }

        item.respond(&reply.confirm, reply.pre_send, reply.post_send);
        metrics::counter!(metric_defs::CONFIRMS_SENT.name, &labels).increment(1);
        Outcome::Responded
    }

    /// Run the item's pre-send step, if any. Call right before transmitting.
    pub fn pre_send(&mut self, item: &mut Item) {
        match item.take_pre_send() {
            Some(PreSend::StampSystemTime) => {
                let timestamp = self.platform.coarse_timestamp().to_le_bytes();
                let range = ATTR_READ_CNF_HEADER_SIZE..ATTR_READ_CNF_HEADER_SIZE + 4;
                if let Some(value) = item.frame.payload.get_mut(range) {
                    value.copy_from_slice(&timestamp);
                }
            }
            Some(PreSend::PendingIndications) => {
                let pending = u8::from(self.has_pending_indication());
                if let Some(byte) = item.frame.payload.get_mut(INDICATION_PENDING_OFFSET) {
                    *byte = pending;
                }
            }
            None => {}
        }
    }

    /// Run the item's post-send step, if any, and return it to its pool.
    /// Call after the frame has been transmitted.
    pub fn post_send(&mut self, mut item: Item) {
        if let Some(PostSend::Reboot) = item.take_post_send() {
            info!("rebooting after stack stop confirm");
            metrics::counter!(metric_defs::NODE_REBOOTS.name, &self.labels.to_labels())
                .increment(1);
            self.platform.stop_stack();
        }
        self.release(item);
    }

    /// Return an item to its pool without running any step.
    pub fn release(&mut self, item: Item) {
        match item.kind() {
            ItemKind::Request => self.requests.release(item),
            ItemKind::Indication => self.indications.release(item),
        }
    }

    // ========================================================================
    // Indication Path
    // ========================================================================

    /// Queue a stack state indication reflecting the current stack state.
    pub fn notify_stack_state(&mut self) {
        let flags = StackStateFlags::from(self.platform.stack_state());
        self.enqueue(indication::stack_state(flags));
    }

    /// Queue an app config indication. A newer config replaces a queued one.
    pub fn notify_app_config(&mut self, seq: u8, config: &[u8; APP_CONFIG_SIZE], interval: u16) {
        let ind = indication::app_config_received(seq, config, interval);
        if let Some(item) = self.queue.find_mut(IndicationCode::AppConfigReceived) {
            debug!(seq, "replacing queued app config indication");
            item.indicate(&ind);
            return;
        }
        self.enqueue(ind);
    }

    /// Queue a scan complete indication, unless one is already queued.
    pub fn notify_scan_complete(&mut self) {
        if self.queue.find_mut(IndicationCode::ScanNeighbors).is_some() {
            debug!("scan complete indication already queued");
            return;
        }
        self.enqueue(indication::scan_complete());
    }

    /// Take the oldest queued indication.
    pub fn next_indication(&mut self) -> Option<Item> {
        let item = self.queue.pop();
        self.update_pending_gauge();
        item
    }

    /// Whether any indication is waiting, here or in the data plane.
    pub fn has_pending_indication(&self) -> bool {
        !self.queue.is_empty() || self.platform.queued_indications() > 0
    }

    /// Number of indications queued in the engine.
    pub fn queued_indications(&self) -> usize {
        self.queue.len()
    }

    fn enqueue(&mut self, ind: Indication) {
        let kind = format!("{:?}", ind.kind());
        let Some(mut item) = self.indications.reserve() else {
            warn!(indication = %kind, "indication pool exhausted, dropping indication");
            metrics::counter!(
                metric_defs::INDICATIONS_DROPPED.name,
                &self.labels.with(&[("indication", kind)])
            )
            .increment(1);
            return;
        };

        item.indicate(&ind);
        self.queue.push(item);
        metrics::counter!(
            metric_defs::INDICATIONS_QUEUED.name,
            &self.labels.with(&[("indication", kind)])
        )
        .increment(1);
        self.update_pending_gauge();
    }

    fn update_pending_gauge(&self) {
        metrics::gauge!(metric_defs::INDICATIONS_PENDING.name, &self.labels.to_labels())
            .set(self.queue.len() as f64);
    }
}
