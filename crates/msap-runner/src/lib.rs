//! MSAP Node Runner
//!
//! Loads a simulated node from a YAML model and exposes its management
//! port over TCP. A host connects, writes request frames and reads back
//! confirms; queued indications are delivered after each poll confirm.
//!
//! Clients are served one at a time and frames are processed one at a
//! time, so the engine never sees overlapping requests.

mod config;
mod error;
mod server;

pub use config::RunnerConfig;
pub use error::RunnerError;
pub use server::{read_frame, MsapServer, NodeInfo};
