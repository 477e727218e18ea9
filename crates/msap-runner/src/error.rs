//! Runner errors.

use thiserror::Error;

use msap_core::ConfigError;
use msap_protocol::ProtocolError;

/// Errors that stop the runner or a client session.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// Socket or file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An outgoing frame could not be encoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The Ctrl-C handler could not be installed.
    #[error("signal handler error: {0}")]
    Signal(#[from] ctrlc::Error),
}
