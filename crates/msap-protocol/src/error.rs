//! Protocol error types.

use thiserror::Error;

/// Errors that can occur when encoding or decoding MSAP frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Buffer is too short to hold a frame header.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Expected minimum length.
        expected: usize,
        /// Actual length received.
        actual: usize,
    },

    /// Payload length does not match what the function code requires.
    #[error("payload length mismatch for function 0x{function:02X}: expected {expected} bytes, got {actual}")]
    LengthMismatch {
        /// Function code of the frame.
        function: u8,
        /// Expected payload length.
        expected: usize,
        /// Actual payload length.
        actual: usize,
    },

    /// Payload does not fit in a single frame.
    #[error("payload too long: maximum {max} bytes, got {actual}")]
    PayloadTooLong {
        /// Maximum allowed length.
        max: usize,
        /// Actual length.
        actual: usize,
    },

    /// Function code is not a known request.
    #[error("unknown request code: 0x{0:02X}")]
    UnknownRequest(u8),

    /// Function code is not a known confirm.
    #[error("unknown confirm code: 0x{0:02X}")]
    UnknownConfirm(u8),

    /// Function code is not a known indication.
    #[error("unknown indication code: 0x{0:02X}")]
    UnknownIndication(u8),

    /// A field holds a value outside its defined range.
    #[error("invalid value 0x{value:02X} for {field}")]
    InvalidField {
        /// Name of the field.
        field: &'static str,
        /// The raw value.
        value: u8,
    },
}

impl ProtocolError {
    /// Create a length mismatch error.
    pub fn length_mismatch(function: u8, expected: usize, actual: usize) -> Self {
        ProtocolError::LengthMismatch {
            function,
            expected,
            actual,
        }
    }

    /// Create an invalid field error.
    pub fn invalid_field(field: &'static str, value: u8) -> Self {
        ProtocolError::InvalidField { field, value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProtocolError::length_mismatch(0x05, 1, 0);
        assert!(err.to_string().contains("0x05"));
        assert!(err.to_string().contains("expected 1"));

        let err = ProtocolError::invalid_field("priority", 7);
        assert_eq!(err.to_string(), "invalid value 0x07 for priority");
    }
}
