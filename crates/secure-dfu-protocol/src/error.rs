//! Protocol error types.

use thiserror::Error;

use crate::status::{ExtendedErrorCode, ResultCode};

/// Errors that can occur when decoding control point frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame is too short to be valid.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Expected minimum length.
        expected: usize,
        /// Actual length received.
        actual: usize,
    },

    /// Byte is not a known op code.
    #[error("unknown op code: 0x{0:02X}")]
    UnknownOpCode(u8),

    /// Notification does not start with the response marker.
    #[error("not a response: first byte is 0x{0:02X}")]
    NotAResponse(u8),

    /// Byte is not a known result code.
    #[error("unknown result code: 0x{0:02X}")]
    UnknownResultCode(u8),

    /// Byte is not in the extended error table.
    #[error("unknown extended error code: 0x{0:02X}")]
    UnknownExtendedError(u8),

    /// Byte is not a known procedure type.
    #[error("unknown procedure type: 0x{0:02X}")]
    UnknownProcedureType(u8),

    /// Byte is not a known image type.
    #[error("unknown image type: 0x{0:02X}")]
    UnknownImageType(u8),

    /// Response header is not "calculate checksum / success".
    #[error("not a packet receipt notification: op 0x{request_op_code:02X}, status 0x{status:02X}")]
    NotAPacketReceipt {
        /// Requesting op code found in the frame.
        request_op_code: u8,
        /// Result code found in the frame.
        status: u8,
    },

    /// Frame is a response where a request was expected.
    #[error("unexpected response frame")]
    UnexpectedResponse,

    /// Trailing length field of a write frame disagrees with its payload.
    #[error("length mismatch: frame declares {declared} bytes, carries {actual}")]
    LengthMismatch {
        /// Length written in the frame.
        declared: usize,
        /// Payload length actually present.
        actual: usize,
    },

    /// Write payload is longer than its u16 length field can describe.
    #[error("payload too long: at most {max} bytes, got {actual}")]
    PayloadTooLong {
        /// Largest payload allowed.
        max: usize,
        /// Payload length given.
        actual: usize,
    },
}

/// Errors reported to the caller of a control point operation.
///
/// Transport failures, remote status codes and undecodable notifications all
/// end the in-flight operation with one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DfuError {
    /// The transport or characteristic is not available.
    #[error("invalid internal state: peripheral not available")]
    InvalidInternalState,

    /// Subscribing to control point notifications failed.
    #[error("Enabling notifications failed")]
    EnablingControlPointFailed,

    /// Writing a request to the control point failed.
    #[error("Writing to characteristic failed")]
    WritingCharacteristicFailed,

    /// The transport reported an error while delivering a notification.
    #[error("Receiving notification failed")]
    ReceivingNotificationFailed,

    /// The notification could not be decoded.
    #[error("Unsupported response received: 0x{}", hex::encode_upper(.0))]
    UnsupportedResponse(Vec<u8>),

    /// The bootloader answered with a failure result code.
    #[error("{0}")]
    Remote(ResultCode),

    /// The bootloader answered with an extended error.
    #[error("{0}")]
    RemoteExtended(ExtendedErrorCode),
}

impl DfuError {
    /// Whether the error came from the bootloader rather than the local link.
    pub fn is_remote(&self) -> bool {
        matches!(self, DfuError::Remote(_) | DfuError::RemoteExtended(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProtocolError::FrameTooShort {
            expected: 15,
            actual: 3,
        };
        assert!(err.to_string().contains("at least 15"));

        let err = DfuError::UnsupportedResponse(vec![0x60, 0xAB]);
        assert_eq!(err.to_string(), "Unsupported response received: 0x60AB");

        let err = DfuError::RemoteExtended(ExtendedErrorCode::SignatureMissing);
        assert_eq!(err.to_string(), "Signature missing");
        assert!(err.is_remote());
        assert!(!DfuError::WritingCharacteristicFailed.is_remote());
    }
}
