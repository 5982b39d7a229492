//! Notifications received from the DFU Control Point.
//!
//! Every notification starts with the response marker (0x60), followed by
//! the op code of the request being answered and a result code:
//!
//! ```text
//! +------+------------+--------+---------------------------+
//! | 0x60 | request op | result | payload (depends on both) |
//! +------+------------+--------+---------------------------+
//! ```
//!
//! | request op         | result         | payload                              |
//! |--------------------|----------------|--------------------------------------|
//! | select object      | success        | max size (4), offset (4), CRC (4)    |
//! | calculate checksum | success        | offset (4), CRC (4)                  |
//! | any                | extended error | extended error code (1)              |
//! | any                | anything else  | none                                 |
//!
//! A Packet Receipt Notification has exactly the same layout as a successful
//! calculate checksum response; only the state of the session tells them apart.

use crate::constants::*;
use crate::error::ProtocolError;
use crate::status::{ExtendedErrorCode, ResultCode};
use crate::types::*;

/// Fields carried after the response header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponsePayload {
    /// Nothing follows the header.
    Empty,

    /// Successful select object.
    SelectedObject {
        /// Maximum object size supported by the bootloader.
        max_size: u32,
        /// Bytes of the current object already received.
        offset: u32,
        /// CRC32 of the received bytes.
        crc: u32,
    },

    /// Successful calculate checksum.
    Checksum {
        /// Bytes received so far.
        offset: u32,
        /// CRC32 of the received bytes.
        crc: u32,
    },

    /// Extended error detail.
    ExtendedError(ExtendedErrorCode),
}

/// A decoded control point response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response {
    /// Always [`OpCode::Response`].
    pub op_code: OpCode,
    /// Op code of the request being answered.
    pub request_op_code: OpCode,
    /// Status of the request.
    pub status: ResultCode,
    /// Fields that depend on the request and status.
    pub payload: ResponsePayload,
}

impl Response {
    /// Decode a response from a notification.
    pub fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        require_len(frame, RESPONSE_HEADER_LEN)?;

        let op_code = OpCode::try_from(frame[0])?;
        if op_code != OpCode::Response {
            return Err(ProtocolError::NotAResponse(frame[0]));
        }
        let request_op_code = OpCode::try_from(frame[1])?;
        let status = ResultCode::try_from(frame[2])?;

        let payload = match (status, request_op_code) {
            (ResultCode::Success, OpCode::SelectObject) => {
                require_len(frame, SELECT_RESPONSE_LEN)?;
                ResponsePayload::SelectedObject {
                    max_size: read_u32_le(frame, 3),
                    offset: read_u32_le(frame, 7),
                    crc: read_u32_le(frame, 11),
                }
            }

            (ResultCode::Success, OpCode::CalculateChecksum) => {
                require_len(frame, CHECKSUM_RESPONSE_LEN)?;
                ResponsePayload::Checksum {
                    offset: read_u32_le(frame, 3),
                    crc: read_u32_le(frame, 7),
                }
            }

            (ResultCode::ExtendedError, _) => {
                require_len(frame, EXTENDED_ERROR_RESPONSE_LEN)?;
                ResponsePayload::ExtendedError(ExtendedErrorCode::try_from(frame[3])?)
            }

            _ => ResponsePayload::Empty,
        };

        Ok(Response {
            op_code,
            request_op_code,
            status,
            payload,
        })
    }

    /// Maximum object size, present for a successful select object.
    pub fn max_size(&self) -> Option<u32> {
        match self.payload {
            ResponsePayload::SelectedObject { max_size, .. } => Some(max_size),
            _ => None,
        }
    }

    /// Offset, present for a successful select object or calculate checksum.
    pub fn offset(&self) -> Option<u32> {
        match self.payload {
            ResponsePayload::SelectedObject { offset, .. } | ResponsePayload::Checksum { offset, .. } => {
                Some(offset)
            }
            _ => None,
        }
    }

    /// CRC, present for a successful select object or calculate checksum.
    pub fn crc(&self) -> Option<u32> {
        match self.payload {
            ResponsePayload::SelectedObject { crc, .. } | ResponsePayload::Checksum { crc, .. } => {
                Some(crc)
            }
            _ => None,
        }
    }

    /// Extended error, present when the status is [`ResultCode::ExtendedError`].
    pub fn extended_error(&self) -> Option<ExtendedErrorCode> {
        match self.payload {
            ResponsePayload::ExtendedError(error) => Some(error),
            _ => None,
        }
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op = self.request_op_code.code();
        let status = self.status.code();
        match self.payload {
            ResponsePayload::ExtendedError(error) => write!(
                f,
                "Response (Op Code = {}, Status = {}, Extended Error {} = {})",
                op,
                status,
                error.code(),
                error.description()
            ),
            ResponsePayload::SelectedObject {
                max_size,
                offset,
                crc,
            } => {
                // Only a guess for log output: command objects are small.
                let kind = if max_size > COMMAND_OBJECT_SIZE_HINT {
                    ProcedureType::Data
                } else {
                    ProcedureType::Command
                };
                write!(
                    f,
                    "{} object selected (Max size = {}, Offset = {}, CRC = {:08X})",
                    kind, max_size, offset, crc
                )
            }
            ResponsePayload::Checksum { offset, crc } => {
                write!(f, "Checksum (Offset = {}, CRC = {:08X})", offset, crc)
            }
            ResponsePayload::Empty => write!(f, "Response (Op Code = {}, Status = {})", op, status),
        }
    }
}

/// Packet Receipt Notification sent periodically while data is streamed.
///
/// The CRC is carried for completeness only. Checksums are verified with an
/// explicit [`Request::CalculateChecksum`](crate::Request::CalculateChecksum).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketReceiptNotification {
    /// Bytes of the current object received so far.
    pub offset: u32,
    /// CRC32 of the received bytes.
    pub crc: u32,
}

impl PacketReceiptNotification {
    /// Decode a PRN from a notification.
    pub fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        require_len(frame, CHECKSUM_RESPONSE_LEN)?;

        if frame[0] != OP_RESPONSE {
            return Err(ProtocolError::NotAResponse(frame[0]));
        }
        if frame[1] != OP_CALCULATE_CHECKSUM || frame[2] != RES_SUCCESS {
            return Err(ProtocolError::NotAPacketReceipt {
                request_op_code: frame[1],
                status: frame[2],
            });
        }

        Ok(PacketReceiptNotification {
            offset: read_u32_le(frame, 3),
            crc: read_u32_le(frame, 7),
        })
    }
}
