//! Requests written to the DFU Control Point.

use bytes::BufMut;

use crate::constants::*;
use crate::error::ProtocolError;
use crate::types::*;

/// Requests that can be sent to the bootloader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Get the protocol version. Not used by the upload flow.
    GetProtocolVersion,

    /// Create an init packet object.
    CreateCommandObject {
        /// Object size in bytes.
        size: u32,
    },

    /// Create a firmware data object.
    CreateDataObject {
        /// Object size in bytes.
        size: u32,
    },

    /// Select the init packet object.
    SelectCommandObject,

    /// Select the data object.
    SelectDataObject,

    /// Set the Packet Receipt Notification interval (0 disables PRNs).
    SetPacketReceiptNotification {
        /// Number of packets between notifications.
        value: u16,
    },

    /// Ask for the offset and CRC of the current object.
    CalculateChecksum,

    /// Execute the current object.
    Execute,

    /// Get MTU. Not used by the upload flow.
    GetMtu,

    /// Write object data over the control point. Not used by the upload flow.
    Write {
        /// Payload.
        bytes: WritePayload,
    },

    /// Ping the bootloader.
    Ping {
        /// Echoed identifier.
        id: u8,
    },

    /// Get hardware version. Not used by the upload flow.
    GetHwVersion,

    /// Get the firmware version of an image.
    GetFwVersion {
        /// Image to query.
        image: ImageType,
    },

    /// Abort the procedure.
    Abort,
}

impl Request {
    /// The op code this request is sent with.
    pub fn op_code(&self) -> OpCode {
        match self {
            Request::GetProtocolVersion => OpCode::GetProtocolVersion,
            Request::CreateCommandObject { .. } | Request::CreateDataObject { .. } => {
                OpCode::CreateObject
            }
            Request::SelectCommandObject | Request::SelectDataObject => OpCode::SelectObject,
            Request::SetPacketReceiptNotification { .. } => OpCode::SetPrnValue,
            Request::CalculateChecksum => OpCode::CalculateChecksum,
            Request::Execute => OpCode::Execute,
            Request::GetMtu => OpCode::GetMtu,
            Request::Write { .. } => OpCode::Write,
            Request::Ping { .. } => OpCode::Ping,
            Request::GetHwVersion => OpCode::GetHwVersion,
            Request::GetFwVersion { .. } => OpCode::GetFwVersion,
            Request::Abort => OpCode::Abort,
        }
    }

    /// Object targeted by create/select requests.
    pub fn procedure_type(&self) -> Option<ProcedureType> {
        match self {
            Request::CreateCommandObject { .. } | Request::SelectCommandObject => {
                Some(ProcedureType::Command)
            }
            Request::CreateDataObject { .. } | Request::SelectDataObject => {
                Some(ProcedureType::Data)
            }
            _ => None,
        }
    }

    /// Encode the request to bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(8);
        buf.push(self.op_code().code());

        match self {
            Request::CreateCommandObject { size } => {
                buf.push(PROCEDURE_COMMAND);
                buf.put_u32_le(*size);
            }

            Request::CreateDataObject { size } => {
                buf.push(PROCEDURE_DATA);
                buf.put_u32_le(*size);
            }

            Request::SelectCommandObject => {
                buf.push(PROCEDURE_COMMAND);
            }

            Request::SelectDataObject => {
                buf.push(PROCEDURE_DATA);
            }

            Request::SetPacketReceiptNotification { value } => {
                buf.put_u16_le(*value);
            }

            Request::Write { bytes } => {
                buf.extend_from_slice(bytes.as_bytes());
                buf.put_u16_le(bytes.len());
            }

            Request::Ping { id } => {
                buf.push(*id);
            }

            Request::GetFwVersion { image } => {
                buf.push(image.code());
            }

            Request::GetProtocolVersion
            | Request::CalculateChecksum
            | Request::Execute
            | Request::GetMtu
            | Request::GetHwVersion
            | Request::Abort => {}
        }

        buf
    }

    /// Decode a request from a frame, as the bootloader would read it.
    pub fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        let Some(&code) = frame.first() else {
            return Err(ProtocolError::FrameTooShort {
                expected: 1,
                actual: 0,
            });
        };

        match OpCode::try_from(code)? {
            OpCode::GetProtocolVersion => Ok(Request::GetProtocolVersion),

            OpCode::CreateObject => {
                require_len(frame, 6)?;
                let size = read_u32_le(frame, 2);
                match ProcedureType::try_from(frame[1])? {
                    ProcedureType::Command => Ok(Request::CreateCommandObject { size }),
                    ProcedureType::Data => Ok(Request::CreateDataObject { size }),
                }
            }

            OpCode::SetPrnValue => {
                require_len(frame, 3)?;
                let value = u16::from_le_bytes([frame[1], frame[2]]);
                Ok(Request::SetPacketReceiptNotification { value })
            }

            OpCode::CalculateChecksum => Ok(Request::CalculateChecksum),
            OpCode::Execute => Ok(Request::Execute),

            OpCode::SelectObject => {
                require_len(frame, 2)?;
                match ProcedureType::try_from(frame[1])? {
                    ProcedureType::Command => Ok(Request::SelectCommandObject),
                    ProcedureType::Data => Ok(Request::SelectDataObject),
                }
            }

            OpCode::GetMtu => Ok(Request::GetMtu),

            OpCode::Write => {
                // op code + payload + u16 length
                require_len(frame, 3)?;
                let end = frame.len() - 2;
                let declared = u16::from_le_bytes([frame[end], frame[end + 1]]) as usize;
                let actual = end - 1;
                if declared != actual {
                    return Err(ProtocolError::LengthMismatch { declared, actual });
                }
                // declared fits in u16, so the payload does too
                Ok(Request::Write {
                    bytes: WritePayload(frame[1..end].to_vec()),
                })
            }

            OpCode::Ping => {
                require_len(frame, 2)?;
                Ok(Request::Ping { id: frame[1] })
            }

            OpCode::GetHwVersion => Ok(Request::GetHwVersion),

            OpCode::GetFwVersion => {
                require_len(frame, 2)?;
                let image = ImageType::try_from(frame[1])?;
                Ok(Request::GetFwVersion { image })
            }

            OpCode::Abort => Ok(Request::Abort),

            OpCode::Response => Err(ProtocolError::UnexpectedResponse),
        }
    }
}

/// Payload of a [`Request::Write`].
///
/// The frame carries the payload length as a u16, so longer payloads cannot
/// be built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WritePayload(Vec<u8>);

impl WritePayload {
    /// Largest payload a write frame can describe.
    pub const MAX_LEN: usize = u16::MAX as usize;

    /// Wrap `bytes`, rejecting payloads longer than [`Self::MAX_LEN`].
    pub fn new(bytes: Vec<u8>) -> Result<Self, ProtocolError> {
        if bytes.len() > Self::MAX_LEN {
            return Err(ProtocolError::PayloadTooLong {
                max: Self::MAX_LEN,
                actual: bytes.len(),
            });
        }
        Ok(WritePayload(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Payload length as written in the frame.
    pub fn len(&self) -> u16 {
        // MAX_LEN is checked on construction
        self.0.len() as u16
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl TryFrom<Vec<u8>> for WritePayload {
    type Error = ProtocolError;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        WritePayload::new(bytes)
    }
}

impl std::fmt::Display for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Request::GetProtocolVersion => write!(f, "Get Protocol Version (Op Code = 0)"),
            Request::CreateCommandObject { size } => {
                write!(f, "Create Command Object (Op Code = 1, Type = 1, Size: {}b)", size)
            }
            Request::CreateDataObject { size } => {
                write!(f, "Create Data Object (Op Code = 1, Type = 2, Size: {}b)", size)
            }
            Request::SetPacketReceiptNotification { value } => {
                write!(f, "Packet Receipt Notif Req (Op Code = 2, Value = {})", value)
            }
            Request::CalculateChecksum => write!(f, "Calculate Checksum (Op Code = 3)"),
            Request::Execute => write!(f, "Execute Object (Op Code = 4)"),
            Request::SelectCommandObject => write!(f, "Select Command Object (Op Code = 6, Type = 1)"),
            Request::SelectDataObject => write!(f, "Select Data Object (Op Code = 6, Type = 2)"),
            Request::GetMtu => write!(f, "Get MTU (Op Code = 7)"),
            Request::Write { bytes } => write!(
                f,
                "Write (Op Code = 8, Data = 0x{}, Length = {})",
                hex::encode_upper(bytes.as_bytes()),
                bytes.len()
            ),
            Request::Ping { id } => write!(f, "Ping (Op Code = 9, ID = {})", id),
            Request::GetHwVersion => write!(f, "Get HW Version (Op Code = 10)"),
            Request::GetFwVersion { image } => {
                write!(f, "Get FW Version (Op Code = 11, Type = {})", image.code())
            }
            Request::Abort => write!(f, "Abort (Op Code = 12)"),
        }
    }
}
