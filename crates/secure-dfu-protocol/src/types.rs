//! Common types used in the protocol.

use crate::constants::*;
use crate::error::ProtocolError;

/// Operation codes understood by the Secure DFU bootloader.
///
/// Only a subset is ever issued during an upload; all of them are recognized
/// when they appear as the requesting op code of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    GetProtocolVersion = OP_GET_PROTOCOL_VERSION,
    CreateObject = OP_CREATE_OBJECT,
    SetPrnValue = OP_SET_PRN_VALUE,
    CalculateChecksum = OP_CALCULATE_CHECKSUM,
    Execute = OP_EXECUTE,
    SelectObject = OP_SELECT_OBJECT,
    GetMtu = OP_GET_MTU,
    Write = OP_WRITE,
    Ping = OP_PING,
    GetHwVersion = OP_GET_HW_VERSION,
    GetFwVersion = OP_GET_FW_VERSION,
    Abort = OP_ABORT,
    Response = OP_RESPONSE,
}

impl OpCode {
    /// The raw byte on the wire.
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for OpCode {
    type Error = ProtocolError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            OP_GET_PROTOCOL_VERSION => Ok(OpCode::GetProtocolVersion),
            OP_CREATE_OBJECT => Ok(OpCode::CreateObject),
            OP_SET_PRN_VALUE => Ok(OpCode::SetPrnValue),
            OP_CALCULATE_CHECKSUM => Ok(OpCode::CalculateChecksum),
            OP_EXECUTE => Ok(OpCode::Execute),
            OP_SELECT_OBJECT => Ok(OpCode::SelectObject),
            OP_GET_MTU => Ok(OpCode::GetMtu),
            OP_WRITE => Ok(OpCode::Write),
            OP_PING => Ok(OpCode::Ping),
            OP_GET_HW_VERSION => Ok(OpCode::GetHwVersion),
            OP_GET_FW_VERSION => Ok(OpCode::GetFwVersion),
            OP_ABORT => Ok(OpCode::Abort),
            OP_RESPONSE => Ok(OpCode::Response),
            _ => Err(ProtocolError::UnknownOpCode(code)),
        }
    }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> Self {
        op.code()
    }
}

/// Which object a create/select operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ProcedureType {
    /// The init packet.
    Command = PROCEDURE_COMMAND,
    /// Firmware image data.
    Data = PROCEDURE_DATA,
}

impl ProcedureType {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for ProcedureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcedureType::Command => write!(f, "Command"),
            ProcedureType::Data => write!(f, "Data"),
        }
    }
}

impl TryFrom<u8> for ProcedureType {
    type Error = ProtocolError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            PROCEDURE_COMMAND => Ok(ProcedureType::Command),
            PROCEDURE_DATA => Ok(ProcedureType::Data),
            _ => Err(ProtocolError::UnknownProcedureType(code)),
        }
    }
}

/// Image targeted by a firmware version query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ImageType {
    SoftDevice = IMAGE_SOFTDEVICE,
    Application = IMAGE_APPLICATION,
    Bootloader = IMAGE_BOOTLOADER,
}

impl ImageType {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for ImageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageType::SoftDevice => write!(f, "Soft Device"),
            ImageType::Application => write!(f, "Application"),
            ImageType::Bootloader => write!(f, "Bootloader"),
        }
    }
}

impl TryFrom<u8> for ImageType {
    type Error = ProtocolError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            IMAGE_SOFTDEVICE => Ok(ImageType::SoftDevice),
            IMAGE_APPLICATION => Ok(ImageType::Application),
            IMAGE_BOOTLOADER => Ok(ImageType::Bootloader),
            _ => Err(ProtocolError::UnknownImageType(code)),
        }
    }
}

/// Read a little-endian `u32` at `offset`.
///
/// Callers check the frame length first; the slice index is in range.
pub(crate) fn read_u32_le(data: &[u8], offset: usize) -> u32 {
    use bytes::Buf;
    let mut buf = &data[offset..offset + 4];
    buf.get_u32_le()
}

/// Fail with [`ProtocolError::FrameTooShort`] unless `frame` has at least `expected` bytes.
pub(crate) fn require_len(frame: &[u8], expected: usize) -> Result<(), ProtocolError> {
    if frame.len() < expected {
        return Err(ProtocolError::FrameTooShort {
            expected,
            actual: frame.len(),
        });
    }
    Ok(())
}
