//! Result codes and the extended error table.
//!
//! Every response carries a [`ResultCode`]. When that code is
//! [`ResultCode::ExtendedError`] the bootloader appends one more byte, an
//! [`ExtendedErrorCode`], with a more specific reason. Both tables are closed:
//! a byte outside them is a decode failure, never an "unknown" value.

use crate::constants::*;
use crate::error::{DfuError, ProtocolError};

/// Status returned by the bootloader in every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ResultCode {
    InvalidCode = RES_INVALID_CODE,
    Success = RES_SUCCESS,
    OpCodeNotSupported = RES_OP_CODE_NOT_SUPPORTED,
    InvalidParameter = RES_INVALID_PARAMETER,
    InsufficientResources = RES_INSUFFICIENT_RESOURCES,
    InvalidObject = RES_INVALID_OBJECT,
    SignatureMismatch = RES_SIGNATURE_MISMATCH,
    UnsupportedType = RES_UNSUPPORTED_TYPE,
    OperationNotPermitted = RES_OPERATION_NOT_PERMITTED,
    OperationFailed = RES_OPERATION_FAILED,
    /// Consult the extended error byte.
    ExtendedError = RES_EXTENDED_ERROR,
}

impl ResultCode {
    /// Every result code, in wire order.
    pub const ALL: [ResultCode; 11] = [
        ResultCode::InvalidCode,
        ResultCode::Success,
        ResultCode::OpCodeNotSupported,
        ResultCode::InvalidParameter,
        ResultCode::InsufficientResources,
        ResultCode::InvalidObject,
        ResultCode::SignatureMismatch,
        ResultCode::UnsupportedType,
        ResultCode::OperationNotPermitted,
        ResultCode::OperationFailed,
        ResultCode::ExtendedError,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn description(self) -> &'static str {
        match self {
            ResultCode::InvalidCode => "Invalid code",
            ResultCode::Success => "Success",
            ResultCode::OpCodeNotSupported => "Operation not supported",
            ResultCode::InvalidParameter => "Invalid parameter",
            ResultCode::InsufficientResources => "Insufficient resources",
            ResultCode::InvalidObject => "Invalid object",
            ResultCode::SignatureMismatch => "Signature mismatch",
            ResultCode::UnsupportedType => "Unsupported type",
            ResultCode::OperationNotPermitted => "Operation not permitted",
            ResultCode::OperationFailed => "Operation failed",
            ResultCode::ExtendedError => "Extended error",
        }
    }

    /// The error reported to callers when the bootloader answers with this code.
    ///
    /// For [`ResultCode::ExtendedError`] prefer [`ExtendedErrorCode::error`],
    /// which names the specific reason.
    pub fn error(self) -> DfuError {
        DfuError::Remote(self)
    }

    pub fn is_success(self) -> bool {
        self == ResultCode::Success
    }
}

impl std::fmt::Display for ResultCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

impl TryFrom<u8> for ResultCode {
    type Error = ProtocolError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            RES_INVALID_CODE => Ok(ResultCode::InvalidCode),
            RES_SUCCESS => Ok(ResultCode::Success),
            RES_OP_CODE_NOT_SUPPORTED => Ok(ResultCode::OpCodeNotSupported),
            RES_INVALID_PARAMETER => Ok(ResultCode::InvalidParameter),
            RES_INSUFFICIENT_RESOURCES => Ok(ResultCode::InsufficientResources),
            RES_INVALID_OBJECT => Ok(ResultCode::InvalidObject),
            RES_SIGNATURE_MISMATCH => Ok(ResultCode::SignatureMismatch),
            RES_UNSUPPORTED_TYPE => Ok(ResultCode::UnsupportedType),
            RES_OPERATION_NOT_PERMITTED => Ok(ResultCode::OperationNotPermitted),
            RES_OPERATION_FAILED => Ok(ResultCode::OperationFailed),
            RES_EXTENDED_ERROR => Ok(ResultCode::ExtendedError),
            _ => Err(ProtocolError::UnknownResultCode(code)),
        }
    }
}

/// Extended error reported alongside [`ResultCode::ExtendedError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ExtendedErrorCode {
    NoError = EXT_NO_ERROR,
    WrongCommandFormat = EXT_WRONG_COMMAND_FORMAT,
    UnknownCommand = EXT_UNKNOWN_COMMAND,
    InitCommandInvalid = EXT_INIT_COMMAND_INVALID,
    FwVersionFailure = EXT_FW_VERSION_FAILURE,
    HwVersionFailure = EXT_HW_VERSION_FAILURE,
    SdVersionFailure = EXT_SD_VERSION_FAILURE,
    SignatureMissing = EXT_SIGNATURE_MISSING,
    WrongHashType = EXT_WRONG_HASH_TYPE,
    HashFailed = EXT_HASH_FAILED,
    WrongSignatureType = EXT_WRONG_SIGNATURE_TYPE,
    VerificationFailed = EXT_VERIFICATION_FAILED,
    InsufficientSpace = EXT_INSUFFICIENT_SPACE,
}

impl ExtendedErrorCode {
    /// Every extended error code, in wire order.
    pub const ALL: [ExtendedErrorCode; 13] = [
        ExtendedErrorCode::NoError,
        ExtendedErrorCode::WrongCommandFormat,
        ExtendedErrorCode::UnknownCommand,
        ExtendedErrorCode::InitCommandInvalid,
        ExtendedErrorCode::FwVersionFailure,
        ExtendedErrorCode::HwVersionFailure,
        ExtendedErrorCode::SdVersionFailure,
        ExtendedErrorCode::SignatureMissing,
        ExtendedErrorCode::WrongHashType,
        ExtendedErrorCode::HashFailed,
        ExtendedErrorCode::WrongSignatureType,
        ExtendedErrorCode::VerificationFailed,
        ExtendedErrorCode::InsufficientSpace,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn description(self) -> &'static str {
        match self {
            ExtendedErrorCode::NoError => "No error",
            ExtendedErrorCode::WrongCommandFormat => "Wrong command format",
            ExtendedErrorCode::UnknownCommand => "Unknown command",
            ExtendedErrorCode::InitCommandInvalid => "Init command was invalid",
            ExtendedErrorCode::FwVersionFailure => "FW version check failed",
            ExtendedErrorCode::HwVersionFailure => "HW version check failed",
            ExtendedErrorCode::SdVersionFailure => "SD version check failed",
            ExtendedErrorCode::SignatureMissing => "Signature missing",
            ExtendedErrorCode::WrongHashType => "Invalid hash type",
            ExtendedErrorCode::HashFailed => "Hashing failed",
            ExtendedErrorCode::WrongSignatureType => "Invalid signature type",
            ExtendedErrorCode::VerificationFailed => "Verification failed",
            ExtendedErrorCode::InsufficientSpace => "Insufficient space for upgrade",
        }
    }

    /// The error reported to callers for this extended error.
    pub fn error(self) -> DfuError {
        DfuError::RemoteExtended(self)
    }
}

impl std::fmt::Display for ExtendedErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

impl TryFrom<u8> for ExtendedErrorCode {
    type Error = ProtocolError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            EXT_NO_ERROR => Ok(ExtendedErrorCode::NoError),
            EXT_WRONG_COMMAND_FORMAT => Ok(ExtendedErrorCode::WrongCommandFormat),
            EXT_UNKNOWN_COMMAND => Ok(ExtendedErrorCode::UnknownCommand),
            EXT_INIT_COMMAND_INVALID => Ok(ExtendedErrorCode::InitCommandInvalid),
            EXT_FW_VERSION_FAILURE => Ok(ExtendedErrorCode::FwVersionFailure),
            EXT_HW_VERSION_FAILURE => Ok(ExtendedErrorCode::HwVersionFailure),
            EXT_SD_VERSION_FAILURE => Ok(ExtendedErrorCode::SdVersionFailure),
            EXT_SIGNATURE_MISSING => Ok(ExtendedErrorCode::SignatureMissing),
            EXT_WRONG_HASH_TYPE => Ok(ExtendedErrorCode::WrongHashType),
            EXT_HASH_FAILED => Ok(ExtendedErrorCode::HashFailed),
            EXT_WRONG_SIGNATURE_TYPE => Ok(ExtendedErrorCode::WrongSignatureType),
            EXT_VERIFICATION_FAILED => Ok(ExtendedErrorCode::VerificationFailed),
            EXT_INSUFFICIENT_SPACE => Ok(ExtendedErrorCode::InsufficientSpace),
            _ => Err(ProtocolError::UnknownExtendedError(code)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_code_table_is_closed() {
        for code in 0u8..=0xFF {
            match ResultCode::try_from(code) {
                Ok(result) => assert_eq!(result.code(), code),
                Err(e) => assert_eq!(e, ProtocolError::UnknownResultCode(code)),
            }
        }
        assert!(ResultCode::try_from(0x09).is_err());
        assert_eq!(ResultCode::ALL.len(), 11);
    }

    #[test]
    fn test_extended_error_table_is_closed() {
        let mapped: Vec<u8> = (0u8..=0xFF)
            .filter(|code| ExtendedErrorCode::try_from(*code).is_ok())
            .collect();
        let expected: Vec<u8> = ExtendedErrorCode::ALL.iter().map(|e| e.code()).collect();
        assert_eq!(mapped, expected);
        assert!(ExtendedErrorCode::try_from(0x01).is_err());
        assert!(ExtendedErrorCode::try_from(0xFF).is_err());
    }

    #[test]
    fn test_extended_error_descriptions() {
        assert_eq!(
            ExtendedErrorCode::InsufficientSpace.description(),
            "Insufficient space for upgrade"
        );
        assert_eq!(ExtendedErrorCode::InitCommandInvalid.to_string(), "Init command was invalid");
        assert_eq!(ExtendedErrorCode::WrongHashType.description(), "Invalid hash type");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            ExtendedErrorCode::VerificationFailed.error(),
            DfuError::RemoteExtended(ExtendedErrorCode::VerificationFailed)
        );
        assert_eq!(
            ResultCode::InvalidObject.error(),
            DfuError::Remote(ResultCode::InvalidObject)
        );
        assert_eq!(ResultCode::InvalidObject.error().to_string(), "Invalid object");
    }
}
