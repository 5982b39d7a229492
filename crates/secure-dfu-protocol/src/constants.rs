//! Protocol constants
//!
//! These constants define the op codes, procedure and image types, result
//! codes and extended error codes used on the Secure DFU Control Point.

// ============================================================================
// GATT Identifiers
// ============================================================================

/// Secure DFU service (16-bit UUID 0xFE59).
pub const DFU_SERVICE_UUID: &str = "0000FE59-0000-1000-8000-00805F9B34FB";
/// DFU Control Point characteristic (write + notify).
pub const CONTROL_POINT_UUID: &str = "8EC90001-F315-4F60-9FB8-838830DAEA50";
/// DFU Packet characteristic (write without response).
pub const PACKET_UUID: &str = "8EC90002-F315-4F60-9FB8-838830DAEA50";

// ============================================================================
// Op Codes
// ============================================================================

/// Get protocol version (not used by the upload flow).
pub const OP_GET_PROTOCOL_VERSION: u8 = 0x00;
/// Create a command or data object.
pub const OP_CREATE_OBJECT: u8 = 0x01;
/// Set the Packet Receipt Notification interval.
pub const OP_SET_PRN_VALUE: u8 = 0x02;
/// Calculate the checksum of the current object.
pub const OP_CALCULATE_CHECKSUM: u8 = 0x03;
/// Execute the current object.
pub const OP_EXECUTE: u8 = 0x04;
// NOTE: 0x05 is not assigned
/// Select a command or data object.
pub const OP_SELECT_OBJECT: u8 = 0x06;
/// Get MTU (not used by the upload flow).
pub const OP_GET_MTU: u8 = 0x07;
/// Write object data over the control point (not used by the upload flow).
pub const OP_WRITE: u8 = 0x08;
/// Ping.
pub const OP_PING: u8 = 0x09;
/// Get hardware version (not used by the upload flow).
pub const OP_GET_HW_VERSION: u8 = 0x0A;
/// Get firmware version of an image.
pub const OP_GET_FW_VERSION: u8 = 0x0B;
/// Abort the procedure.
pub const OP_ABORT: u8 = 0x0C;
/// Marker byte that starts every notification sent by the bootloader.
pub const OP_RESPONSE: u8 = 0x60;

// ============================================================================
// Procedure and Image Types
// ============================================================================

/// Object type: init packet (command object).
pub const PROCEDURE_COMMAND: u8 = 0x01;
/// Object type: firmware data.
pub const PROCEDURE_DATA: u8 = 0x02;

/// Image type: SoftDevice.
pub const IMAGE_SOFTDEVICE: u8 = 0x00;
/// Image type: application.
pub const IMAGE_APPLICATION: u8 = 0x01;
/// Image type: bootloader.
pub const IMAGE_BOOTLOADER: u8 = 0x02;

// ============================================================================
// Result Codes
// ============================================================================

pub const RES_INVALID_CODE: u8 = 0x00;
pub const RES_SUCCESS: u8 = 0x01;
pub const RES_OP_CODE_NOT_SUPPORTED: u8 = 0x02;
pub const RES_INVALID_PARAMETER: u8 = 0x03;
pub const RES_INSUFFICIENT_RESOURCES: u8 = 0x04;
pub const RES_INVALID_OBJECT: u8 = 0x05;
pub const RES_SIGNATURE_MISMATCH: u8 = 0x06;
pub const RES_UNSUPPORTED_TYPE: u8 = 0x07;
pub const RES_OPERATION_NOT_PERMITTED: u8 = 0x08;
// NOTE: 0x09 is not assigned
pub const RES_OPERATION_FAILED: u8 = 0x0A;
/// The fourth byte of the response carries an extended error code.
pub const RES_EXTENDED_ERROR: u8 = 0x0B;

// ============================================================================
// Extended Error Codes
// ============================================================================

pub const EXT_NO_ERROR: u8 = 0x00;
// NOTE: 0x01 is not assigned
pub const EXT_WRONG_COMMAND_FORMAT: u8 = 0x02;
pub const EXT_UNKNOWN_COMMAND: u8 = 0x03;
pub const EXT_INIT_COMMAND_INVALID: u8 = 0x04;
pub const EXT_FW_VERSION_FAILURE: u8 = 0x05;
pub const EXT_HW_VERSION_FAILURE: u8 = 0x06;
pub const EXT_SD_VERSION_FAILURE: u8 = 0x07;
pub const EXT_SIGNATURE_MISSING: u8 = 0x08;
pub const EXT_WRONG_HASH_TYPE: u8 = 0x09;
pub const EXT_HASH_FAILED: u8 = 0x0A;
pub const EXT_WRONG_SIGNATURE_TYPE: u8 = 0x0B;
pub const EXT_VERIFICATION_FAILED: u8 = 0x0C;
pub const EXT_INSUFFICIENT_SPACE: u8 = 0x0D;

// ============================================================================
// Frame Sizes
// ============================================================================

/// Response marker + request op code + result code.
pub const RESPONSE_HEADER_LEN: usize = 3;
/// Header + extended error code.
pub const EXTENDED_ERROR_RESPONSE_LEN: usize = 4;
/// Header + offset (4) + CRC (4).
pub const CHECKSUM_RESPONSE_LEN: usize = 11;
/// Header + max size (4) + offset (4) + CRC (4).
pub const SELECT_RESPONSE_LEN: usize = 15;

/// Largest max object size still reported as a command object in log output.
pub const COMMAND_OBJECT_SIZE_HINT: u32 = 1024;
