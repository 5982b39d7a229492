//! Secure DFU Control Point Protocol
//!
//! This crate provides the wire types for the control channel of the Secure
//! Device Firmware Update procedure. The host writes requests to the DFU
//! Control Point characteristic and the bootloader answers with notifications.
//!
//! # Protocol Overview
//!
//! - **Requests** (host → bootloader): start with an op code byte, followed by
//!   little-endian parameters.
//! - **Responses** (bootloader → host): start with the response marker `0x60`,
//!   the echoed op code and a [`ResultCode`].
//! - **Packet Receipt Notifications** (bootloader → host): sent every N data
//!   packets while firmware is streamed; same shape as a checksum response.
//!
//! # Example
//!
//! ```rust,ignore
//! use secure_dfu_protocol::{Request, Response};
//!
//! // Build a request
//! let frame = Request::CreateDataObject { size: 4096 }.encode();
//!
//! // Parse a notification
//! let response = Response::decode(&received_data)?;
//! ```

mod constants;
mod error;
mod requests;
mod responses;
mod status;
mod types;

pub use constants::*;
pub use error::*;
pub use requests::*;
pub use responses::*;
pub use status::*;
pub use types::{ImageType, OpCode, ProcedureType};
