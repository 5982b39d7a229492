//! Secure DFU Control Point Session
//!
//! This crate drives the DFU Control Point characteristic on top of a GATT
//! transport supplied by the caller. It writes requests built with
//! [`secure_dfu_protocol`], waits for the notification answering each one,
//! and resolves the caller's continuations with either a success, a decoded
//! [`Response`], or a [`DfuError`].
//!
//! # Example
//!
//! ```rust,ignore
//! use secure_dfu_control::{ControlPoint, ControlPointConfig, Request};
//!
//! let mut control_point = ControlPoint::new(transport, ControlPointConfig::named("DfuTarg"));
//! control_point.enable_notifications(|| println!("ready"), |e| eprintln!("{e}"));
//!
//! // Later, from the GATT stack:
//! control_point.notification_state_updated(Ok(()));
//!
//! control_point.send(
//!     &Request::CreateDataObject { size: 4096 },
//!     || println!("created"),
//!     |e| eprintln!("{e}"),
//! );
//! control_point.write_completed(Ok(()));
//! control_point.notification_received(Ok(&[0x60, 0x01, 0x01]));
//! ```

mod config;
mod control_point;
mod transport;

pub use config::ControlPointConfig;
pub use control_point::{
    ControlPoint, ControlPointState, ErrorCallback, ProgressCallback, ResponseCallback,
    SuccessCallback, UploadProgress,
};
pub use transport::{CharacteristicProperties, ControlPointTransport, TransportError};

pub use secure_dfu_protocol;
pub use secure_dfu_protocol::{DfuError, Request, Response, ResponsePayload};
