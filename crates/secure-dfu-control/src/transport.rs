//! The transport seam between the control point and a GATT stack.
//!
//! The session only asks the transport to subscribe and to write. Everything
//! the transport observes afterwards (acknowledgements, notifications, buffer
//! drained) is fed back through the inbound methods of
//! [`ControlPoint`](crate::ControlPoint).

use thiserror::Error;

/// Errors reported by a transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The peripheral or characteristic is gone (disconnected, invalidated).
    #[error("peripheral not available")]
    Unavailable,

    /// The remote answered with an ATT error.
    #[error("ATT error 0x{0:02X}")]
    Att(u8),

    /// Any other platform error.
    #[error("{0}")]
    Other(String),
}

/// Properties of the control point characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CharacteristicProperties {
    pub write: bool,
    pub write_without_response: bool,
    pub notify: bool,
    pub indicate: bool,
}

impl CharacteristicProperties {
    /// Properties required of a DFU Control Point.
    pub const CONTROL_POINT: CharacteristicProperties = CharacteristicProperties {
        write: true,
        write_without_response: false,
        notify: true,
        indicate: false,
    };

    /// Whether these properties include everything in `required`.
    pub fn contains(&self, required: CharacteristicProperties) -> bool {
        (!required.write || self.write)
            && (!required.write_without_response || self.write_without_response)
            && (!required.notify || self.notify)
            && (!required.indicate || self.indicate)
    }
}

/// Outbound primitives the control point needs from a GATT transport.
///
/// Both calls are non-blocking: `Ok` means the request was queued. The
/// outcome arrives later through
/// [`ControlPoint::notification_state_updated`](crate::ControlPoint::notification_state_updated)
/// and [`ControlPoint::write_completed`](crate::ControlPoint::write_completed).
/// Return [`TransportError::Unavailable`] when the peripheral is gone.
pub trait ControlPointTransport {
    /// Enable notifications on the control point characteristic.
    fn subscribe(&mut self) -> Result<(), TransportError>;

    /// Write a request frame with response.
    fn write_with_response(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Properties of the control point characteristic.
    fn properties(&self) -> CharacteristicProperties;
}

impl<T: ControlPointTransport + ?Sized> ControlPointTransport for &mut T {
    fn subscribe(&mut self) -> Result<(), TransportError> {
        (**self).subscribe()
    }

    fn write_with_response(&mut self, data: &[u8]) -> Result<(), TransportError> {
        (**self).write_with_response(data)
    }

    fn properties(&self) -> CharacteristicProperties {
        (**self).properties()
    }
}
