//! DFU Control Point session.
//!
//! The control point correlates one outstanding request with the
//! notification that resolves it. It holds a single continuation slot:
//!
//! 1. A public operation (`enable_notifications`, `send`,
//!    `send_with_response`, `wait_until_upload_complete`) registers its
//!    continuations, replacing whatever was registered before, and asks the
//!    transport to subscribe or write.
//! 2. The transport reports what happened through the inbound methods
//!    (`notification_state_updated`, `write_completed`,
//!    `notification_received`, `ready_for_more_data`).
//! 3. Exactly one terminal continuation fires and the slot is cleared.
//!
//! While waiting for an upload to complete, notifications are first tried as
//! Packet Receipt Notifications. Those report progress and keep the slot
//! registered; anything else is handled as a response and ends the wait.
//!
//! Callers must not start an operation before the previous one resolved:
//! there is no queue, the last registration wins.

use secure_dfu_protocol::{
    DfuError, ExtendedErrorCode, OpCode, PacketReceiptNotification, Request, Response, ResultCode,
};
use tracing::{debug, error, info, trace, warn};

use crate::config::ControlPointConfig;
use crate::transport::{CharacteristicProperties, ControlPointTransport, TransportError};

// ============================================================================
// Continuations
// ============================================================================

/// Called when an operation completed with status success.
pub type SuccessCallback = Box<dyn FnOnce()>;
/// Called with the decoded response of a select object / calculate checksum.
pub type ResponseCallback = Box<dyn FnOnce(Response)>;
/// Called every time the upload may proceed.
pub type ProgressCallback = Box<dyn FnMut(UploadProgress)>;
/// Called once when an operation failed.
pub type ErrorCallback = Box<dyn FnOnce(DfuError)>;

/// Progress signal delivered while firmware data is streamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadProgress {
    /// A Packet Receipt Notification reported this many bytes of the
    /// current object received.
    Offset(u32),
    /// The transport drained its send buffer. No offset is known.
    ReadyForMoreData,
}

impl UploadProgress {
    /// The reported offset, if the signal carried one.
    pub fn offset(self) -> Option<u32> {
        match self {
            UploadProgress::Offset(offset) => Some(offset),
            UploadProgress::ReadyForMoreData => None,
        }
    }
}

// ============================================================================
// Protocol State
// ============================================================================

/// State of the control point session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPointState {
    /// No operation registered.
    Idle,
    /// Waiting for notifications to be enabled.
    AwaitingSubscriptionAck,
    /// A request was written; waiting for the write and its response.
    AwaitingWriteAck,
    /// Waiting for Packet Receipt Notifications or the end of the upload.
    AwaitingUploadFlowControl,
}

/// How a successful response resolves a written request.
enum Completion {
    Success(SuccessCallback),
    Response(ResponseCallback),
}

/// The single registered operation.
enum Pending {
    Idle,
    Subscription {
        on_success: SuccessCallback,
        on_error: ErrorCallback,
    },
    Command {
        request: OpCode,
        completion: Completion,
        on_error: ErrorCallback,
    },
    Upload {
        on_success: SuccessCallback,
        on_progress: Option<ProgressCallback>,
        on_error: ErrorCallback,
    },
}

impl Pending {
    fn into_error_callback(self) -> Option<ErrorCallback> {
        match self {
            Pending::Idle => None,
            Pending::Subscription { on_error, .. }
            | Pending::Command { on_error, .. }
            | Pending::Upload { on_error, .. } => Some(on_error),
        }
    }
}

// ============================================================================
// Control Point
// ============================================================================

/// Session on the DFU Control Point characteristic.
///
/// Single-threaded: the transport must deliver its events one at a time and
/// must not call back into the session from inside a continuation.
pub struct ControlPoint<T: ControlPointTransport> {
    transport: T,
    config: ControlPointConfig,
    pending: Pending,
}

impl<T: ControlPointTransport> ControlPoint<T> {
    /// Create a session once the control point characteristic was found.
    pub fn new(transport: T, config: ControlPointConfig) -> Self {
        ControlPoint {
            transport,
            config,
            pending: Pending::Idle,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ControlPointConfig {
        &self.config
    }

    /// Get the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get the transport mutably.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Get the current protocol state.
    pub fn state(&self) -> ControlPointState {
        match self.pending {
            Pending::Idle => ControlPointState::Idle,
            Pending::Subscription { .. } => ControlPointState::AwaitingSubscriptionAck,
            Pending::Command { .. } => ControlPointState::AwaitingWriteAck,
            Pending::Upload { .. } => ControlPointState::AwaitingUploadFlowControl,
        }
    }

    /// Whether the characteristic supports both write and notify.
    pub fn is_valid(&self) -> bool {
        self.transport
            .properties()
            .contains(CharacteristicProperties::CONTROL_POINT)
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Enable notifications on the control point.
    pub fn enable_notifications(
        &mut self,
        on_success: impl FnOnce() + 'static,
        on_error: impl FnOnce(DfuError) + 'static,
    ) {
        self.pending = Pending::Subscription {
            on_success: Box::new(on_success),
            on_error: Box::new(on_error),
        };

        trace!(
            "ControlPoint[{}]: Enabling notifications for {}...",
            self.config.name,
            self.config.characteristic
        );

        if let Err(e) = self.transport.subscribe() {
            error!(
                "ControlPoint[{}]: Enabling notifications failed: {}",
                self.config.name, e
            );
            self.fail(refusal(e, DfuError::EnablingControlPointFailed));
        }
    }

    /// Send a request; `on_success` is called when the bootloader reports success.
    pub fn send(
        &mut self,
        request: &Request,
        on_success: impl FnOnce() + 'static,
        on_error: impl FnOnce(DfuError) + 'static,
    ) {
        self.write(
            request,
            Completion::Success(Box::new(on_success)),
            Box::new(on_error),
        );
    }

    /// Send a request; `on_response` receives the decoded response on success.
    ///
    /// Used for select object and calculate checksum, whose responses carry
    /// the offset and CRC needed to resume or verify an upload.
    pub fn send_with_response(
        &mut self,
        request: &Request,
        on_response: impl FnOnce(Response) + 'static,
        on_error: impl FnOnce(DfuError) + 'static,
    ) {
        self.write(
            request,
            Completion::Response(Box::new(on_response)),
            Box::new(on_error),
        );
    }

    /// Wait for the data object currently being streamed over the DFU Packet
    /// characteristic.
    ///
    /// Nothing is written here. `on_progress` is called for every Packet
    /// Receipt Notification and every time the transport is ready for more
    /// data; `on_success` or `on_error` end the wait.
    pub fn wait_until_upload_complete(
        &mut self,
        on_success: impl FnOnce() + 'static,
        on_progress: impl FnMut(UploadProgress) + 'static,
        on_error: impl FnOnce(DfuError) + 'static,
    ) {
        self.pending = Pending::Upload {
            on_success: Box::new(on_success),
            on_progress: Some(Box::new(on_progress)),
            on_error: Box::new(on_error),
        };

        info!("ControlPoint[{}]: Uploading firmware...", self.config.name);
        trace!(
            "ControlPoint[{}]: Sending firmware to DFU Packet characteristic...",
            self.config.name
        );
    }

    // ========================================================================
    // Transport Events
    // ========================================================================

    /// The transport finished enabling (or failed to enable) notifications.
    pub fn notification_state_updated(&mut self, result: Result<(), TransportError>) {
        match std::mem::replace(&mut self.pending, Pending::Idle) {
            Pending::Subscription {
                on_success,
                on_error,
            } => match result {
                Ok(()) => {
                    trace!(
                        "ControlPoint[{}]: Notifications enabled for {}",
                        self.config.name,
                        self.config.characteristic
                    );
                    info!(
                        "ControlPoint[{}]: Secure DFU Control Point notifications enabled",
                        self.config.name
                    );
                    on_success();
                }
                Err(e) => {
                    // ATT 253 here usually means stale GATT cache: the device
                    // lacks Service Changed in app or bootloader mode.
                    error!(
                        "ControlPoint[{}]: Enabling notifications failed. Check if Service Changed service is enabled: {}",
                        self.config.name, e
                    );
                    on_error(DfuError::EnablingControlPointFailed);
                }
            },
            other => {
                self.pending = other;
                trace!(
                    "ControlPoint[{}]: Unexpected notification state update in state {:?}",
                    self.config.name,
                    self.state()
                );
            }
        }
    }

    /// The transport finished writing a request to the control point.
    pub fn write_completed(&mut self, result: Result<(), TransportError>) {
        if !matches!(self.pending, Pending::Command { .. }) {
            trace!(
                "ControlPoint[{}]: Unexpected write completion in state {:?}",
                self.config.name,
                self.state()
            );
            return;
        }

        match result {
            Ok(()) => {
                trace!(
                    "ControlPoint[{}]: Data written to {}",
                    self.config.name,
                    self.config.characteristic
                );
            }
            Err(e) => {
                // ATT 3 (write not permitted) is usually the same GATT cache issue.
                error!(
                    "ControlPoint[{}]: Writing to characteristic failed. Check if Service Changed service is enabled: {}",
                    self.config.name, e
                );
                self.fail(DfuError::WritingCharacteristicFailed);
            }
        }
    }

    /// The transport delivered a notification (or failed to).
    pub fn notification_received(&mut self, result: Result<&[u8], TransportError>) {
        let data = match result {
            Ok(data) => data,
            Err(e) => {
                error!(
                    "ControlPoint[{}]: Receiving notification failed: {}",
                    self.config.name, e
                );
                self.fail(DfuError::ReceivingNotificationFailed);
                return;
            }
        };

        match std::mem::replace(&mut self.pending, Pending::Idle) {
            Pending::Upload {
                on_success,
                mut on_progress,
                on_error,
            } => {
                if let Some(progress) = on_progress.as_mut() {
                    if let Ok(prn) = PacketReceiptNotification::decode(data) {
                        if self.config.log_progress {
                            trace!(
                                "ControlPoint[{}]: Packet Receipt Notification (Offset = {})",
                                self.config.name,
                                prn.offset
                            );
                        }
                        // Only the offset is reported; the CRC is checked with
                        // an explicit Calculate Checksum.
                        progress(UploadProgress::Offset(prn.offset));
                        self.pending = Pending::Upload {
                            on_success,
                            on_progress,
                            on_error,
                        };
                        return;
                    }
                }
                self.log_notification(data);
                self.dispatch(data, Completion::Success(on_success), on_error);
            }
            Pending::Command {
                request,
                completion,
                on_error,
            } => {
                self.log_notification(data);
                if let Ok(response) = Response::decode(data) {
                    if response.request_op_code != request {
                        debug!(
                            "ControlPoint[{}]: Response to op code {} while waiting for op code {}",
                            self.config.name,
                            response.request_op_code.code(),
                            request.code()
                        );
                    }
                }
                self.dispatch(data, completion, on_error);
            }
            other => {
                self.pending = other;
                debug!(
                    "ControlPoint[{}]: Ignoring notification 0x{} in state {:?}",
                    self.config.name,
                    hex::encode_upper(data),
                    self.state()
                );
            }
        }
    }

    /// The transport can accept more data on the DFU Packet characteristic.
    ///
    /// Replaces Packet Receipt Notifications as flow control on stacks that
    /// report when their write-without-response buffer drains.
    pub fn ready_for_more_data(&mut self) {
        if let Pending::Upload {
            on_progress: Some(progress),
            ..
        } = &mut self.pending
        {
            progress(UploadProgress::ReadyForMoreData);
        }
    }

    /// The bootloader received the whole current object.
    ///
    /// Drops the progress continuation so it cannot fire on later
    /// notifications.
    pub fn peripheral_did_receive_object(&mut self) {
        if let Pending::Upload { on_progress, .. } = &mut self.pending {
            *on_progress = None;
        }
    }

    // ========================================================================
    // Protocol Helpers
    // ========================================================================

    fn write(&mut self, request: &Request, completion: Completion, on_error: ErrorCallback) {
        let data = request.encode();

        self.pending = Pending::Command {
            request: request.op_code(),
            completion,
            on_error,
        };

        trace!(
            "ControlPoint[{}]: Writing to characteristic {}...",
            self.config.name,
            self.config.characteristic
        );
        debug!(
            "ControlPoint[{}]: write_with_response(0x{}) -> {}",
            self.config.name,
            hex::encode_upper(&data),
            request
        );

        if let Err(e) = self.transport.write_with_response(&data) {
            error!(
                "ControlPoint[{}]: Writing to characteristic failed: {}",
                self.config.name, e
            );
            self.fail(refusal(e, DfuError::WritingCharacteristicFailed));
        }
    }

    /// Resolve a decoded notification against the registered continuations.
    fn dispatch(&self, data: &[u8], completion: Completion, on_error: ErrorCallback) {
        let response = match Response::decode(data) {
            Ok(response) => response,
            Err(e) => {
                error!(
                    "ControlPoint[{}]: Unknown response received: 0x{} ({})",
                    self.config.name,
                    hex::encode_upper(data),
                    e
                );
                on_error(DfuError::UnsupportedResponse(data.to_vec()));
                return;
            }
        };

        match response.status {
            ResultCode::Success => {
                match response.request_op_code {
                    // Reported by whoever drives the procedure.
                    OpCode::CreateObject | OpCode::SetPrnValue | OpCode::Execute => {}
                    _ => info!("ControlPoint[{}]: {} received", self.config.name, response),
                }
                match completion {
                    Completion::Success(on_success) => on_success(),
                    Completion::Response(on_response) => on_response(response),
                }
            }
            ResultCode::ExtendedError => {
                let error = response
                    .extended_error()
                    .map(ExtendedErrorCode::error)
                    .unwrap_or_else(|| ResultCode::ExtendedError.error());
                warn!(
                    "ControlPoint[{}]: Error {}: {}",
                    self.config.name,
                    response.extended_error().map_or(0, ExtendedErrorCode::code),
                    error
                );
                on_error(error);
            }
            status => {
                warn!(
                    "ControlPoint[{}]: Error {}: {}",
                    self.config.name,
                    status.code(),
                    status.description()
                );
                on_error(status.error());
            }
        }
    }

    /// Clear the registered operation and report `error` to it.
    fn fail(&mut self, error: DfuError) {
        match std::mem::replace(&mut self.pending, Pending::Idle).into_error_callback() {
            Some(on_error) => on_error(error),
            None => trace!(
                "ControlPoint[{}]: No operation pending for error: {}",
                self.config.name,
                error
            ),
        }
    }

    fn log_notification(&self, data: &[u8]) {
        debug!(
            "ControlPoint[{}]: Notification received from {}, value (0x): {}",
            self.config.name,
            self.config.characteristic,
            hex::encode_upper(data)
        );
    }
}

/// Error for a request the transport refused synchronously.
fn refusal(e: TransportError, otherwise: DfuError) -> DfuError {
    match e {
        TransportError::Unavailable => DfuError::InvalidInternalState,
        _ => otherwise,
    }
}
