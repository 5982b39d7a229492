//! Integration tests for the control point session.
//!
//! A mock transport records every subscribe and write. Tests play the part of
//! the GATT stack by feeding acknowledgements and notifications back through
//! the session's inbound methods.

use secure_dfu_control::secure_dfu_protocol::{ExtendedErrorCode, ResultCode};
use secure_dfu_control::{
    CharacteristicProperties, ControlPoint, ControlPointConfig, ControlPointState,
    ControlPointTransport, DfuError, Request, Response, TransportError, UploadProgress,
};
use std::cell::RefCell;
use std::rc::Rc;

// ============================================================================
// Test Helpers
// ============================================================================

#[derive(Debug, Default)]
struct TransportLog {
    subscribes: usize,
    writes: Vec<Vec<u8>>,
    /// Returned (once) by the next subscribe or write.
    refuse_next: Option<TransportError>,
}

struct MockTransport {
    log: Rc<RefCell<TransportLog>>,
    properties: CharacteristicProperties,
}

impl ControlPointTransport for MockTransport {
    fn subscribe(&mut self) -> Result<(), TransportError> {
        let mut log = self.log.borrow_mut();
        log.subscribes += 1;
        match log.refuse_next.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn write_with_response(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let mut log = self.log.borrow_mut();
        log.writes.push(data.to_vec());
        match log.refuse_next.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn properties(&self) -> CharacteristicProperties {
        self.properties
    }
}

/// Everything a continuation reported.
#[derive(Debug, Clone, PartialEq)]
enum Event {
    Success,
    Response(Response),
    Progress(UploadProgress),
    Error(DfuError),
}

type Events = Rc<RefCell<Vec<Event>>>;

fn setup() -> (ControlPoint<MockTransport>, Rc<RefCell<TransportLog>>, Events) {
    let log = Rc::new(RefCell::new(TransportLog::default()));
    let transport = MockTransport {
        log: log.clone(),
        properties: CharacteristicProperties::CONTROL_POINT,
    };
    let control_point = ControlPoint::new(transport, ControlPointConfig::named("DfuTarg"));
    (control_point, log, Rc::new(RefCell::new(Vec::new())))
}

fn on_success(events: &Events) -> impl FnOnce() + 'static {
    let events = events.clone();
    move || events.borrow_mut().push(Event::Success)
}

fn on_response(events: &Events) -> impl FnOnce(Response) + 'static {
    let events = events.clone();
    move |response| events.borrow_mut().push(Event::Response(response))
}

fn on_progress(events: &Events) -> impl FnMut(UploadProgress) + 'static {
    let events = events.clone();
    move |progress| events.borrow_mut().push(Event::Progress(progress))
}

fn on_error(events: &Events) -> impl FnOnce(DfuError) + 'static {
    let events = events.clone();
    move |error| events.borrow_mut().push(Event::Error(error))
}

/// Packet Receipt Notification for 8192 bytes.
const PRN_8192: [u8; 11] = [
    0x60, 0x03, 0x01, 0x00, 0x20, 0x00, 0x00, 0x78, 0x56, 0x34, 0x12,
];

// ============================================================================
// Enabling Notifications
// ============================================================================

#[test]
fn test_enable_notifications_success() {
    let (mut cp, log, events) = setup();

    cp.enable_notifications(on_success(&events), on_error(&events));
    assert_eq!(log.borrow().subscribes, 1);
    assert!(events.borrow().is_empty());

    cp.notification_state_updated(Ok(()));
    assert_eq!(*events.borrow(), vec![Event::Success]);
    assert_eq!(cp.state(), ControlPointState::Idle);
}

#[test]
fn test_enable_notifications_failure() {
    let (mut cp, _log, events) = setup();

    cp.enable_notifications(on_success(&events), on_error(&events));
    cp.notification_state_updated(Err(TransportError::Att(253)));

    assert_eq!(
        *events.borrow(),
        vec![Event::Error(DfuError::EnablingControlPointFailed)]
    );
    assert_eq!(
        DfuError::EnablingControlPointFailed.to_string(),
        "Enabling notifications failed"
    );
}

#[test]
fn test_enable_notifications_peripheral_unavailable() {
    let (mut cp, log, events) = setup();
    log.borrow_mut().refuse_next = Some(TransportError::Unavailable);

    cp.enable_notifications(on_success(&events), on_error(&events));

    assert_eq!(
        *events.borrow(),
        vec![Event::Error(DfuError::InvalidInternalState)]
    );
    assert_eq!(cp.state(), ControlPointState::Idle);
}

#[test]
fn test_notification_state_update_outside_subscription_is_ignored() {
    let (mut cp, _log, events) = setup();

    cp.send(&Request::Execute, on_success(&events), on_error(&events));
    cp.notification_state_updated(Ok(()));
    cp.notification_state_updated(Err(TransportError::Att(253)));
    assert!(events.borrow().is_empty());
    assert_eq!(cp.state(), ControlPointState::AwaitingWriteAck);

    // The pending request is still resolved by its response.
    cp.write_completed(Ok(()));
    cp.notification_received(Ok(&[0x60, 0x04, 0x01]));
    assert_eq!(*events.borrow(), vec![Event::Success]);
}

// ============================================================================
// Requests
// ============================================================================

#[test]
fn test_create_data_object_success() {
    let (mut cp, log, events) = setup();

    cp.send(
        &Request::CreateDataObject { size: 4096 },
        on_success(&events),
        on_error(&events),
    );
    assert_eq!(
        log.borrow().writes,
        vec![vec![0x01, 0x02, 0x00, 0x10, 0x00, 0x00]]
    );

    cp.write_completed(Ok(()));
    assert!(events.borrow().is_empty());

    cp.notification_received(Ok(&[0x60, 0x01, 0x01]));
    assert_eq!(*events.borrow(), vec![Event::Success]);
    assert_eq!(cp.state(), ControlPointState::Idle);
}

#[test]
fn test_select_command_object_delivers_response() {
    let (mut cp, log, events) = setup();

    cp.send_with_response(
        &Request::SelectCommandObject,
        on_response(&events),
        on_error(&events),
    );
    assert_eq!(log.borrow().writes, vec![vec![0x06, 0x01]]);
    cp.write_completed(Ok(()));

    cp.notification_received(Ok(&[
        0x60, 0x06, 0x01, 0x00, 0x01, 0x00, 0x00, 0x80, 0x00, 0x00, 0x00, 0xEF, 0xBE, 0xAD,
        0xDE,
    ]));

    let events = events.borrow();
    assert_eq!(events.len(), 1);
    match &events[0] {
        Event::Response(response) => {
            assert_eq!(response.max_size(), Some(256));
            assert_eq!(response.offset(), Some(128));
            assert_eq!(response.crc(), Some(0xDEADBEEF));
        }
        other => panic!("Expected response, got {:?}", other),
    }
}

#[test]
fn test_calculate_checksum_delivers_response() {
    let (mut cp, _log, events) = setup();

    cp.send_with_response(&Request::CalculateChecksum, on_response(&events), on_error(&events));
    cp.write_completed(Ok(()));
    cp.notification_received(Ok(&PRN_8192));

    let events = events.borrow();
    match &events[..] {
        [Event::Response(response)] => {
            assert_eq!(response.offset(), Some(8192));
            assert_eq!(response.crc(), Some(0x12345678));
        }
        other => panic!("Expected one response, got {:?}", other),
    }
}

#[test]
fn test_remote_error_reported() {
    let (mut cp, _log, events) = setup();

    cp.send(&Request::Execute, on_success(&events), on_error(&events));
    cp.write_completed(Ok(()));
    cp.notification_received(Ok(&[0x60, 0x04, 0x08]));

    assert_eq!(
        *events.borrow(),
        vec![Event::Error(DfuError::Remote(ResultCode::OperationNotPermitted))]
    );
}

#[test]
fn test_extended_error_reported() {
    let (mut cp, _log, events) = setup();

    cp.send(
        &Request::CreateCommandObject { size: 141 },
        on_success(&events),
        on_error(&events),
    );
    cp.write_completed(Ok(()));
    cp.notification_received(Ok(&[0x60, 0x01, 0x0B, 0x0D]));

    let error = DfuError::RemoteExtended(ExtendedErrorCode::InsufficientSpace);
    assert_eq!(*events.borrow(), vec![Event::Error(error.clone())]);
    assert_eq!(error.to_string(), "Insufficient space for upgrade");
}

#[test]
fn test_unsupported_response_reported() {
    let (mut cp, _log, events) = setup();

    cp.send(&Request::Execute, on_success(&events), on_error(&events));
    cp.write_completed(Ok(()));
    cp.notification_received(Ok(&[0x61, 0x04, 0x01]));

    let error = DfuError::UnsupportedResponse(vec![0x61, 0x04, 0x01]);
    assert_eq!(*events.borrow(), vec![Event::Error(error.clone())]);
    assert_eq!(error.to_string(), "Unsupported response received: 0x610401");
}

#[test]
fn test_truncated_response_is_unsupported() {
    let (mut cp, _log, events) = setup();

    cp.send_with_response(&Request::SelectDataObject, on_response(&events), on_error(&events));
    cp.write_completed(Ok(()));
    cp.notification_received(Ok(&[0x60, 0x06, 0x01, 0x00]));

    assert_eq!(
        *events.borrow(),
        vec![Event::Error(DfuError::UnsupportedResponse(vec![
            0x60, 0x06, 0x01, 0x00
        ]))]
    );
}

#[test]
fn test_unmapped_extended_error_is_unsupported() {
    let (mut cp, _log, events) = setup();

    cp.send(&Request::Execute, on_success(&events), on_error(&events));
    cp.write_completed(Ok(()));
    // 0x01 is not in the extended error table.
    cp.notification_received(Ok(&[0x60, 0x04, 0x0B, 0x01]));

    assert_eq!(
        *events.borrow(),
        vec![Event::Error(DfuError::UnsupportedResponse(vec![
            0x60, 0x04, 0x0B, 0x01
        ]))]
    );
    assert_eq!(cp.state(), ControlPointState::Idle);
}

#[test]
fn test_write_failure_is_terminal() {
    let (mut cp, _log, events) = setup();

    cp.send(&Request::Execute, on_success(&events), on_error(&events));
    cp.write_completed(Err(TransportError::Att(0x03)));
    assert_eq!(
        *events.borrow(),
        vec![Event::Error(DfuError::WritingCharacteristicFailed)]
    );
    assert_eq!(cp.state(), ControlPointState::Idle);

    // A late notification has nothing left to resolve.
    cp.notification_received(Ok(&[0x60, 0x04, 0x01]));
    assert_eq!(events.borrow().len(), 1);
}

#[test]
fn test_write_refused_synchronously() {
    let (mut cp, log, events) = setup();

    log.borrow_mut().refuse_next = Some(TransportError::Other("busy".into()));
    cp.send(&Request::Execute, on_success(&events), on_error(&events));
    assert_eq!(
        *events.borrow(),
        vec![Event::Error(DfuError::WritingCharacteristicFailed)]
    );

    events.borrow_mut().clear();
    log.borrow_mut().refuse_next = Some(TransportError::Unavailable);
    cp.send(&Request::Execute, on_success(&events), on_error(&events));
    assert_eq!(
        *events.borrow(),
        vec![Event::Error(DfuError::InvalidInternalState)]
    );
}

#[test]
fn test_receiving_notification_failed() {
    let (mut cp, _log, events) = setup();

    cp.send(&Request::Execute, on_success(&events), on_error(&events));
    cp.write_completed(Ok(()));
    cp.notification_received(Err(TransportError::Other("link lost".into())));

    assert_eq!(
        *events.borrow(),
        vec![Event::Error(DfuError::ReceivingNotificationFailed)]
    );
}

#[test]
fn test_last_registration_wins() {
    let (mut cp, log, events) = setup();
    let first = Rc::new(RefCell::new(Vec::new()));

    cp.send(&Request::Execute, on_success(&first), on_error(&first));
    cp.send(
        &Request::SetPacketReceiptNotification { value: 12 },
        on_success(&events),
        on_error(&events),
    );
    assert_eq!(log.borrow().writes.len(), 2);
    assert_eq!(log.borrow().writes[1], vec![0x02, 0x0C, 0x00]);

    cp.write_completed(Ok(()));
    cp.notification_received(Ok(&[0x60, 0x02, 0x01]));

    assert!(first.borrow().is_empty());
    assert_eq!(*events.borrow(), vec![Event::Success]);
}

#[test]
fn test_notification_while_idle_is_ignored() {
    let (mut cp, _log, events) = setup();

    cp.notification_received(Ok(&[0x60, 0x01, 0x01]));
    cp.write_completed(Ok(()));
    cp.ready_for_more_data();

    assert!(events.borrow().is_empty());
    assert_eq!(cp.state(), ControlPointState::Idle);
}

// ============================================================================
// Upload Flow Control
// ============================================================================

#[test]
fn test_packet_receipt_notification_reports_progress_only() {
    let (mut cp, log, events) = setup();

    cp.wait_until_upload_complete(on_success(&events), on_progress(&events), on_error(&events));
    assert!(log.borrow().writes.is_empty());

    cp.notification_received(Ok(&PRN_8192));
    cp.notification_received(Ok(&PRN_8192));

    assert_eq!(
        *events.borrow(),
        vec![
            Event::Progress(UploadProgress::Offset(8192)),
            Event::Progress(UploadProgress::Offset(8192)),
        ]
    );
    assert_eq!(cp.state(), ControlPointState::AwaitingUploadFlowControl);
}

#[test]
fn test_ready_for_more_data() {
    let (mut cp, _log, events) = setup();

    cp.wait_until_upload_complete(on_success(&events), on_progress(&events), on_error(&events));
    cp.ready_for_more_data();

    assert_eq!(
        *events.borrow(),
        vec![Event::Progress(UploadProgress::ReadyForMoreData)]
    );
}

#[test]
fn test_object_received_then_response_completes_upload() {
    let (mut cp, _log, events) = setup();

    cp.wait_until_upload_complete(on_success(&events), on_progress(&events), on_error(&events));
    cp.notification_received(Ok(&PRN_8192));
    cp.peripheral_did_receive_object();

    // No more progress once the object is complete.
    cp.ready_for_more_data();
    assert_eq!(events.borrow().len(), 1);

    // The same frame is now a checksum response and ends the wait.
    cp.notification_received(Ok(&PRN_8192));
    assert_eq!(
        *events.borrow(),
        vec![
            Event::Progress(UploadProgress::Offset(8192)),
            Event::Success
        ]
    );
    assert_eq!(cp.state(), ControlPointState::Idle);
}

#[test]
fn test_error_during_upload() {
    let (mut cp, _log, events) = setup();

    cp.wait_until_upload_complete(on_success(&events), on_progress(&events), on_error(&events));
    cp.notification_received(Ok(&[0x60, 0x03, 0x05]));

    assert_eq!(
        *events.borrow(),
        vec![Event::Error(DfuError::Remote(ResultCode::InvalidObject))]
    );
}

#[test]
fn test_receiving_notification_failed_during_upload() {
    let (mut cp, _log, events) = setup();

    cp.wait_until_upload_complete(on_success(&events), on_progress(&events), on_error(&events));
    cp.notification_received(Ok(&PRN_8192));
    cp.notification_received(Err(TransportError::Att(0x0E)));

    assert_eq!(
        *events.borrow(),
        vec![
            Event::Progress(UploadProgress::Offset(8192)),
            Event::Error(DfuError::ReceivingNotificationFailed),
        ]
    );
    assert_eq!(cp.state(), ControlPointState::Idle);

    // Progress no longer fires once the upload ended.
    cp.ready_for_more_data();
    assert_eq!(events.borrow().len(), 2);
}

#[test]
fn test_non_prn_success_ends_upload() {
    let (mut cp, _log, events) = setup();

    cp.wait_until_upload_complete(on_success(&events), on_progress(&events), on_error(&events));
    cp.notification_received(Ok(&[0x60, 0x04, 0x01]));

    assert_eq!(*events.borrow(), vec![Event::Success]);
}

// ============================================================================
// Validity
// ============================================================================

#[test]
fn test_characteristic_validity() {
    let (cp, _log, _events) = setup();
    assert!(cp.is_valid());

    let transport = MockTransport {
        log: Rc::new(RefCell::new(TransportLog::default())),
        properties: CharacteristicProperties {
            write: true,
            ..Default::default()
        },
    };
    let cp = ControlPoint::new(transport, ControlPointConfig::default());
    assert!(!cp.is_valid());
}
