use chrono::NaiveDate;
use image_sender::config::{DEFAULT_RECIPIENT, DEFAULT_SUBJECT};
use image_sender::simulator::{Session, SimulatedOs};
use image_sender::{CaptureState, Event, FileProvider, ImageNaming};

#[test]
fn test_capture_then_send() {
    let dir = tempfile::tempdir().unwrap();
    let now = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    let mut session = Session::new(SimulatedOs::new(dir.path()).with_clock(now));

    session.dispatch(Event::CapturePhotoRequested).unwrap();
    assert_eq!(session.model().capture, CaptureState::PhotoReady);

    let path = session.model().current_photo_path.clone().unwrap();
    let name = path.file_name().unwrap();
    assert!(ImageNaming::default().matches(name));
    assert!(name.starts_with("JPEG_20240101_120000_"));

    session.dispatch(Event::SendEmailRequested).unwrap();

    let sent = session.os().sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipients, vec![DEFAULT_RECIPIENT.to_string()]);
    assert_eq!(sent[0].subject, DEFAULT_SUBJECT);

    let attachment = sent[0].attachment.as_ref().unwrap();
    assert_eq!(FileProvider::default().resolve(attachment).unwrap(), &path);
    assert!(session.os().renders() > 0);
}
