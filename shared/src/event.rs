use serde::{Deserialize, Serialize};

use crate::capabilities::{CameraResult, FileResult, MailResult, NetworkResult};
use crate::config::AppConfig;

// Capability responses are boxed to keep the enum small.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub enum Event {
    #[default]
    Noop,

    ConfigLoaded(Box<AppConfig>),

    // Photo flow
    CapturePhotoRequested,
    CameraPermissionChecked(Box<CameraResult>),
    CameraPermissionResult {
        request_code: u32,
        granted: bool,
    },
    CaptureHandlerResolved(Box<CameraResult>),
    ImageFileCreated(Box<FileResult>),
    CaptureCompleted(Box<CameraResult>),

    // Email flow
    SendEmailRequested,
    ConnectivityChecked(Box<NetworkResult>),
    EmailDispatched(Box<MailResult>),

    DismissToast,
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::ConfigLoaded(_) => "config_loaded",
            Self::CapturePhotoRequested => "capture_photo_requested",
            Self::CameraPermissionChecked(_) => "camera_permission_checked",
            Self::CameraPermissionResult { .. } => "camera_permission_result",
            Self::CaptureHandlerResolved(_) => "capture_handler_resolved",
            Self::ImageFileCreated(_) => "image_file_created",
            Self::CaptureCompleted(_) => "capture_completed",
            Self::SendEmailRequested => "send_email_requested",
            Self::ConnectivityChecked(_) => "connectivity_checked",
            Self::EmailDispatched(_) => "email_dispatched",
            Self::DismissToast => "dismiss_toast",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::CapturePhotoRequested | Self::SendEmailRequested | Self::DismissToast
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_default() {
        assert!(matches!(Event::default(), Event::Noop));
    }

    #[test]
    fn test_event_name() {
        assert_eq!(Event::Noop.name(), "noop");
        assert_eq!(Event::CapturePhotoRequested.name(), "capture_photo_requested");
        assert_eq!(Event::SendEmailRequested.name(), "send_email_requested");
        assert_eq!(
            Event::CameraPermissionResult {
                request_code: 1,
                granted: true
            }
            .name(),
            "camera_permission_result"
        );
    }

    #[test]
    fn test_event_is_user_initiated() {
        assert!(Event::CapturePhotoRequested.is_user_initiated());
        assert!(Event::SendEmailRequested.is_user_initiated());
        assert!(!Event::Noop.is_user_initiated());
        assert!(!Event::CameraPermissionResult {
            request_code: 1,
            granted: false
        }
        .is_user_initiated());
    }

    #[test]
    fn test_event_size_is_reasonable() {
        let size = std::mem::size_of::<Event>();
        assert!(
            size <= 32,
            "Event enum is {} bytes, box more variants",
            size
        );
    }
}
