#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]

pub mod app;
pub mod capabilities;
pub mod config;
pub mod event;
pub mod file_provider;
pub mod model;
#[cfg(feature = "simulator")]
pub mod simulator;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use config::{AppConfig, ConfigError, MailConfig};
pub use event::Event;
pub use file_provider::{FileHandle, FileProvider, HandleAccess, ImageNaming, PhotoPath};
pub use model::{CaptureState, Model, PermissionState};

pub const MSG_PERMISSION_DENIED: &str = "Camera permission denied";
pub const MSG_NO_INTERNET: &str = "No internet connection!";

/// Android `Toast.LENGTH_SHORT`.
pub const TOAST_SHORT_MS: u64 = 2000;

pub const MAX_RECORDED_FAILURES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    Capture,
    Email,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("no camera app can handle the capture")]
    NoCaptureHandler,
    #[error("could not create the image file")]
    FileCreation,
    #[error("camera did not save a photo")]
    CaptureNotSaved,
    #[error("no internet connection")]
    Offline,
    #[error("could not compose or dispatch the email")]
    ComposeFailed,
    #[error("unexpected response from the shell")]
    UnexpectedOutput,
}

impl FailureKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::PermissionDenied => "CAMERA_PERMISSION_DENIED",
            Self::NoCaptureHandler => "NO_CAPTURE_HANDLER",
            Self::FileCreation => "FILE_CREATION_FAILED",
            Self::CaptureNotSaved => "CAPTURE_NOT_SAVED",
            Self::Offline => "OFFLINE",
            Self::ComposeFailed => "COMPOSE_FAILED",
            Self::UnexpectedOutput => "UNEXPECTED_OUTPUT",
        }
    }

    /// Toast text shown for this failure. Everything else stays silent.
    #[must_use]
    pub const fn notice(self) -> Option<&'static str> {
        match self {
            Self::PermissionDenied => Some(MSG_PERMISSION_DENIED),
            Self::Offline => Some(MSG_NO_INTERNET),
            _ => None,
        }
    }
}

/// A failure a flow absorbed. Kept on the model so it stays observable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("[{}] {kind}: {detail}", .kind.code())]
pub struct FlowFailure {
    pub flow: Flow,
    pub kind: FailureKind,
    pub detail: String,
    pub at_ms: u64,
}

impl FlowFailure {
    #[must_use]
    pub fn new(flow: Flow, kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            flow,
            kind,
            detail: detail.into(),
            at_ms: get_current_time_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToastMessage {
    pub message: String,
    pub created_at_ms: u64,
    pub duration_ms: u64,
}

impl ToastMessage {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            created_at_ms: get_current_time_ms(),
            duration_ms: TOAST_SHORT_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToastView {
    pub message: String,
    pub duration_ms: u64,
}

impl From<&ToastMessage> for ToastView {
    fn from(toast: &ToastMessage) -> Self {
        Self {
            message: toast.message.clone(),
            duration_ms: toast.duration_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewModel {
    pub capture_state: CaptureState,
    /// `content://` URI of the last saved photo.
    pub preview_uri: Option<String>,
    pub has_photo: bool,
    pub is_busy: bool,
    pub toast: Option<ToastView>,
}

#[must_use]
pub fn get_current_time_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
