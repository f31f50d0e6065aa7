use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::config::AppConfig;
use crate::file_provider::{FileHandle, FileProvider, HandleError, PhotoPath};
use crate::{FailureKind, FlowFailure, ToastMessage, MAX_RECORDED_FAILURES};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaptureState {
    #[default]
    Idle,
    PermissionPending,
    CaptureRequested,
    PhotoReady,
}

impl CaptureState {
    #[must_use]
    pub const fn is_waiting_on_os(self) -> bool {
        matches!(self, Self::PermissionPending | Self::CaptureRequested)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    #[default]
    Unknown,
    Requesting,
    Granted,
    Denied,
}

/// Screen state. Owned by the shell and handed to every `update` call.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Model {
    pub config: AppConfig,

    pub capture: CaptureState,
    pub camera_permission: PermissionState,

    /// Most recently created capture destination. Never cleared.
    pub current_photo_path: Option<PhotoPath>,
    pub preview: Option<FileHandle>,

    pub active_toast: Option<ToastMessage>,

    /// Failures the flows absorbed without telling the user, oldest first.
    pub failures: VecDeque<FlowFailure>,
}

impl Model {
    #[must_use]
    pub fn with_config(config: AppConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn file_provider(&self) -> Result<FileProvider, HandleError> {
        FileProvider::new(self.config.provider_authority.clone())
    }

    pub fn show_toast(&mut self, message: impl Into<String>) {
        self.active_toast = Some(ToastMessage::new(message));
    }

    pub fn dismiss_toast(&mut self) {
        self.active_toast = None;
    }

    pub fn record_failure(&mut self, failure: FlowFailure) {
        if self.failures.len() >= MAX_RECORDED_FAILURES {
            self.failures.pop_front();
        }
        self.failures.push_back(failure);
    }

    #[must_use]
    pub fn failure_count(&self, kind: FailureKind) -> usize {
        self.failures.iter().filter(|f| f.kind == kind).count()
    }

    #[must_use]
    pub fn last_failure(&self) -> Option<&FlowFailure> {
        self.failures.back()
    }

    /// Returns to rest after a capture attempt ends, keeping any earlier preview.
    pub fn settle_capture(&mut self) {
        self.capture = if self.preview.is_some() {
            CaptureState::PhotoReady
        } else {
            CaptureState::Idle
        };
    }
}
