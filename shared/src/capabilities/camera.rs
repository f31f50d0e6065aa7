use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::file_provider::FileHandle;

/// Camera permission and capture delegation.
///
/// The actual capture is done by whichever camera app the OS picks; the image is
/// written straight into the `output` handle, so a successful capture carries no
/// payload back.
#[derive(Clone)]
pub struct Camera<E> {
    context: CapabilityContext<CameraOperation, E>,
}

impl<Ev> Capability<Ev> for Camera<Ev> {
    type Operation = CameraOperation;
    type MappedSelf<MappedEv> = Camera<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Camera::new(self.context.map_event(f))
    }
}

impl<E> Camera<E>
where
    E: Send + 'static,
{
    pub fn new(context: CapabilityContext<CameraOperation, E>) -> Self {
        Self { context }
    }

    pub fn check_permission<F>(&self, callback: F)
    where
        F: FnOnce(CameraResult) -> E + Send + 'static,
    {
        self.request(CameraOperation::CheckPermission, callback);
    }

    /// Shows the OS permission dialog. The answer is tagged with `request_code`.
    pub fn request_permission<F>(&self, request_code: u32, callback: F)
    where
        F: FnOnce(CameraResult) -> E + Send + 'static,
    {
        self.request(CameraOperation::RequestPermission { request_code }, callback);
    }

    pub fn resolve_capture_handler<F>(&self, callback: F)
    where
        F: FnOnce(CameraResult) -> E + Send + 'static,
    {
        self.request(CameraOperation::ResolveCaptureHandler, callback);
    }

    pub fn capture_image<F>(&self, output: FileHandle, callback: F)
    where
        F: FnOnce(CameraResult) -> E + Send + 'static,
    {
        self.request(CameraOperation::CaptureImage { output }, callback);
    }

    fn request<F>(&self, operation: CameraOperation, callback: F)
    where
        F: FnOnce(CameraResult) -> E + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context.request_from_shell(operation).await;
            context.update_app(callback(result));
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum CameraOperation {
    CheckPermission,
    RequestPermission { request_code: u32 },
    ResolveCaptureHandler,
    CaptureImage { output: FileHandle },
}

impl Operation for CameraOperation {
    type Output = CameraResult;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

impl PermissionStatus {
    #[must_use]
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

impl From<bool> for PermissionStatus {
    fn from(granted: bool) -> Self {
        if granted {
            Self::Granted
        } else {
            Self::Denied
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureOutcome {
    /// The camera app reported `RESULT_OK` and wrote into the output handle.
    Saved,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum CameraOutput {
    Permission(PermissionStatus),
    PermissionResponse {
        request_code: u32,
        status: PermissionStatus,
    },
    HandlerAvailable(bool),
    Capture(CaptureOutcome),
}

impl CameraOutput {
    #[must_use]
    pub fn permission_status(&self) -> Option<PermissionStatus> {
        match self {
            Self::Permission(status) | Self::PermissionResponse { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum CameraError {
    #[error("no activity can handle the image capture request")]
    NoHandler,

    #[error("camera permission denied")]
    PermissionDenied,

    #[error("capture failed: {reason}")]
    CaptureFailed { reason: String },

    #[error("internal error: {message}")]
    Internal { message: String },
}

pub type CameraResult = Result<CameraOutput, CameraError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_status_from_bool() {
        assert!(PermissionStatus::from(true).is_granted());
        assert!(!PermissionStatus::from(false).is_granted());
    }

    #[test]
    fn test_permission_status_from_output() {
        assert_eq!(
            CameraOutput::PermissionResponse {
                request_code: 1,
                status: PermissionStatus::Denied
            }
            .permission_status(),
            Some(PermissionStatus::Denied)
        );
        assert_eq!(CameraOutput::HandlerAvailable(true).permission_status(), None);
    }

    #[test]
    fn test_operations_cross_the_bridge() {
        let op = CameraOperation::RequestPermission { request_code: 1 };
        let json = serde_json::to_string(&op).unwrap();
        let back: CameraOperation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, op);
    }
}
