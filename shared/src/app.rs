use tracing::{debug, info, warn};

use crate::capabilities::{
    CameraOutput, CameraResult, Capabilities, CapabilityError, CaptureOutcome,
    EmailMessage, FileOutput, FileResult, MailResult, NetworkResult, StorageDirectory,
};
use crate::event::Event;
use crate::file_provider::{FileHandle, HandleAccess, PhotoPath};
use crate::model::{CaptureState, Model, PermissionState};
use crate::{FailureKind, Flow, FlowFailure, ToastView, ViewModel};

/// The single screen: a "take photo" button, a "send email" button and a preview.
#[derive(Default)]
pub struct App;

impl App {
    /// Logs a failure, keeps it on the model and raises its toast, if it has one.
    fn absorb(model: &mut Model, flow: Flow, kind: FailureKind, detail: impl Into<String>) {
        let failure = FlowFailure::new(flow, kind, detail);
        warn!(flow = ?failure.flow, kind = ?failure.kind, detail = %failure.detail, "flow aborted");
        if let Some(notice) = kind.notice() {
            model.show_toast(notice);
        }
        model.record_failure(failure);
    }

    fn abort_capture(model: &mut Model, kind: FailureKind, detail: impl Into<String>) {
        model.settle_capture();
        Self::absorb(model, Flow::Capture, kind, detail);
    }

    fn start_capture(caps: &Capabilities) {
        debug!("resolving image capture handler");
        caps.camera
            .resolve_capture_handler(|result| Event::CaptureHandlerResolved(Box::new(result)));
    }

    fn handle_permission_check(result: CameraResult, model: &mut Model, caps: &Capabilities) {
        let granted = matches!(
            &result,
            Ok(output) if output.permission_status().is_some_and(|s| s.is_granted())
        );

        if granted {
            model.camera_permission = PermissionState::Granted;
            Self::start_capture(caps);
            return;
        }

        if let Err(e) = &result {
            debug!(error = %e, "permission check failed, asking instead");
        }

        let code = model.config.camera_request_code;
        model.camera_permission = PermissionState::Requesting;
        model.capture = CaptureState::PermissionPending;

        caps.camera.request_permission(code, move |result| match result {
            Ok(CameraOutput::PermissionResponse {
                request_code,
                status,
            }) => Event::CameraPermissionResult {
                request_code,
                granted: status.is_granted(),
            },
            _ => Event::CameraPermissionResult {
                request_code: code,
                granted: false,
            },
        });
        caps.render.render();
    }

    fn handle_permission_result(
        request_code: u32,
        granted: bool,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        if request_code != model.config.camera_request_code {
            debug!(request_code, "ignoring permission result for another request");
            return;
        }

        if granted {
            model.camera_permission = PermissionState::Granted;
            Self::start_capture(caps);
        } else {
            model.camera_permission = PermissionState::Denied;
            Self::abort_capture(
                model,
                FailureKind::PermissionDenied,
                "user denied camera permission",
            );
        }

        caps.render.render();
    }

    fn handle_capture_handler(result: CameraResult, model: &mut Model, caps: &Capabilities) {
        match result {
            Ok(CameraOutput::HandlerAvailable(true)) => {
                caps.files.create_image_file(
                    StorageDirectory::Pictures,
                    model.config.naming.clone(),
                    |result| Event::ImageFileCreated(Box::new(result)),
                );
            }
            Ok(CameraOutput::HandlerAvailable(false)) => {
                Self::abort_capture(
                    model,
                    FailureKind::NoCaptureHandler,
                    "no camera app installed",
                );
                caps.render.render();
            }
            Ok(other) => {
                Self::abort_capture(
                    model,
                    FailureKind::UnexpectedOutput,
                    format!("expected handler lookup, got {other:?}"),
                );
                caps.render.render();
            }
            Err(e) => {
                Self::abort_capture(
                    model,
                    FailureKind::NoCaptureHandler,
                    CapabilityError::from(e).to_string(),
                );
                caps.render.render();
            }
        }
    }

    /// The camera's write handle for a freshly created file. The file must be
    /// absolute and named by the configured rule.
    fn capture_destination(model: &Model, path: &PhotoPath) -> Result<FileHandle, String> {
        let named_by_rule = path
            .file_name()
            .is_some_and(|name| model.config.naming.matches(name));
        if !named_by_rule {
            return Err(format!("unexpected image file name: {path}"));
        }

        model
            .file_provider()
            .and_then(|provider| provider.issue(path, HandleAccess::ReadWrite))
            .map_err(|e| format!("{path}: {e}"))
    }

    fn handle_file_created(result: FileResult, model: &mut Model, caps: &Capabilities) {
        let destination = result
            .map_err(|e| CapabilityError::from(e).to_string())
            .and_then(|FileOutput::Created { path }| {
                Self::capture_destination(model, &path).map(|handle| (path, handle))
            });

        let (path, handle) = match destination {
            Ok(destination) => destination,
            Err(detail) => {
                Self::abort_capture(model, FailureKind::FileCreation, detail);
                caps.render.render();
                return;
            }
        };

        debug!(path = %path, "image file created");
        model.current_photo_path = Some(path);
        model.capture = CaptureState::CaptureRequested;
        caps.camera
            .capture_image(handle, |result| Event::CaptureCompleted(Box::new(result)));
        caps.render.render();
    }

    fn handle_capture_completed(result: CameraResult, model: &mut Model, caps: &Capabilities) {
        match result {
            Ok(CameraOutput::Capture(CaptureOutcome::Saved)) => {
                let preview = match &model.current_photo_path {
                    Some(path) => model
                        .file_provider()
                        .and_then(|provider| provider.issue(path, HandleAccess::Read))
                        .map_err(|e| e.to_string()),
                    None => Err("capture finished without a destination".to_string()),
                };

                match preview {
                    Ok(handle) => {
                        info!("photo captured");
                        model.preview = Some(handle);
                        model.capture = CaptureState::PhotoReady;
                    }
                    Err(detail) => {
                        Self::abort_capture(model, FailureKind::UnexpectedOutput, detail);
                    }
                }
            }
            Ok(CameraOutput::Capture(CaptureOutcome::Cancelled)) => {
                Self::abort_capture(model, FailureKind::CaptureNotSaved, "capture cancelled");
            }
            Ok(other) => {
                Self::abort_capture(
                    model,
                    FailureKind::UnexpectedOutput,
                    format!("expected capture result, got {other:?}"),
                );
            }
            Err(e) => {
                Self::abort_capture(
                    model,
                    FailureKind::CaptureNotSaved,
                    CapabilityError::from(e).to_string(),
                );
            }
        }

        caps.render.render();
    }

    fn handle_connectivity(result: NetworkResult, model: &mut Model, caps: &Capabilities) {
        let connected = matches!(result, Ok(output) if output.is_connected());

        if !connected {
            let detail = match result {
                Err(e) => CapabilityError::from(e).to_string(),
                Ok(_) => "no active network".to_string(),
            };
            Self::absorb(model, Flow::Email, FailureKind::Offline, detail);
            caps.render.render();
            return;
        }

        Self::dispatch_email(model, caps);
    }

    fn dispatch_email(model: &mut Model, caps: &Capabilities) {
        let attachment = model
            .current_photo_path
            .as_ref()
            .map(|path| {
                model
                    .file_provider()
                    .and_then(|provider| provider.issue(path, HandleAccess::Read))
            })
            .transpose();
        let attachment = match attachment {
            Ok(attachment) => attachment,
            Err(e) => {
                Self::absorb(model, Flow::Email, FailureKind::ComposeFailed, e.to_string());
                return;
            }
        };

        let message = match EmailMessage::compose(&model.config.mail, attachment) {
            Ok(message) => message,
            Err(e) => {
                Self::absorb(
                    model,
                    Flow::Email,
                    FailureKind::ComposeFailed,
                    CapabilityError::from(e).to_string(),
                );
                return;
            }
        };

        debug!(
            recipients = ?message.recipients,
            has_attachment = message.has_attachment(),
            "opening mail chooser"
        );
        caps.mail.send_via_chooser(
            message,
            model.config.mail.chooser_title.clone(),
            |result| Event::EmailDispatched(Box::new(result)),
        );
    }

    fn handle_email_dispatched(result: MailResult, model: &mut Model) {
        match result {
            Ok(_) => info!("mail chooser shown"),
            Err(e) => Self::absorb(
                model,
                Flow::Email,
                FailureKind::ComposeFailed,
                CapabilityError::from(e).to_string(),
            ),
        }
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        if event.is_user_initiated() {
            debug!(event = event.name(), "user action");
        }

        match event {
            Event::Noop => {}

            Event::ConfigLoaded(config) => {
                match config.validated() {
                    Ok(config) => {
                        model.config = config;
                        info!("configuration applied");
                    }
                    Err(e) => warn!(error = %e, "rejected configuration, keeping previous"),
                }
                caps.render.render();
            }

            Event::CapturePhotoRequested => {
                caps.camera
                    .check_permission(|result| Event::CameraPermissionChecked(Box::new(result)));
            }

            Event::CameraPermissionChecked(result) => {
                Self::handle_permission_check(*result, model, caps);
            }

            Event::CameraPermissionResult {
                request_code,
                granted,
            } => {
                Self::handle_permission_result(request_code, granted, model, caps);
            }

            Event::CaptureHandlerResolved(result) => {
                Self::handle_capture_handler(*result, model, caps);
            }

            Event::ImageFileCreated(result) => {
                Self::handle_file_created(*result, model, caps);
            }

            Event::CaptureCompleted(result) => {
                Self::handle_capture_completed(*result, model, caps);
            }

            Event::SendEmailRequested => {
                caps.network
                    .check_connectivity(|result| Event::ConnectivityChecked(Box::new(result)));
            }

            Event::ConnectivityChecked(result) => {
                Self::handle_connectivity(*result, model, caps);
            }

            Event::EmailDispatched(result) => {
                Self::handle_email_dispatched(*result, model);
            }

            Event::DismissToast => {
                model.dismiss_toast();
                caps.render.render();
            }
        }
    }

    fn view(&self, model: &Model) -> ViewModel {
        ViewModel {
            capture_state: model.capture,
            preview_uri: model
                .preview
                .as_ref()
                .and_then(|handle| handle.content_uri().ok())
                .map(|uri| uri.to_string()),
            has_photo: model.current_photo_path.is_some(),
            is_busy: model.capture.is_waiting_on_os(),
            toast: model.active_toast.as_ref().map(ToastView::from),
        }
    }
}
