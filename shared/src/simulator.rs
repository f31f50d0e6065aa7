//! Deterministic stand-in for the host OS.
//!
//! [`SimulatedOs`] answers every capability request the core makes. Its switches
//! cover permission dialogs, installed apps, connectivity and storage. [`Session`]
//! pairs it with [`AppTester`] and runs each user action until no work is left.
//! Image files are created for real, in whatever pictures directory it is given.

use chrono::{Local, NaiveDateTime};
use crux_core::testing::AppTester;
use rand::Rng;
use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

use crate::app::App;
use crate::capabilities::{
    CameraError, CameraOperation, CameraOutput, CameraResult, CaptureOutcome, Effect, EmailMessage,
    FileError, FileOperation, FileOutput, FileResult, MailError, MailOperation, MailOutput,
    MailResult, NetworkOperation, NetworkOutput, NetworkResult, PermissionStatus,
    StorageDirectory,
};
use crate::event::Event;
use crate::file_provider::{FileHandle, FileProvider, ImageNaming, PhotoPath};
use crate::model::Model;
use crate::ViewModel;

const MAX_CREATE_ATTEMPTS: usize = 16;

/// Smallest byte sequence image decoders accept as a JPEG frame.
const PLACEHOLDER_JPEG: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01, 0xFF, 0xD9,
];

#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("failed to resolve {operation}: {message}")]
    Resolve {
        operation: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureBehavior {
    /// The camera app writes a photo into the handle and reports success.
    Save,
    Cancel,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OsCall {
    Camera(CameraOperation),
    Files(FileOperation),
    Network(NetworkOperation),
    Mail(MailOperation),
}

#[derive(Debug, Clone)]
pub struct SimulatedOs {
    provider: FileProvider,
    pictures_dir: Option<PathBuf>,
    permission_granted: bool,
    grant_on_request: bool,
    camera_installed: bool,
    capture: CaptureBehavior,
    connected: bool,
    mail_failure: Option<MailError>,
    clock: Option<NaiveDateTime>,

    calls: Vec<OsCall>,
    permission_dialogs: usize,
    renders: usize,
    sent: Vec<EmailMessage>,
}

impl SimulatedOs {
    /// A device with a camera app and a network, where the camera permission has
    /// not been granted yet and the user will grant it when asked.
    pub fn new(pictures_dir: impl Into<PathBuf>) -> Self {
        Self {
            provider: FileProvider::default(),
            pictures_dir: Some(pictures_dir.into()),
            permission_granted: false,
            grant_on_request: true,
            camera_installed: true,
            capture: CaptureBehavior::Save,
            connected: true,
            mail_failure: None,
            clock: None,
            calls: Vec::new(),
            permission_dialogs: 0,
            renders: 0,
            sent: Vec::new(),
        }
    }

    #[must_use]
    pub fn without_storage(mut self) -> Self {
        self.pictures_dir = None;
        self
    }

    #[must_use]
    pub fn with_permission_granted(mut self, granted: bool) -> Self {
        self.permission_granted = granted;
        self
    }

    #[must_use]
    pub fn with_user_granting(mut self, grants: bool) -> Self {
        self.grant_on_request = grants;
        self
    }

    #[must_use]
    pub fn with_camera_installed(mut self, installed: bool) -> Self {
        self.camera_installed = installed;
        self
    }

    #[must_use]
    pub fn with_capture(mut self, behavior: CaptureBehavior) -> Self {
        self.capture = behavior;
        self
    }

    #[must_use]
    pub fn with_connectivity(mut self, connected: bool) -> Self {
        self.connected = connected;
        self
    }

    #[must_use]
    pub fn with_mail_failure(mut self, error: MailError) -> Self {
        self.mail_failure = Some(error);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, now: NaiveDateTime) -> Self {
        self.clock = Some(now);
        self
    }

    pub fn set_connectivity(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub fn set_capture(&mut self, behavior: CaptureBehavior) {
        self.capture = behavior;
    }

    #[must_use]
    pub fn calls(&self) -> &[OsCall] {
        &self.calls
    }

    #[must_use]
    pub fn capture_requests(&self) -> Vec<&FileHandle> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                OsCall::Camera(CameraOperation::CaptureImage { output }) => Some(output),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn permission_dialogs(&self) -> usize {
        self.permission_dialogs
    }

    #[must_use]
    pub fn renders(&self) -> usize {
        self.renders
    }

    #[must_use]
    pub fn sent(&self) -> &[EmailMessage] {
        &self.sent
    }

    fn now(&self) -> NaiveDateTime {
        self.clock.unwrap_or_else(|| Local::now().naive_local())
    }

    fn camera(&mut self, operation: &CameraOperation) -> CameraResult {
        match operation {
            CameraOperation::CheckPermission => Ok(CameraOutput::Permission(
                PermissionStatus::from(self.permission_granted),
            )),
            CameraOperation::RequestPermission { request_code } => {
                self.permission_dialogs += 1;
                if self.grant_on_request {
                    self.permission_granted = true;
                }
                Ok(CameraOutput::PermissionResponse {
                    request_code: *request_code,
                    status: PermissionStatus::from(self.grant_on_request),
                })
            }
            CameraOperation::ResolveCaptureHandler => {
                Ok(CameraOutput::HandlerAvailable(self.camera_installed))
            }
            CameraOperation::CaptureImage { output } => self.run_camera_app(output),
        }
    }

    fn run_camera_app(&self, output: &FileHandle) -> CameraResult {
        if !self.camera_installed {
            return Err(CameraError::NoHandler);
        }
        if !self.permission_granted {
            return Err(CameraError::PermissionDenied);
        }
        if !output.is_writable() {
            return Err(CameraError::CaptureFailed {
                reason: "output handle is read-only".into(),
            });
        }

        let path = self
            .provider
            .resolve(output)
            .map_err(|e| CameraError::Internal {
                message: e.to_string(),
            })?;

        match self.capture {
            CaptureBehavior::Save => {
                fs::write(path.as_path(), PLACEHOLDER_JPEG).map_err(|e| {
                    CameraError::CaptureFailed {
                        reason: e.to_string(),
                    }
                })?;
                Ok(CameraOutput::Capture(CaptureOutcome::Saved))
            }
            CaptureBehavior::Cancel => Ok(CameraOutput::Capture(CaptureOutcome::Cancelled)),
            CaptureBehavior::Fail => Err(CameraError::CaptureFailed {
                reason: "camera app crashed".into(),
            }),
        }
    }

    fn files(&self, operation: &FileOperation) -> FileResult {
        match operation {
            FileOperation::CreateImageFile { directory, naming } => {
                self.create_image_file(*directory, naming)
            }
        }
    }

    /// `File.createTempFile` semantics: a fresh random number per attempt, and the
    /// file must not exist yet.
    fn create_image_file(&self, directory: StorageDirectory, naming: &ImageNaming) -> FileResult {
        let Some(dir) = &self.pictures_dir else {
            return Err(FileError::StorageUnavailable { directory });
        };
        fs::create_dir_all(dir).map_err(|e| FileError::io(&e))?;

        let now = self.now();
        let mut rng = rand::thread_rng();

        for _ in 0..MAX_CREATE_ATTEMPTS {
            let name = naming.file_name(now, u64::from(rng.gen::<u32>()));
            let candidate = dir.join(&name);

            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
            {
                Ok(mut file) => {
                    file.flush().map_err(|e| FileError::io(&e))?;
                    let path = fs::canonicalize(&candidate).unwrap_or(candidate);
                    debug!(path = %path.display(), "created image file");
                    return Ok(FileOutput::Created {
                        path: PhotoPath::new(path.to_string_lossy()),
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(FileError::io(&e)),
            }
        }

        Err(FileError::Io {
            message: "could not find an unused file name".into(),
        })
    }

    fn network(&self, operation: &NetworkOperation) -> NetworkResult {
        match operation {
            NetworkOperation::CheckConnectivity => Ok(NetworkOutput::from(self.connected)),
        }
    }

    fn mail(&mut self, operation: &MailOperation) -> MailResult {
        match operation {
            MailOperation::SendViaChooser { message, .. } => {
                if let Some(error) = &self.mail_failure {
                    return Err(error.clone());
                }
                self.sent.push(message.clone());
                Ok(MailOutput::ChooserShown)
            }
        }
    }
}

impl SimulatorError {
    fn resolve(operation: &'static str, error: impl std::fmt::Display) -> Self {
        Self::Resolve {
            operation,
            message: error.to_string(),
        }
    }
}

enum Work {
    Event(Event),
    Effect(Effect),
}

/// One app instance wired to a [`SimulatedOs`].
pub struct Session {
    app: AppTester<App, Effect>,
    model: Model,
    os: SimulatedOs,
}

impl Session {
    #[must_use]
    pub fn new(os: SimulatedOs) -> Self {
        Self::with_model(os, Model::default())
    }

    #[must_use]
    pub fn with_model(os: SimulatedOs, model: Model) -> Self {
        Self {
            app: AppTester::default(),
            model,
            os,
        }
    }

    /// Feeds `event` to the app and keeps resolving requests until the app is idle.
    pub fn dispatch(&mut self, event: Event) -> Result<(), SimulatorError> {
        let mut queue = VecDeque::from([Work::Event(event)]);

        while let Some(work) = queue.pop_front() {
            match work {
                Work::Event(event) => {
                    let update = self.app.update(event, &mut self.model);
                    queue.extend(update.events.into_iter().map(Work::Event));
                    queue.extend(update.effects.into_iter().map(Work::Effect));
                }
                Work::Effect(effect) => {
                    let update = self.resolve(effect)?;
                    if let Some((events, effects)) = update {
                        queue.extend(events.into_iter().map(Work::Event));
                        queue.extend(effects.into_iter().map(Work::Effect));
                    }
                }
            }
        }

        Ok(())
    }

    fn resolve(
        &mut self,
        effect: Effect,
    ) -> Result<Option<(Vec<Event>, Vec<Effect>)>, SimulatorError> {
        let update = match effect {
            Effect::Render(_) => {
                self.os.renders += 1;
                return Ok(None);
            }
            Effect::Camera(mut request) => {
                self.os.calls.push(OsCall::Camera(request.operation.clone()));
                let output = self.os.camera(&request.operation);
                self.app
                    .resolve(&mut request, output)
                    .map_err(|e| SimulatorError::resolve("camera", e))?
            }
            Effect::Files(mut request) => {
                self.os.calls.push(OsCall::Files(request.operation.clone()));
                let output = self.os.files(&request.operation);
                self.app
                    .resolve(&mut request, output)
                    .map_err(|e| SimulatorError::resolve("files", e))?
            }
            Effect::Network(mut request) => {
                self.os.calls.push(OsCall::Network(request.operation.clone()));
                let output = self.os.network(&request.operation);
                self.app
                    .resolve(&mut request, output)
                    .map_err(|e| SimulatorError::resolve("network", e))?
            }
            Effect::Mail(mut request) => {
                self.os.calls.push(OsCall::Mail(request.operation.clone()));
                let output = self.os.mail(&request.operation);
                self.app
                    .resolve(&mut request, output)
                    .map_err(|e| SimulatorError::resolve("mail", e))?
            }
        };

        Ok(Some((update.events, update.effects)))
    }

    #[must_use]
    pub fn model(&self) -> &Model {
        &self.model
    }

    #[must_use]
    pub fn view(&self) -> ViewModel {
        self.app.view(&self.model)
    }

    #[must_use]
    pub fn os(&self) -> &SimulatedOs {
        &self.os
    }

    pub fn os_mut(&mut self) -> &mut SimulatedOs {
        &mut self.os
    }
}
