mod camera;
mod files;
mod mail;
mod network;

pub use self::camera::{
    CameraError, CameraOperation, CameraOutput, CameraResult, CaptureOutcome, PermissionStatus,
};
pub use self::files::{FileError, FileOperation, FileOutput, FileResult, StorageDirectory};
pub use self::mail::{EmailMessage, MailError, MailOperation, MailOutput, MailResult};
pub use self::network::{NetworkError, NetworkOperation, NetworkOutput, NetworkResult};

pub use crux_core::render::Render;

use crate::app::App;
use crate::event::Event;

pub type AppRender = Render<Event>;
pub type AppCamera = camera::Camera<Event>;
pub type AppFiles = files::Files<Event>;
pub type AppNetwork = network::Network<Event>;
pub type AppMail = mail::Mail<Event>;

#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("File error: {0}")]
    Files(#[from] FileError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Mail error: {0}")]
    Mail(#[from] MailError),
}

#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub render: Render<Event>,
    pub camera: camera::Camera<Event>,
    pub files: files::Files<Event>,
    pub network: network::Network<Event>,
    pub mail: mail::Mail<Event>,
}
