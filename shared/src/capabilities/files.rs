use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::file_provider::{ImageNaming, PhotoPath};

#[derive(Clone)]
pub struct Files<E> {
    context: CapabilityContext<FileOperation, E>,
}

impl<Ev> Capability<Ev> for Files<Ev> {
    type Operation = FileOperation;
    type MappedSelf<MappedEv> = Files<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Files::new(self.context.map_event(f))
    }
}

impl<E> Files<E>
where
    E: Send + 'static,
{
    pub fn new(context: CapabilityContext<FileOperation, E>) -> Self {
        Self { context }
    }

    /// Creates a new, empty, uniquely named file following `naming`.
    pub fn create_image_file<F>(&self, directory: StorageDirectory, naming: ImageNaming, callback: F)
    where
        F: FnOnce(FileResult) -> E + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context
                .request_from_shell(FileOperation::CreateImageFile { directory, naming })
                .await;
            context.update_app(callback(result));
        });
    }
}

/// App-private storage areas the shell knows how to locate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StorageDirectory {
    /// `getExternalFilesDir(DIRECTORY_PICTURES)` on Android.
    Pictures,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum FileOperation {
    CreateImageFile {
        directory: StorageDirectory,
        naming: ImageNaming,
    },
}

impl Operation for FileOperation {
    type Output = FileResult;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum FileOutput {
    Created { path: PhotoPath },
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum FileError {
    #[error("storage directory {directory:?} unavailable")]
    StorageUnavailable { directory: StorageDirectory },

    #[error("i/o error: {message}")]
    Io { message: String },
}

impl FileError {
    pub fn io(err: &std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

pub type FileResult = Result<FileOutput, FileError>;
