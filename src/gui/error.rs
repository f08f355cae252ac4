use std::{error::Error, fmt::Display, sync::mpsc};

use crate::scene::SceneError;

/// Everything that can stop the dashboard.
#[derive(Debug)]
#[allow(missing_docs)]
pub enum TechtileGuiError {
    IOError(std::io::Error),
    SceneError(SceneError),
    MPSCSendError,
    JoinError,
}

impl Display for TechtileGuiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#?}", self)
    }
}

impl Error for TechtileGuiError {}

impl From<std::io::Error> for TechtileGuiError {
    fn from(value: std::io::Error) -> Self {
        Self::IOError(value)
    }
}

impl From<SceneError> for TechtileGuiError {
    fn from(value: SceneError) -> Self {
        Self::SceneError(value)
    }
}

impl<T> From<mpsc::SendError<T>> for TechtileGuiError {
    fn from(_: mpsc::SendError<T>) -> Self {
        Self::MPSCSendError
    }
}
