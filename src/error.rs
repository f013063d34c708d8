use serde::Serialize;
use thiserror::Error;

/// Failure kinds surfaced by the session container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UserNotFound,
    InvalidCredentials,
    EmailTaken,
    InvalidAge,
    NoActiveSession,
    NoImage,
    UpdateFailed,
    UploadFailed,
    BackendError,
}

/// Typed result of a failed container operation. The `Display` text is the
/// human-readable message shown to the user.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("user not found")]
    UserNotFound,
    #[error("incorrect password")]
    InvalidCredentials,
    #[error("an account with this email already exists")]
    EmailTaken,
    #[error("invalid age: {0:?}")]
    InvalidAge(String),
    #[error("no active session")]
    NoActiveSession,
    #[error("no image provided")]
    NoImage,
    #[error("failed to update profile: {0}")]
    UpdateFailed(String),
    #[error("failed to upload image: {0}")]
    UploadFailed(String),
    #[error("backend error: {0}")]
    Backend(String),
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UserNotFound => ErrorKind::UserNotFound,
            Self::InvalidCredentials => ErrorKind::InvalidCredentials,
            Self::EmailTaken => ErrorKind::EmailTaken,
            Self::InvalidAge(_) => ErrorKind::InvalidAge,
            Self::NoActiveSession => ErrorKind::NoActiveSession,
            Self::NoImage => ErrorKind::NoImage,
            Self::UpdateFailed(_) => ErrorKind::UpdateFailed,
            Self::UploadFailed(_) => ErrorKind::UploadFailed,
            Self::Backend(_) => ErrorKind::BackendError,
        }
    }

    // `{:#}` keeps the anyhow context chain in one line.
    pub(crate) fn backend(err: anyhow::Error) -> Self {
        Self::Backend(format!("{err:#}"))
    }

    pub(crate) fn update_failed(err: anyhow::Error) -> Self {
        Self::UpdateFailed(format!("{err:#}"))
    }

    pub(crate) fn upload_failed(err: anyhow::Error) -> Self {
        Self::UploadFailed(format!("{err:#}"))
    }
}
