//! Error types for the upload pipeline.
//!
//! `Display` carries the full detail and is only ever written to the log. What
//! the caller sees is `public_message()`, wrapped in the JSON `UploadResponse`.

use crate::services::masspay::parse::ParseError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use common::model::upload::UploadResponse;
use std::io;
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, MasspayError>;

/// Progress of a single upload request. Stages only move forward; a failure is
/// reported together with the last stage that was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    FormValidated,
    FilePersisted,
    Parsed,
    ArtifactBuilt,
    Responded,
}

#[derive(Debug, Error)]
pub enum MasspayError {
    /// The multipart body could not be read.
    #[error("multipart payload error: {0}")]
    Multipart(String),

    #[error("multipart payload has no file field")]
    MissingFile,

    #[error("uploaded file exceeds {limit} bytes")]
    FileTooLarge { limit: usize },

    #[error("execution date {0:?} is invalid or in the past")]
    InvalidDate(String),

    #[error("account identifier {0:?} failed validation")]
    InvalidAccountId(String),

    #[error("file name {0:?} does not match the batch naming pattern")]
    InvalidFilename(String),

    #[error("failed to create request directories: {0}")]
    Workspace(#[source] io::Error),

    #[error("failed to persist uploaded file: {0}")]
    Persist(#[source] io::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("failed to write artifact: {0}")]
    Artifact(#[source] io::Error),

    #[error("failed to serve artifact: {0}")]
    Respond(#[source] io::Error),

    #[error("processing task failed: {0}")]
    Task(String),
}

impl MasspayError {
    /// Last stage the request completed before this error stopped it.
    pub fn stage(&self) -> Stage {
        match self {
            MasspayError::Multipart(_)
            | MasspayError::MissingFile
            | MasspayError::FileTooLarge { .. }
            | MasspayError::InvalidDate(_)
            | MasspayError::InvalidAccountId(_)
            | MasspayError::InvalidFilename(_) => Stage::Received,
            MasspayError::Workspace(_) | MasspayError::Persist(_) | MasspayError::Task(_) => {
                Stage::FormValidated
            }
            MasspayError::Parse(_) => Stage::FilePersisted,
            MasspayError::Artifact(_) => Stage::Parsed,
            MasspayError::Respond(_) => Stage::ArtifactBuilt,
        }
    }

    /// Message safe to hand back to the caller.
    pub fn public_message(&self) -> &'static str {
        match self {
            MasspayError::Multipart(_) => "Error parsing multipart form",
            MasspayError::MissingFile => "Invalid file",
            MasspayError::FileTooLarge { .. } => "The uploaded file is too large",
            MasspayError::InvalidDate(_) => "The provided date is invalid or in the past",
            MasspayError::InvalidAccountId(_) => "Invalid IBAN format",
            MasspayError::InvalidFilename(_) => "Invalid file name format",
            MasspayError::Workspace(_) => "Failed to create directories",
            MasspayError::Persist(_) => "Failed to save input file",
            MasspayError::Parse(_)
            | MasspayError::Artifact(_)
            | MasspayError::Respond(_)
            | MasspayError::Task(_) => "Failed to process file",
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.stage() == Stage::Received
    }
}

impl ResponseError for MasspayError {
    fn status_code(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(UploadResponse::failure(self.public_message()))
    }
}
