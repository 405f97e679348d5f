//! Mass payment batch upload.
//!
//! Registered routes:
//!
//! - `POST /masspay/api/upload`: multipart form with `file`, `executionDate`,
//!   `iban` and `companyName`. On success the response body is the generated
//!   batch (header record + original file) sent as an attachment. Rejected
//!   forms get `400` and processing failures `500`, both with a JSON
//!   `UploadResponse` body.
//!
//! Sub-modules, in pipeline order: `validate`, `workspace`, `parse`,
//! `artifact`, with `upload` driving them.

use actix_web::web::{post, scope};
use actix_web::Scope;

pub mod artifact;
pub mod parse;
pub mod upload;
pub mod validate;
pub mod workspace;

const API_PATH: &str = "/masspay/api";

/// Configures and returns the Actix scope for the mass payment routes.
pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/upload", post().to(upload::process))
}
