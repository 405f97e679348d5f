//! Mass payment batch service: accepts a fixed-width payment file over HTTP,
//! validates the accompanying form, and returns the batch prefixed with an
//! `OMPDP` header record.

pub mod config;
pub mod error;
pub mod logging;
pub mod services;

pub use config::AppConfig;
pub use error::{MasspayError, Result, Stage};
