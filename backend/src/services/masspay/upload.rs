//! `POST /masspay/api/upload`: validate the form, persist the batch, parse it
//! and answer with the generated artifact.
//!
//! Stages run strictly in order and stop at the first failure:
//!
//! 1. Read the multipart body into an `UploadForm` (the file is held in memory,
//!    bounded by `AppConfig::max_upload_bytes`).
//! 2. Validate execution date, account identifier and file name. Nothing has
//!    been written to disk yet, so a rejected form leaves no trace.
//! 3. On the blocking pool: create the request workspace, persist the upload,
//!    re-open and parse it, write the artifact. Any error here drops the
//!    workspace, which removes the whole directory tree.
//! 4. Answer `200` with the full artifact as an `application/octet-stream`
//!    attachment.

use crate::config::AppConfig;
use crate::error::{MasspayError, Result, Stage};
use crate::services::masspay::artifact::{build_artifact, OutputArtifact};
use crate::services::masspay::parse::{parse_lines, ParseError, RecordLayout};
use crate::services::masspay::validate::{
    convert_date, validate_account_id, validate_execution_date, validate_filename, DateFormat,
};
use crate::services::masspay::workspace::RequestWorkspace;
use actix_multipart::Multipart;
use actix_web::http::header::{ContentDisposition, ContentType, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse};
use common::requests::{COMPANY_NAME_FIELD, EXECUTION_DATE_FIELD, FILE_FIELD, IBAN_FIELD};
use futures_util::StreamExt;
use log::{debug, error, info, warn};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

/// Raw multipart fields as received.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file_name: Option<String>,
    pub content: Option<Vec<u8>>,
    pub execution_date: String,
    pub iban: String,
    pub company_name: String,
}

/// A form that passed every check, with the header date already converted.
#[derive(Debug)]
pub struct ValidatedUpload {
    pub file_name: String,
    pub content: Vec<u8>,
    /// Execution date as `DDMMYYYY`.
    pub header_date: String,
    pub account_id: String,
    pub company_name: String,
}

impl UploadForm {
    pub fn validate(self) -> Result<ValidatedUpload> {
        let content = self.content.ok_or(MasspayError::MissingFile)?;

        if !validate_execution_date(&self.execution_date) {
            return Err(MasspayError::InvalidDate(self.execution_date));
        }
        let header_date = convert_date(&self.execution_date, DateFormat::Long)
            .ok_or_else(|| MasspayError::InvalidDate(self.execution_date.clone()))?;

        if !validate_account_id(&self.iban) {
            return Err(MasspayError::InvalidAccountId(self.iban));
        }

        let file_name = self.file_name.unwrap_or_default();
        if !validate_filename(&file_name) {
            return Err(MasspayError::InvalidFilename(file_name));
        }

        Ok(ValidatedUpload {
            file_name,
            content,
            header_date,
            account_id: self.iban,
            company_name: self.company_name,
        })
    }
}

/// Actix handler. Errors are turned into the JSON `UploadResponse` by
/// `MasspayError`'s `ResponseError` impl after being logged here.
pub async fn process(
    payload: Multipart,
    config: web::Data<AppConfig>,
) -> std::result::Result<HttpResponse, MasspayError> {
    info!("Starting file upload");

    let result = match upload_batch(payload, config.get_ref()).await {
        Ok(artifact) => serve_artifact(&artifact).await,
        Err(e) => Err(e),
    };

    match &result {
        Ok(_) => debug!("Upload reached stage {:?}", Stage::Responded),
        Err(e) if e.is_client_error() => warn!("Upload rejected: {}", e),
        Err(e) => error!("Upload failed after stage {:?}: {}", e.stage(), e),
    }
    result
}

/// Runs the whole pipeline and returns the artifact written to disk.
pub async fn upload_batch(payload: Multipart, config: &AppConfig) -> Result<OutputArtifact> {
    let form = read_form(payload, config.max_upload_bytes).await?;
    let upload = form.validate()?;
    debug!("Upload of {} reached stage {:?}", upload.file_name, Stage::FormValidated);

    let temp_root = config.temp_root.clone();
    let layout = config.layout.clone();
    tokio::task::spawn_blocking(move || process_upload(upload, &temp_root, &layout))
        .await
        .map_err(|e| MasspayError::Task(e.to_string()))?
}

/// Blocking part of the pipeline, from workspace creation to the finished artifact.
pub fn process_upload(
    upload: ValidatedUpload,
    temp_root: &Path,
    layout: &RecordLayout,
) -> Result<OutputArtifact> {
    let workspace = RequestWorkspace::create(temp_root).map_err(MasspayError::Workspace)?;

    let input_path = workspace
        .persist_input(&upload.file_name, &upload.content)
        .map_err(MasspayError::Persist)?;
    debug!("Stage {:?}: {}", Stage::FilePersisted, input_path.display());

    let input = File::open(&input_path).map_err(ParseError::from)?;
    let outcome = parse_lines(BufReader::new(input), layout)?;
    debug!("Stage {:?}: {} lines", Stage::Parsed, outcome.line_count);

    let artifact = build_artifact(
        &workspace.output_path(&upload.file_name),
        &input_path,
        &upload.header_date,
        &upload.account_id,
        &upload.company_name,
        &outcome,
    )
    .map_err(MasspayError::Artifact)?;

    let dir = workspace.keep();
    info!(
        "Stage {:?}: {} in {}",
        Stage::ArtifactBuilt,
        artifact.file_name,
        dir.display()
    );
    Ok(artifact)
}

/// Collects the multipart fields. Unknown fields are ignored, like the text
/// fields a browser might add.
pub async fn read_form(mut payload: Multipart, max_file_bytes: usize) -> Result<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| MasspayError::Multipart(e.to_string()))?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        match name.as_deref() {
            Some(FILE_FIELD) => {
                form.file_name = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename().map(|f| f.to_string()));

                let mut bytes = Vec::new();
                while let Some(chunk) = field.next().await {
                    let chunk = chunk.map_err(|e| MasspayError::Multipart(e.to_string()))?;
                    if bytes.len() + chunk.len() > max_file_bytes {
                        return Err(MasspayError::FileTooLarge {
                            limit: max_file_bytes,
                        });
                    }
                    bytes.extend_from_slice(&chunk);
                }
                form.content = Some(bytes);
            }
            Some(EXECUTION_DATE_FIELD) => form.execution_date = read_text(&mut field).await?,
            Some(IBAN_FIELD) => form.iban = read_text(&mut field).await?,
            Some(COMPANY_NAME_FIELD) => form.company_name = read_text(&mut field).await?,
            _ => {}
        }
    }

    Ok(form)
}

/// Text fields are short; anything beyond this is not a form value.
const MAX_TEXT_FIELD_BYTES: usize = 4096;

async fn read_text(field: &mut actix_multipart::Field) -> Result<String> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| MasspayError::Multipart(e.to_string()))?;
        if bytes.len() + chunk.len() > MAX_TEXT_FIELD_BYTES {
            return Err(MasspayError::Multipart("text field too long".to_string()));
        }
        bytes.extend_from_slice(&chunk);
    }
    String::from_utf8(bytes).map_err(|_| MasspayError::Multipart("text field is not valid UTF-8".to_string()))
}

/// Sends the finished artifact as a plain `200` attachment. The bytes are
/// read on the blocking pool; `Range` and conditional headers are ignored so
/// the caller always receives the whole batch.
async fn serve_artifact(artifact: &OutputArtifact) -> Result<HttpResponse> {
    let path = artifact.path.clone();
    let bytes = tokio::task::spawn_blocking(move || fs::read(path))
        .await
        .map_err(|e| MasspayError::Task(e.to_string()))?
        .map_err(MasspayError::Respond)?;

    Ok(HttpResponse::Ok()
        .content_type(ContentType::octet_stream())
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(artifact.file_name.clone())],
        })
        .body(bytes))
}
