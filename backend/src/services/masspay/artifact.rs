//! Builds the outgoing batch: one `OMPDP` header record followed by the
//! uploaded file exactly as it was received.

use crate::services::masspay::parse::ParseOutcome;
use log::{info, warn};
use rust_decimal::RoundingStrategy;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

const RECORD_TYPE: &str = "OMPDP";

/// The synthesized file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    pub header_line: String,
    /// Number of body bytes copied after the header.
    pub body_len: u64,
    pub path: PathBuf,
    pub file_name: String,
}

/// Formats the header record, including its trailing `;` and newline:
///
/// `OMPDP;{date};{account};;{COMPANY};{total:.2};{count};{checksum};`
pub fn build_header(date: &str, account_id: &str, company_name: &str, outcome: &ParseOutcome) -> String {
    let total = outcome
        .total_amount
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!(
        "{};{};{};;{};{:.2};{};{};\n",
        RECORD_TYPE,
        date,
        account_id,
        company_name.to_uppercase(),
        total,
        outcome.line_count,
        outcome.checksum
    )
}

/// Writes `header`, flushes it, then appends all of `body` and flushes again.
/// Returns the number of body bytes written.
pub fn write_artifact<W: Write, R: Read>(writer: W, header: &str, body: &mut R) -> io::Result<u64> {
    let mut writer = BufWriter::new(writer);
    writer.write_all(header.as_bytes())?;
    writer.flush()?;
    let copied = io::copy(body, &mut writer)?;
    writer.flush()?;
    Ok(copied)
}

/// Creates the artifact at `output_path` from the persisted upload at `input_path`.
///
/// A partially written artifact is removed before the error is returned.
pub fn build_artifact(
    output_path: &Path,
    input_path: &Path,
    date: &str,
    account_id: &str,
    company_name: &str,
    outcome: &ParseOutcome,
) -> io::Result<OutputArtifact> {
    let header_line = build_header(date, account_id, company_name, outcome);

    let result = File::open(input_path).and_then(|mut input| {
        let output = File::create(output_path)?;
        let body_len = write_artifact(&output, &header_line, &mut input)?;
        output.sync_all()?;
        Ok(body_len)
    });

    let body_len = match result {
        Ok(len) => len,
        Err(e) => {
            if let Err(cleanup) = fs::remove_file(output_path) {
                if cleanup.kind() != io::ErrorKind::NotFound {
                    warn!("Failed to remove partial artifact {}: {}", output_path.display(), cleanup);
                }
            }
            return Err(e);
        }
    };

    let file_name = output_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    info!("Artifact {} written ({} body bytes)", output_path.display(), body_len);

    Ok(OutputArtifact {
        header_line,
        body_len,
        path: output_path.to_path_buf(),
        file_name,
    })
}
