//! Streaming parser for fixed-width payment batch files.
//!
//! Each line is NFC-normalized and measured in code points. Overlong lines are
//! skipped with a warning; every other line must carry a decimal amount at the
//! position given by `RecordLayout`, otherwise the whole file is rejected.

use log::{debug, info, warn};
use rust_decimal::Decimal;
use std::io::{self, BufRead};
use std::ops::Range;
use std::str::FromStr;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

/// Character positions of the fields the parser reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLayout {
    /// Lines longer than this (in code points, after normalization) are skipped.
    pub max_line_chars: usize,
    /// Half-open code point range holding the amount.
    pub amount: Range<usize>,
}

impl RecordLayout {
    pub const MAX_LINE_CHARS: usize = 108;
    pub const AMOUNT: Range<usize> = 23..36;

    /// The amount field of `line`, with surrounding and internal spaces removed.
    /// Lines shorter than the field yield whatever part of it they contain.
    pub fn amount_field(&self, line: &str) -> String {
        line.chars()
            .skip(self.amount.start)
            .take(self.amount.len())
            .collect::<String>()
            .trim()
            .replace(' ', "")
    }
}

impl Default for RecordLayout {
    fn default() -> Self {
        Self {
            max_line_chars: Self::MAX_LINE_CHARS,
            amount: Self::AMOUNT,
        }
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    /// The input could not be read, or was not valid UTF-8.
    #[error("failed while reading the file: {0}")]
    Read(#[from] io::Error),

    /// A line of acceptable length carried a non-numeric amount.
    #[error("failed to parse amount {field:?} on line {line}")]
    Amount { line: usize, field: String },
}

/// Aggregates collected over the accepted lines of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutcome {
    pub line_count: u64,
    pub total_amount: Decimal,
    /// FNV-1a 32 of `accepted_content`, as 8 uppercase hex digits.
    pub checksum: String,
    /// Normalized accepted lines, concatenated without separators.
    pub accepted_content: Vec<u8>,
}

/// 32-bit FNV-1a.
#[derive(Debug, Clone, Copy)]
pub struct Fnv1a32(u32);

impl Fnv1a32 {
    const OFFSET_BASIS: u32 = 0x811C_9DC5;
    const PRIME: u32 = 0x0100_0193;

    pub fn new() -> Self {
        Fnv1a32(Self::OFFSET_BASIS)
    }

    pub fn update(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= u32::from(b);
            self.0 = self.0.wrapping_mul(Self::PRIME);
        }
    }

    pub fn finish(&self) -> u32 {
        self.0
    }

    /// `finish()` as zero-padded uppercase hex.
    pub fn hex(&self) -> String {
        format!("{:08X}", self.0)
    }
}

impl Default for Fnv1a32 {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads every line of `reader` and aggregates the accepted ones.
pub fn parse_lines<R: BufRead>(reader: R, layout: &RecordLayout) -> Result<ParseOutcome, ParseError> {
    let mut line_count = 0u64;
    let mut total_amount = Decimal::ZERO;
    let mut accepted_content = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line: String = line?.nfc().collect();
        let length = line.chars().count();
        debug!("Processed line {} length: {}", line_no, length);

        if length > layout.max_line_chars {
            warn!(
                "Skipped line {} due to incorrect length: {} (max {})",
                line_no, length, layout.max_line_chars
            );
            continue;
        }

        let field = layout.amount_field(&line);
        let amount = Decimal::from_str(&field).map_err(|e| {
            warn!("Failed to parse amount {:?} on line {}: {}", field, line_no, e);
            ParseError::Amount {
                line: line_no,
                field: field.clone(),
            }
        })?;

        total_amount += amount;
        line_count += 1;
        accepted_content.extend_from_slice(line.as_bytes());
    }

    let mut hasher = Fnv1a32::new();
    hasher.update(&accepted_content);
    let checksum = hasher.hex();

    info!(
        "Total lines processed: {}, total amount: {:.2}, hash: {}",
        line_count, total_amount, checksum
    );

    Ok(ParseOutcome {
        line_count,
        total_amount,
        checksum,
        accepted_content,
    })
}
