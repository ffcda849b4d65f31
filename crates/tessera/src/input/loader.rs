//! CSV/TSV loading into datasets, with delimiter detection.
//!
//! File parsing sits outside the validation engine; this loader exists so
//! callers (the CLI, tests) can turn delimited files into [`Dataset`]s.
//! Every cell is kept as a string and empty cells become `null`; numeric
//! coercion is left to the scalar parsers.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Read};
use std::path::Path;

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{Result, TesseraError};

use super::record::{Dataset, Entity, Record};
use super::source::SourceMetadata;

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Loader configuration.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
    /// Quote character.
    pub quote: u8,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            max_rows: None,
            quote: b'"',
        }
    }
}

/// Loads delimited files into datasets.
pub struct CsvLoader {
    config: LoaderConfig,
}

impl CsvLoader {
    /// Create a new loader with default configuration.
    pub fn new() -> Self {
        Self {
            config: LoaderConfig::default(),
        }
    }

    /// Create a loader with custom configuration.
    pub fn with_config(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Load a file as the given entity.
    pub fn load_file(
        &self,
        entity: Entity,
        path: impl AsRef<Path>,
    ) -> Result<(Dataset, SourceMetadata)> {
        let path = path.as_ref();

        let mut file = File::open(path).map_err(|e| TesseraError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)
            .map_err(|e| TesseraError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        let hash = format!("sha256:{:x}", hasher.finalize());

        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => detect_delimiter(&contents, self.config.quote)?,
        };

        let dataset = self.parse_bytes(&contents, delimiter)?;

        let format = match delimiter {
            b'\t' => "tsv",
            b',' => "csv",
            b';' => "csv-semicolon",
            b'|' => "psv",
            _ => "delimited",
        }
        .to_string();

        let metadata = SourceMetadata::new(
            entity,
            path.to_path_buf(),
            hash,
            contents.len() as u64,
            format,
            dataset.len(),
            dataset.headers.len(),
        );

        tracing::debug!(
            entity = %entity,
            rows = dataset.len(),
            columns = dataset.headers.len(),
            "loaded {}",
            metadata.file
        );

        Ok((dataset, metadata))
    }

    /// Parse delimited bytes into a dataset.
    pub fn parse_bytes(&self, bytes: &[u8], delimiter: u8) -> Result<Dataset> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|s| s.trim().to_string())
            .collect();

        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(TesseraError::EmptyData("No columns found".to_string()));
        }

        let mut rows = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            if let Some(max) = self.config.max_rows {
                if row_idx >= max {
                    break;
                }
            }

            let record = result?;
            let mut row = Record::with_capacity(headers.len());
            for (i, header) in headers.iter().enumerate() {
                let cell = record.get(i).unwrap_or("");
                let value = if cell.trim().is_empty() {
                    Value::Null
                } else {
                    Value::String(cell.to_string())
                };
                row.insert(header.clone(), value);
            }
            rows.push(row);
        }

        Ok(Dataset::new(headers, rows))
    }
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Write a dataset back out as a delimited file.
pub fn write_delimited(dataset: &Dataset, path: impl AsRef<Path>, delimiter: u8) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| TesseraError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }

    let file = File::create(path).map_err(|e| TesseraError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(BufWriter::new(file));

    writer.write_record(&dataset.headers)?;
    for row in &dataset.rows {
        let cells: Vec<String> = dataset
            .headers
            .iter()
            .map(|h| row.get(h).map(cell_text).unwrap_or_default())
            .collect();
        writer.write_record(&cells)?;
    }
    writer.flush().map_err(|e| TesseraError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

/// Render a cell for delimited output.
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Lines sampled when sniffing the delimiter.
const SNIFF_LINES: usize = 10;

/// Pick the delimiter that splits the sampled lines most regularly.
///
/// Candidates are ranked by: same field count on every sampled line, then
/// the header's separator count, then tab over the rest. Separators inside
/// `quote`-delimited cells are not counted, so a quoted `"[1,2]"` does not
/// make a tab file look comma-separated.
fn detect_delimiter(bytes: &[u8], quote: u8) -> Result<u8> {
    let sample: Vec<String> = BufReader::new(bytes)
        .lines()
        .map_while(|line| line.ok())
        .filter(|line| !line.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();

    let Some(header) = sample.first() else {
        return Err(TesseraError::EmptyData("No lines to analyze".to_string()));
    };

    let best = DELIMITERS
        .iter()
        .copied()
        .filter_map(|delim| {
            let width = separators_outside_quotes(header, delim, quote);
            if width == 0 {
                return None;
            }
            let regular = sample
                .iter()
                .all(|line| separators_outside_quotes(line, delim, quote) == width);
            Some(((regular, width, delim == b'\t'), delim))
        })
        .max_by_key(|(rank, _)| *rank)
        .map(|(_, delim)| delim);

    Ok(best.unwrap_or(b','))
}

/// Separators in `line` that sit outside quoted cells.
fn separators_outside_quotes(line: &str, delimiter: u8, quote: u8) -> usize {
    line.bytes()
        .scan(false, |quoted, byte| {
            if byte == quote {
                *quoted = !*quoted;
            }
            Some(byte == delimiter && !*quoted)
        })
        .filter(|&is_separator| is_separator)
        .count()
}
