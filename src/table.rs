//! CSV table readers and writers shared by every stage

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Reader, StringRecord, Writer, WriterBuilder};
use log::{debug, warn};
use sha2::{Digest, Sha256};

use crate::error::{PipelineError, Result};
use crate::validate::{ensure_file_with_columns, ColumnIndex};

/// An opened source table whose header has been checked.
pub struct TableSource {
    path: PathBuf,
    reader: Reader<File>,
    columns: ColumnIndex,
}

impl TableSource {
    /// Open `path` and resolve the `required` columns in its header.
    pub fn open(path: &Path, required: &[&str]) -> Result<Self> {
        let (reader, columns) = ensure_file_with_columns(path, required)?;
        Ok(Self {
            path: path.to_path_buf(),
            reader,
            columns,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the next data row into `record`. Returns false at end of input.
    pub fn read_row(&mut self, record: &mut StringRecord) -> Result<bool> {
        Ok(self.reader.read_record(record)?)
    }

    /// Value of the `n`th required column, `None` if the row is too short.
    pub fn field<'r>(&self, record: &'r StringRecord, n: usize) -> Option<&'r str> {
        record.get(self.columns.position(n))
    }

    /// Parse the `n`th required column as an integer identifier.
    pub fn parse_id(&self, record: &StringRecord, n: usize, column: &str) -> Result<u64> {
        let raw = self.field(record, n).unwrap_or("");
        raw.trim()
            .parse::<u64>()
            .map_err(|_| PipelineError::MalformedField {
                path: self.path.clone(),
                line: record.position().map_or(0, |p| p.line()),
                column: column.to_string(),
                value: raw.to_string(),
            })
    }
}

/// A `.partial` file that is removed on drop unless committed.
struct PartialFile {
    partial_path: PathBuf,
    path: PathBuf,
    committed: bool,
}

impl PartialFile {
    fn commit(mut self) -> Result<()> {
        fs::rename(&self.partial_path, &self.path)?;
        self.committed = true;
        debug!("Moved {} into place", self.path.display());
        Ok(())
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(e) = fs::remove_file(&self.partial_path) {
            warn!(
                "Failed to remove partial output {}: {}",
                self.partial_path.display(),
                e
            );
        }
    }
}

/// Writes a filtered table to a `.partial` sibling and moves it into place on
/// `finish`. If dropped unfinished, or if `finish` fails, the partial file is
/// removed.
pub struct TableWriter {
    writer: Writer<File>,
    partial: PartialFile,
    rows_written: usize,
}

impl TableWriter {
    pub fn create(path: &Path, header: &[&str]) -> Result<Self> {
        let mut partial_name: OsString = path.as_os_str().to_owned();
        partial_name.push(".partial");
        let partial = PartialFile {
            partial_path: PathBuf::from(partial_name),
            path: path.to_path_buf(),
            committed: false,
        };

        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Necessary)
            .from_path(&partial.partial_path)?;
        writer.write_record(header)?;

        Ok(Self {
            writer,
            partial,
            rows_written: 0,
        })
    }

    pub fn write_row<I, T>(&mut self, row: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.writer.write_record(row)?;
        self.rows_written += 1;
        Ok(())
    }

    /// Flush, close and rename into place. Returns the data rows written.
    pub fn finish(self) -> Result<usize> {
        let TableWriter {
            mut writer,
            partial,
            rows_written,
        } = self;
        writer.flush()?;
        drop(writer);
        partial.commit()?;
        Ok(rows_written)
    }
}

/// SHA-256 hex digest of a written artifact.
pub fn fingerprint(path: &Path) -> Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    std::io::copy(&mut reader, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
