//! Header checks run before a stage touches its input

use std::fs::File;
use std::path::Path;

use csv::{Reader, ReaderBuilder, StringRecord};

use crate::error::{PipelineError, Result};

/// Positions of the required columns within a table's header, in the order
/// the columns were requested.
#[derive(Debug, Clone)]
pub struct ColumnIndex {
    positions: Vec<usize>,
}

impl ColumnIndex {
    /// Position of the `n`th required column.
    pub fn position(&self, n: usize) -> usize {
        self.positions[n]
    }
}

/// Confirm `path` exists and its header names every column in `required`.
/// Extra columns are allowed and order is irrelevant. Returns the reader
/// positioned after the header.
pub fn ensure_file_with_columns(
    path: &Path,
    required: &[&str],
) -> Result<(Reader<File>, ColumnIndex)> {
    if !path.is_file() {
        return Err(PipelineError::MissingSource {
            path: path.to_path_buf(),
        });
    }

    let mut reader = ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();
    let columns = resolve_columns(path, &headers, required)?;
    Ok((reader, columns))
}

fn resolve_columns(
    path: &Path,
    headers: &StringRecord,
    required: &[&str],
) -> Result<ColumnIndex> {
    let mut positions = Vec::with_capacity(required.len());
    let mut missing = Vec::new();

    for column in required {
        match headers.iter().position(|h| h == *column) {
            Some(pos) => positions.push(pos),
            None => missing.push(column.to_string()),
        }
    }

    if !missing.is_empty() {
        return Err(PipelineError::MissingColumns {
            path: path.to_path_buf(),
            missing,
            found: headers.iter().map(str::to_string).collect(),
        });
    }

    Ok(ColumnIndex { positions })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_source() {
        let result = ensure_file_with_columns(Path::new("/nonexistent/ratings.csv"), &["userId"]);
        assert!(matches!(result, Err(PipelineError::MissingSource { .. })));
    }

    #[test]
    fn test_missing_columns_reports_found() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "movieId,title").unwrap();

        let result = ensure_file_with_columns(file.path(), &["movieId", "title", "genres"]);
        match result {
            Err(PipelineError::MissingColumns { missing, found, .. }) => {
                assert_eq!(missing, vec!["genres".to_string()]);
                assert_eq!(found, vec!["movieId".to_string(), "title".to_string()]);
            }
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_extra_and_reordered_columns_allowed() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "genres,extra,title,movieId").unwrap();

        let (_, index) = ensure_file_with_columns(file.path(), &["movieId", "title", "genres"]).unwrap();
        assert_eq!(index.position(0), 3);
        assert_eq!(index.position(1), 2);
        assert_eq!(index.position(2), 0);
    }
}
