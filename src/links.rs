//! Cross-reference stage: keeps link rows for allowed movies

use std::path::Path;

use csv::StringRecord;
use log::info;

use crate::config::LINKS_COLUMNS;
use crate::error::Result;
use crate::identifiers::AllowedMovies;
use crate::progress::StageProgress;
use crate::table::{file_name, TableSource, TableWriter};

pub fn build_links_filtered(
    input: &Path,
    output: &Path,
    allowed: &AllowedMovies,
    progress: &mut StageProgress,
) -> Result<usize> {
    let mut source = TableSource::open(input, &LINKS_COLUMNS)?;
    let mut writer = TableWriter::create(output, &LINKS_COLUMNS)?;
    let mut record = StringRecord::new();

    while source.read_row(&mut record)? {
        progress.row();
        let movie_id = source.parse_id(&record, 0, LINKS_COLUMNS[0])?;
        if allowed.contains(movie_id) {
            writer.write_row((0..LINKS_COLUMNS.len()).map(|n| source.field(&record, n).unwrap_or("")))?;
        }
    }

    let kept = writer.finish()?;
    progress.finish();
    info!("Wrote {} rows to {}", kept, file_name(output));
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_keeps_allowed_rows_verbatim_in_source_order() {
        let dir = TempDir::new().unwrap();
        let in_path = dir.path().join("links.csv");
        let out_path = dir.path().join("links_filtered.csv");
        fs::write(
            &in_path,
            "movieId,imdbId,tmdbId\n3,0114709,862\n2,0113497,8844\n1,0113228,\n",
        )
        .unwrap();

        let allowed: AllowedMovies = [1, 3].into_iter().collect();
        let kept = build_links_filtered(&in_path, &out_path, &allowed, &mut StageProgress::hidden()).unwrap();

        assert_eq!(kept, 2);
        let content = fs::read_to_string(&out_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec!["movieId,imdbId,tmdbId", "3,0114709,862", "1,0113228,"]);
    }
}
