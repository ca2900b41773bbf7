//! Tag stage: membership filter, per-movie cap and tag text sanitization

use std::collections::HashMap;
use std::path::Path;

use csv::StringRecord;
use log::info;

use crate::config::TAGS_COLUMNS;
use crate::error::Result;
use crate::identifiers::AllowedMovies;
use crate::progress::StageProgress;
use crate::sanitize::Sanitizer;
use crate::table::{file_name, TableSource, TableWriter};

const MOVIE_ID: usize = 1;
const TAG: usize = 2;

/// Keep tags of allowed movies, at most `max_tags_per_movie` per movie.
///
/// Rows for movies outside `allowed` are dropped before counting, so they
/// never use up a movie's quota.
pub fn build_tags_filtered(
    input: &Path,
    output: &Path,
    allowed: &AllowedMovies,
    max_tags_per_movie: Option<usize>,
    sanitizer: Sanitizer,
    progress: &mut StageProgress,
) -> Result<usize> {
    let mut source = TableSource::open(input, &TAGS_COLUMNS)?;
    let mut writer = TableWriter::create(output, &TAGS_COLUMNS)?;

    let mut tags_count: HashMap<u64, usize> = HashMap::new();
    let mut record = StringRecord::new();

    while source.read_row(&mut record)? {
        progress.row();
        let movie_id = source.parse_id(&record, MOVIE_ID, TAGS_COLUMNS[MOVIE_ID])?;
        if !allowed.contains(movie_id) {
            continue;
        }

        let count = tags_count.entry(movie_id).or_insert(0);
        *count += 1;
        if max_tags_per_movie.map_or(false, |max| *count > max) {
            continue;
        }

        let tag = sanitizer.sanitize(source.field(&record, TAG));
        writer.write_row([
            source.field(&record, 0).unwrap_or(""),
            source.field(&record, MOVIE_ID).unwrap_or(""),
            tag.as_str(),
            source.field(&record, 3).unwrap_or(""),
        ])?;
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

    fn run(input: &str, allowed: &[u64], cap: Option<usize>, ascii_only: bool) -> Vec<Vec<String>> {
        let dir = TempDir::new().unwrap();
        let in_path = dir.path().join("tags.csv");
        let out_path = dir.path().join("tags_filtered.csv");
        fs::write(&in_path, input).unwrap();

        let allowed: AllowedMovies = allowed.iter().copied().collect();
        build_tags_filtered(
            &in_path,
            &out_path,
            &allowed,
            cap,
            Sanitizer::new(ascii_only),
            &mut StageProgress::hidden(),
        )
        .unwrap();

        let mut reader = csv::Reader::from_path(&out_path).unwrap();
        reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_sanitizes_tag_text() {
        let rows = run(
            "userId,movieId,tag,timestamp\n1,3,café,100\n1,1,good,101\n",
            &[1, 3],
            None,
            true,
        );
        assert_eq!(rows[0], vec!["1", "3", "caf", "100"]);
        assert_eq!(rows[1], vec!["1", "1", "good", "101"]);
    }

    #[test]
    fn test_keeps_unicode_when_disabled() {
        let rows = run("userId,movieId,tag,timestamp\n1,3,café,100\n", &[3], None, false);
        assert_eq!(rows[0][2], "café");
    }

    #[test]
    fn test_cap_per_movie() {
        let rows = run(
            "userId,movieId,tag,timestamp\n1,3,a,1\n2,3,b,2\n3,3,c,3\n1,1,d,4\n",
            &[1, 3],
            Some(2),
            true,
        );
        let tags: Vec<&str> = rows.iter().map(|r| r[2].as_str()).collect();
        assert_eq!(tags, vec!["a", "b", "d"]);
    }

    #[test]
    fn test_disallowed_rows_do_not_count_toward_cap() {
        let rows = run(
            "userId,movieId,tag,timestamp\n1,7,x,1\n1,7,y,2\n1,1,a,3\n2,1,b,4\n",
            &[1],
            Some(2),
            true,
        );
        let tags: Vec<&str> = rows.iter().map(|r| r[2].as_str()).collect();
        assert_eq!(tags, vec!["a", "b"]);
    }

    #[test]
    fn test_short_row_tag_becomes_empty() {
        let rows = run("userId,movieId,tag,timestamp\n1,1\n", &[1], None, true);
        assert_eq!(rows[0], vec!["1", "1", "", ""]);
    }
}
