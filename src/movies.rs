//! Metadata stage: keeps movie rows for allowed movies, sanitizing text

use std::path::Path;

use csv::StringRecord;
use log::info;

use crate::config::MOVIES_COLUMNS;
use crate::error::Result;
use crate::identifiers::AllowedMovies;
use crate::progress::StageProgress;
use crate::sanitize::Sanitizer;
use crate::table::{file_name, TableSource, TableWriter};

/// Title and genres go through `sanitizer`; movieId is re-emitted in its
/// parsed integer form. Titles with commas or quotes are quoted on output.
pub fn build_movies_filtered(
    input: &Path,
    output: &Path,
    allowed: &AllowedMovies,
    sanitizer: Sanitizer,
    progress: &mut StageProgress,
) -> Result<usize> {
    let mut source = TableSource::open(input, &MOVIES_COLUMNS)?;
    let mut writer = TableWriter::create(output, &MOVIES_COLUMNS)?;
    let mut record = StringRecord::new();

    while source.read_row(&mut record)? {
        progress.row();
        let movie_id = source.parse_id(&record, 0, MOVIES_COLUMNS[0])?;
        if !allowed.contains(movie_id) {
            continue;
        }
        writer.write_row([
            movie_id.to_string(),
            sanitizer.sanitize(source.field(&record, 1)),
            sanitizer.sanitize(source.field(&record, 2)),
        ])?;
    }

    let kept = writer.finish()?;
    progress.finish();
    info!("Wrote {} rows to {}", kept, file_name(output));
    Ok(kept)
}
