//! Runs the five stages in order and collects what each one wrote

use std::fs;
use std::path::PathBuf;

use log::{debug, info};

use crate::config::{DatasetLayout, FilterConfig};
use crate::error::Result;
use crate::identifiers::{load_ids_from_filtered_ratings, AllowedMovies};
use crate::links::build_links_filtered;
use crate::movies::build_movies_filtered;
use crate::progress::StageProgress;
use crate::ratings::build_filtered_ratings;
use crate::sanitize::Sanitizer;
use crate::table::{fingerprint, file_name};
use crate::tags::build_tags_filtered;

#[derive(Debug, Clone)]
pub struct StageReport {
    pub name: &'static str,
    pub path: PathBuf,
    pub rows_written: usize,
    pub sha256: String,
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub users: usize,
    pub allowed_movies: AllowedMovies,
    pub stages: Vec<StageReport>,
}

fn stage_report(name: &'static str, path: PathBuf, rows_written: usize) -> Result<StageReport> {
    let sha256 = fingerprint(&path)?;
    debug!("{} sha256 {}", file_name(&path), sha256);
    Ok(StageReport {
        name,
        path,
        rows_written,
        sha256,
    })
}

/// Regenerate every filtered table under `layout.output_dir`.
///
/// Stops at the first error; tables of later stages are not written.
pub fn run_pipeline(
    layout: &DatasetLayout,
    config: &FilterConfig,
    show_progress: bool,
) -> Result<PipelineReport> {
    fs::create_dir_all(&layout.output_dir)?;
    let sanitizer = Sanitizer::new(config.ascii_only);
    let mut stages = Vec::with_capacity(4);

    info!("Filtering ratings (userId <= {})", config.max_users);
    let ratings_out = layout.filtered_ratings();
    let kept = build_filtered_ratings(
        &layout.ratings(),
        &ratings_out,
        config,
        &mut StageProgress::new("ratings", show_progress),
    )?;
    stages.push(stage_report("ratings", ratings_out.clone(), kept)?);

    let ids = load_ids_from_filtered_ratings(
        &ratings_out,
        config.max_movies,
        &mut StageProgress::new("identifiers", show_progress),
    )?;
    let allowed = ids.movie_ids;

    let links_out = layout.filtered_links();
    let kept = build_links_filtered(
        &layout.links(),
        &links_out,
        &allowed,
        &mut StageProgress::new("links", show_progress),
    )?;
    stages.push(stage_report("links", links_out, kept)?);

    let tags_out = layout.filtered_tags();
    let kept = build_tags_filtered(
        &layout.tags(),
        &tags_out,
        &allowed,
        config.max_tags_per_movie,
        sanitizer,
        &mut StageProgress::new("tags", show_progress),
    )?;
    stages.push(stage_report("tags", tags_out, kept)?);

    let movies_out = layout.filtered_movies();
    let kept = build_movies_filtered(
        &layout.movies(),
        &movies_out,
        &allowed,
        sanitizer,
        &mut StageProgress::new("movies", show_progress),
    )?;
    stages.push(stage_report("movies", movies_out, kept)?);

    Ok(PipelineReport {
        users: ids.user_ids.len(),
        allowed_movies: allowed,
        stages,
    })
}
