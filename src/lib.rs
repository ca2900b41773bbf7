//! Reduces the MovieLens ratings, links, tags and movies tables to a bounded,
//! reproducible and optionally ASCII-only subset sharing one movie id universe.

pub mod config;
pub mod error;
pub mod identifiers;
pub mod links;
pub mod movies;
pub mod pipeline;
pub mod progress;
pub mod ratings;
pub mod sanitize;
pub mod table;
pub mod tags;
pub mod validate;

pub use config::{CapOverrides, DatasetLayout, FilterConfig};
pub use error::{PipelineError, Result};
pub use identifiers::AllowedMovies;
pub use pipeline::{run_pipeline, PipelineReport, StageReport};
