//! Filter caps, sanitization mode and dataset file layout

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::Deserialize;

pub const RATINGS_COLUMNS: [&str; 4] = ["userId", "movieId", "rating", "timestamp"];
pub const LINKS_COLUMNS: [&str; 3] = ["movieId", "imdbId", "tmdbId"];
pub const TAGS_COLUMNS: [&str; 4] = ["userId", "movieId", "tag", "timestamp"];
pub const MOVIES_COLUMNS: [&str; 3] = ["movieId", "title", "genres"];

fn default_max_users() -> u64 {
    50
}

fn default_max_movies() -> Option<usize> {
    Some(400)
}

fn default_max_tags_per_movie() -> Option<usize> {
    Some(30)
}

fn default_max_ratings_per_user() -> Option<usize> {
    Some(200)
}

fn default_ascii_only() -> bool {
    true
}

/// Caps and sanitization mode threaded through every stage.
///
/// A `None` cap disables that limit. In YAML, a missing key takes the
/// default and an explicit `null` disables the cap.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    /// Inclusive upper bound on retained userId.
    #[serde(default = "default_max_users")]
    pub max_users: u64,
    /// Cap on distinct movie ids; keeps the lowest N after sorting.
    #[serde(default = "default_max_movies")]
    pub max_movies: Option<usize>,
    #[serde(default = "default_max_tags_per_movie")]
    pub max_tags_per_movie: Option<usize>,
    #[serde(default = "default_max_ratings_per_user")]
    pub max_ratings_per_user: Option<usize>,
    #[serde(default = "default_ascii_only")]
    pub ascii_only: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_users: default_max_users(),
            max_movies: default_max_movies(),
            max_tags_per_movie: default_max_tags_per_movie(),
            max_ratings_per_user: default_max_ratings_per_user(),
            ascii_only: default_ascii_only(),
        }
    }
}

impl FilterConfig {
    /// Load caps from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML config: {}", path.display()))
    }
}

/// Command-line cap flags layered over the file or default configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct CapOverrides {
    #[arg(long, help = "Keep users with userId up to this value")]
    pub max_users: Option<u64>,
    #[arg(long, help = "Cap on distinct movies (lowest ids are kept)")]
    pub max_movies: Option<usize>,
    #[arg(long, help = "Cap on tag rows kept per movie")]
    pub max_tags_per_movie: Option<usize>,
    #[arg(long, help = "Cap on rating rows kept per user")]
    pub max_ratings_per_user: Option<usize>,
    #[arg(long, conflicts_with = "max_movies", help = "Disable the movie cap")]
    pub no_movie_cap: bool,
    #[arg(long, conflicts_with = "max_tags_per_movie", help = "Disable the per-movie tag cap")]
    pub no_tag_cap: bool,
    #[arg(long, conflicts_with = "max_ratings_per_user", help = "Disable the per-user rating cap")]
    pub no_rating_cap: bool,
    #[arg(long, help = "Keep non-ASCII characters in titles, genres and tags")]
    pub keep_unicode: bool,
}

impl FilterConfig {
    /// Apply flags on top of `self`. A flag that was not given leaves the
    /// existing value alone; `no_*_cap` clears a cap.
    pub fn apply_overrides(mut self, overrides: &CapOverrides) -> Self {
        if let Some(max_users) = overrides.max_users {
            self.max_users = max_users;
        }
        if overrides.max_movies.is_some() || overrides.no_movie_cap {
            self.max_movies = overrides.max_movies;
        }
        if overrides.max_tags_per_movie.is_some() || overrides.no_tag_cap {
            self.max_tags_per_movie = overrides.max_tags_per_movie;
        }
        if overrides.max_ratings_per_user.is_some() || overrides.no_rating_cap {
            self.max_ratings_per_user = overrides.max_ratings_per_user;
        }
        if overrides.keep_unicode {
            self.ascii_only = false;
        }
        self
    }
}

/// Where source tables are read from and filtered tables are written to.
#[derive(Debug, Clone)]
pub struct DatasetLayout {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl DatasetLayout {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: Option<PathBuf>) -> Self {
        let input_dir = input_dir.into();
        let output_dir = output_dir.unwrap_or_else(|| input_dir.clone());
        Self { input_dir, output_dir }
    }

    pub fn ratings(&self) -> PathBuf {
        self.input_dir.join("ratings.csv")
    }

    pub fn links(&self) -> PathBuf {
        self.input_dir.join("links.csv")
    }

    pub fn tags(&self) -> PathBuf {
        self.input_dir.join("tags.csv")
    }

    pub fn movies(&self) -> PathBuf {
        self.input_dir.join("movies.csv")
    }

    pub fn filtered_ratings(&self) -> PathBuf {
        self.output_dir.join("filtered_ratings.csv")
    }

    pub fn filtered_links(&self) -> PathBuf {
        self.output_dir.join("links_filtered.csv")
    }

    pub fn filtered_tags(&self) -> PathBuf {
        self.output_dir.join("tags_filtered.csv")
    }

    pub fn filtered_movies(&self) -> PathBuf {
        self.output_dir.join("movies_filtered.csv")
    }
}
