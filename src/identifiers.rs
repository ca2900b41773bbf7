//! Derives the user and movie id universes from the filtered ratings

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use csv::StringRecord;
use log::info;

use crate::config::RATINGS_COLUMNS;
use crate::error::Result;
use crate::progress::StageProgress;
use crate::table::{file_name, TableSource};

/// Movie ids the downstream filters are allowed to keep. Fixed for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedMovies(BTreeSet<u64>);

impl AllowedMovies {
    pub fn contains(&self, movie_id: u64) -> bool {
        self.0.contains(&movie_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Ids in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<u64> for AllowedMovies {
    fn from_iter<T: IntoIterator<Item = u64>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Distinct ids found in the filtered ratings.
#[derive(Debug, Clone)]
pub struct IdentifierSets {
    pub user_ids: HashSet<u64>,
    pub movie_ids: AllowedMovies,
}

/// Cap `movie_ids` to the lowest `max_movies` values. Independent of the
/// order ids were discovered in.
pub fn cap_movie_ids(movie_ids: BTreeSet<u64>, max_movies: Option<usize>) -> AllowedMovies {
    match max_movies {
        Some(max) if movie_ids.len() > max => AllowedMovies(movie_ids.into_iter().take(max).collect()),
        _ => AllowedMovies(movie_ids),
    }
}

/// Read the filtered ratings table and collect its user and movie ids.
pub fn load_ids_from_filtered_ratings(
    path: &Path,
    max_movies: Option<usize>,
    progress: &mut StageProgress,
) -> Result<IdentifierSets> {
    let mut source = TableSource::open(path, &RATINGS_COLUMNS)?;

    let mut user_ids = HashSet::new();
    let mut movie_ids = BTreeSet::new();
    let mut record = StringRecord::new();

    while source.read_row(&mut record)? {
        progress.row();
        user_ids.insert(source.parse_id(&record, 0, RATINGS_COLUMNS[0])?);
        movie_ids.insert(source.parse_id(&record, 1, RATINGS_COLUMNS[1])?);
    }
    progress.finish();

    let movie_ids = cap_movie_ids(movie_ids, max_movies);
    info!(
        "Found {} users and {} movies in {}",
        user_ids.len(),
        movie_ids.len(),
        file_name(path)
    );

    Ok(IdentifierSets { user_ids, movie_ids })
}
