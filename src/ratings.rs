//! Ratings stage: bounds users by id and caps ratings per user

use std::collections::HashMap;
use std::path::Path;

use csv::StringRecord;
use log::{debug, info, warn};

use crate::config::{FilterConfig, RATINGS_COLUMNS};
use crate::error::Result;
use crate::progress::StageProgress;
use crate::table::{file_name, TableSource, TableWriter};

const USER_ID: usize = 0;

/// Notices the first time userId goes backwards in the ratings feed.
#[derive(Debug, Default)]
struct UserOrder {
    previous: u64,
    regressed: bool,
}

impl UserOrder {
    /// Returns the previous userId the first time `user_id` is lower than it.
    fn observe(&mut self, user_id: u64) -> Option<u64> {
        let previous = self.previous;
        self.previous = user_id;
        if user_id < previous && !self.regressed {
            self.regressed = true;
            return Some(previous);
        }
        None
    }
}

/// Copy rows with `userId <= max_users` from `input` to `output`, keeping at
/// most `max_ratings_per_user` rows per user. Rows are emitted verbatim in
/// source order.
///
/// The source is assumed sorted by userId: the scan stops at the first row
/// past `max_users`. An out-of-order userId is reported once but not acted on.
pub fn build_filtered_ratings(
    input: &Path,
    output: &Path,
    config: &FilterConfig,
    progress: &mut StageProgress,
) -> Result<usize> {
    let mut source = TableSource::open(input, &RATINGS_COLUMNS)?;
    let mut writer = TableWriter::create(output, &RATINGS_COLUMNS)?;

    let mut ratings_count: HashMap<u64, usize> = HashMap::new();
    let mut order = UserOrder::default();
    let mut record = StringRecord::new();

    while source.read_row(&mut record)? {
        progress.row();
        let user_id = source.parse_id(&record, USER_ID, RATINGS_COLUMNS[USER_ID])?;

        if user_id > config.max_users {
            debug!(
                "Stopping ratings scan at line {}: userId {} exceeds {}",
                record.position().map_or(0, |p| p.line()),
                user_id,
                config.max_users
            );
            break;
        }

        if let Some(previous) = order.observe(user_id) {
            warn!(
                "{} is not sorted by userId (line {}: {} after {}); rows past the cutoff may be missed",
                file_name(source.path()),
                record.position().map_or(0, |p| p.line()),
                user_id,
                previous
            );
        }

        let count = ratings_count.entry(user_id).or_insert(0);
        *count += 1;
        if config.max_ratings_per_user.map_or(false, |max| *count > max) {
            continue;
        }

        writer.write_row((0..RATINGS_COLUMNS.len()).map(|n| source.field(&record, n).unwrap_or("")))?;
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

    fn run(input: &str, config: &FilterConfig) -> (usize, Vec<Vec<String>>) {
        let dir = TempDir::new().unwrap();
        let in_path = dir.path().join("ratings.csv");
        let out_path = dir.path().join("filtered_ratings.csv");
        fs::write(&in_path, input).unwrap();

        let kept =
            build_filtered_ratings(&in_path, &out_path, config, &mut StageProgress::hidden()).unwrap();
        let mut reader = csv::Reader::from_path(&out_path).unwrap();
        let rows = reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect();
        (kept, rows)
    }

    #[test]
    fn test_user_cutoff_and_per_user_cap() {
        let config = FilterConfig {
            max_users: 1,
            max_ratings_per_user: Some(1),
            ..FilterConfig::default()
        };
        let (kept, rows) = run(
            "userId,movieId,rating,timestamp\n1,10,4.0,100\n1,20,3.5,101\n2,10,5.0,102\n",
            &config,
        );

        assert_eq!(kept, 1);
        assert_eq!(rows, vec![vec!["1", "10", "4.0", "100"]]);
    }

    #[test]
    fn test_cap_skips_but_keeps_scanning_other_users() {
        let config = FilterConfig {
            max_users: 3,
            max_ratings_per_user: Some(2),
            ..FilterConfig::default()
        };
        let (kept, rows) = run(
            "userId,movieId,rating,timestamp\n1,1,4,1\n1,2,4,2\n1,3,4,3\n2,1,3,4\n3,5,2,5\n",
            &config,
        );

        assert_eq!(kept, 4);
        let users: Vec<&str> = rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(users, vec!["1", "1", "2", "3"]);
    }

    #[test]
    fn test_scan_stops_at_first_user_past_cutoff() {
        let config = FilterConfig {
            max_users: 2,
            max_ratings_per_user: None,
            ..FilterConfig::default()
        };
        let (kept, rows) = run(
            "userId,movieId,rating,timestamp\n1,10,4.0,100\n9,11,3.0,101\n1,12,5.0,102\n",
            &config,
        );

        assert_eq!(kept, 1);
        assert_eq!(rows, vec![vec!["1", "10", "4.0", "100"]]);
    }

    #[test]
    fn test_user_order_reports_first_regression_only() {
        let mut order = UserOrder::default();
        assert_eq!(order.observe(1), None);
        assert_eq!(order.observe(3), None);
        assert_eq!(order.observe(2), Some(3));
        assert_eq!(order.observe(5), None);
        assert_eq!(order.observe(1), None);
    }

    #[test]
    fn test_unsorted_rows_under_cutoff_still_filtered() {
        let config = FilterConfig {
            max_users: 5,
            max_ratings_per_user: Some(1),
            ..FilterConfig::default()
        };
        let (kept, rows) = run(
            "userId,movieId,rating,timestamp\n2,1,4,1\n1,2,4,2\n2,3,4,3\n",
            &config,
        );

        assert_eq!(kept, 2);
        let users: Vec<&str> = rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(users, vec!["2", "1"]);
    }

    #[test]
    fn test_uncapped_keeps_every_row_under_cutoff() {
        let config = FilterConfig {
            max_users: 10,
            max_ratings_per_user: None,
            ..FilterConfig::default()
        };
        let (kept, _) = run(
            "userId,movieId,rating,timestamp\n1,1,4,1\n1,2,4,2\n1,3,4,3\n",
            &config,
        );
        assert_eq!(kept, 3);
    }

    #[test]
    fn test_columns_reordered_in_source() {
        let config = FilterConfig::default();
        let (_, rows) = run("rating,timestamp,movieId,userId\n4.5,99,7,1\n", &config);
        assert_eq!(rows, vec![vec!["1", "7", "4.5", "99"]]);
    }

    #[test]
    fn test_malformed_user_id_is_fatal() {
        let dir = TempDir::new().unwrap();
        let in_path = dir.path().join("ratings.csv");
        let out_path = dir.path().join("filtered_ratings.csv");
        fs::write(&in_path, "userId,movieId,rating,timestamp\n1,1,4,1\nx,2,4,2\n").unwrap();

        let result = build_filtered_ratings(
            &in_path,
            &out_path,
            &FilterConfig::default(),
            &mut StageProgress::hidden(),
        );
        assert!(matches!(
            result,
            Err(crate::error::PipelineError::MalformedField { line: 3, .. })
        ));
        assert!(!out_path.exists());
    }
}
