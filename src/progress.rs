//! Per-stage row spinners

use indicatif::{ProgressBar, ProgressStyle};

const TICK_EVERY: u64 = 10_000;

/// Spinner counting rows scanned by one stage.
pub struct StageProgress {
    bar: ProgressBar,
    scanned: u64,
}

impl StageProgress {
    pub fn new(stage: &str, enabled: bool) -> Self {
        let bar = if enabled {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {pos} rows scanned {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar.set_message(stage.to_string());
            bar
        } else {
            ProgressBar::hidden()
        };
        Self { bar, scanned: 0 }
    }

    pub fn hidden() -> Self {
        Self::new("", false)
    }

    pub fn row(&mut self) {
        self.scanned += 1;
        if self.scanned % TICK_EVERY == 0 {
            self.bar.set_position(self.scanned);
        }
    }

    pub fn finish(&self) {
        self.bar.set_position(self.scanned);
        self.bar.finish_and_clear();
    }
}
