//! Coordinator-owned progress state and its terminal bar.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

const BAR_TEMPLATE: &str =
    "{msg} {bar:40.cyan/blue} {pos}/{len} [{elapsed_precise}<{eta_precise}, {per_sec}]";

/// Progress over one batch: completed count out of a known total.
///
/// Only the engine's collection loop updates it. The count never decreases
/// and never exceeds the total.
#[derive(Debug)]
pub struct BatchProgress {
    total: usize,
    completed: usize,
    bar: ProgressBar,
}

impl BatchProgress {
    /// Creates progress for `total` items; draws a bar on stderr when `visible`.
    #[must_use]
    pub fn new(total: usize, visible: bool) -> Self {
        let bar = if visible {
            let bar = ProgressBar::with_draw_target(
                Some(total as u64),
                ProgressDrawTarget::stderr(),
            );
            bar.set_style(
                ProgressStyle::with_template(BAR_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar.set_message("Downloading images...");
            bar.enable_steady_tick(Duration::from_millis(200));
            bar
        } else {
            ProgressBar::hidden()
        };
        Self {
            total,
            completed: 0,
            bar,
        }
    }

    /// Records one finished item.
    pub fn advance(&mut self) {
        if self.completed < self.total {
            self.completed += 1;
            self.bar.inc(1);
        }
    }

    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.completed == self.total
    }

    /// Leaves the fully rendered bar on screen.
    pub fn finish(&self) {
        self.bar.finish();
    }
}
