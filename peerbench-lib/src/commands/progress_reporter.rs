use crate::facts::Progress;
use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// How often a revealed bar redraws its elapsed time.
const TICK_INTERVAL: Duration = Duration::from_millis(100);

const TEMPLATE: &str = "{prefix:>12.bold.cyan} [{bar:25}] {pos}/{len} requests ({elapsed})";
const TEMPLATE_NO_COLOR: &str = "{prefix:>12} [{bar:25}] {pos}/{len} requests ({elapsed})";

/// Batch progress on stderr that stays hidden until a run outlasts `delay`.
///
/// Quick batches finish before the bar ever appears, so they print nothing but their report.
#[derive(Debug)]
pub struct ProgressReporter {
    bar: ProgressBar,
    revealed: Arc<AtomicBool>,
    reveal_task: JoinHandle<()>,
}

impl ProgressReporter {
    /// Create a hidden progress bar. Requires a tokio runtime.
    ///
    /// When `use_colors` is false, the bar is rendered without ANSI styling.
    #[must_use]
    pub fn new(delay: Duration, use_colors: bool) -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::hidden());
        let template = if use_colors { TEMPLATE } else { TEMPLATE_NO_COLOR };
        bar.set_style(
            ProgressStyle::with_template(template)
                .expect("could not create progress bar style")
                .progress_chars("=> "),
        );

        let revealed = Arc::new(AtomicBool::new(false));

        Self {
            reveal_task: tokio::spawn(reveal_after(bar.clone(), Arc::clone(&revealed), delay)),
            bar,
            revealed,
        }
    }
}

impl Progress for ProgressReporter {
    fn set_phase(&self, phase: &str) {
        self.bar.set_prefix(phase.to_string());
    }

    fn start(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
    }

    fn update(&self, completed: u64) {
        self.bar.set_position(completed);
    }

    fn done(&self) {
        self.reveal_task.abort();
        if self.revealed.load(Ordering::Relaxed) {
            self.bar.finish_and_clear();
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.reveal_task.abort();
    }
}

/// Wait out `delay`, then draw the bar to stderr and keep its elapsed time fresh.
async fn reveal_after(bar: ProgressBar, revealed: Arc<AtomicBool>, delay: Duration) {
    tokio::time::sleep(delay).await;

    bar.set_draw_target(ProgressDrawTarget::stderr_with_hz(10));
    revealed.store(true, Ordering::Relaxed);

    let mut ticks = tokio::time::interval(TICK_INTERVAL);
    #[expect(clippy::infinite_loop, reason = "task runs until aborted")]
    loop {
        let _ = ticks.tick().await;
        bar.tick();
    }
}
