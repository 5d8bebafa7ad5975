//! Progress bar for the deactivation batch
//!
//! The bar is drawn on stderr only when stderr is a terminal and the caller
//! asked for it. A hidden bar still tracks its position, so callers and tests
//! can read how many users were processed either way.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}";

/// Options for the batch bar
#[derive(Debug, Clone, Copy)]
pub struct ProgressConfig {
    /// Draw the bar at all
    pub enable_progress_bar: bool,
    /// Spinner tick interval
    pub tick_interval: Duration,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enable_progress_bar: true,
            tick_interval: Duration::from_millis(120),
        }
    }
}

/// Whether a bar would actually be drawn
pub fn should_draw(config: &ProgressConfig) -> bool {
    config.enable_progress_bar && atty::is(atty::Stream::Stderr)
}

/// Bar sized for `total` users
pub fn batch_progress_bar(total: u64, config: &ProgressConfig) -> ProgressBar {
    if !should_draw(config) {
        let bar = ProgressBar::hidden();
        bar.set_length(total);
        return bar;
    }

    let bar = ProgressBar::new(total);
    match ProgressStyle::default_bar().template(BAR_TEMPLATE) {
        Ok(style) => bar.set_style(style.progress_chars("##-")),
        Err(e) => tracing::debug!("Progress bar template error: {}", e),
    }
    bar.set_message("Deactivating users");
    bar.enable_steady_tick(config.tick_interval);
    bar
}

/// Stop the bar, leaving the final state on screen
pub fn finish(bar: &ProgressBar) {
    if !bar.is_hidden() {
        bar.finish_with_message("Done!");
    }
}
