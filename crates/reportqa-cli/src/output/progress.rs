//! Spinner shown while a long-running step is in flight

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle};
use std::time::Duration;

/// Spinner that clears itself when dropped
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// Start a spinner with `message`. Hidden when `visible` is false.
    pub fn spinner(message: impl Into<String>, visible: bool) -> Self {
        let inner = if visible {
            IndicatifBar::new_spinner()
        } else {
            IndicatifBar::hidden()
        };
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            inner.set_style(style);
        }
        inner.set_message(message.into());
        inner.enable_steady_tick(Duration::from_millis(100));
        Self { inner }
    }

    pub fn set_message(&self, message: impl Into<String>) {
        self.inner.set_message(message.into());
    }
}

impl Drop for ProgressBar {
    fn drop(&mut self) {
        if !self.inner.is_finished() {
            self.inner.finish_and_clear();
        }
    }
}
