//! Terminal progress bar fed by the scan engine.

use crate::scanner::ProgressSink;
use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}";

/// Draws scan progress on stderr.
pub struct ProgressBarSink {
    bar: ProgressBar,
}

impl ProgressBarSink {
    pub fn new(total_ports: usize) -> Self {
        let bar = ProgressBar::new(total_ports as u64);
        let style = ProgressStyle::default_bar()
            .template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        bar.set_style(style);
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressSink for ProgressBarSink {
    /// Workers report out of order, so the bar only ever moves forward.
    fn report(&self, completed: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(self.bar.position().max(completed as u64));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_moves_bar() {
        let sink = ProgressBarSink::new(100);
        sink.report(30, 100);
        assert_eq!(sink.bar.position(), 30);
        sink.finish();
        assert!(sink.bar.is_finished());
    }

    #[test]
    fn test_late_report_does_not_rewind() {
        let sink = ProgressBarSink::new(100);
        sink.report(30, 100);
        sink.report(20, 100);
        assert_eq!(sink.bar.position(), 30);
        sink.report(40, 100);
        assert_eq!(sink.bar.position(), 40);
    }
}
