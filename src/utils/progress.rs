//! Progress bar utilities

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a standard progress bar with consistent styling
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{msg} [{bar:40.cyan/blue}] {pos:>7}/{len:7} ({eta})")
    {
        pb.set_style(style.progress_chars("━━─"));
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Progress bar for `total` jobs, hidden when bars are disabled
pub fn job_progress(total: usize, message: &str, visible: bool) -> ProgressBar {
    if visible {
        create_progress_bar(total as u64, message)
    } else {
        let pb = ProgressBar::hidden();
        pb.set_length(total as u64);
        pb
    }
}
