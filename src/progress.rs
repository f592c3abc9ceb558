use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

const BAR_TEMPLATE: &str = "* {msg}: {percent:>3}% [{bar:50.green}]";
const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg}";

/// Progress bar on stderr, or a hidden one when `visible` is false.
pub fn bar(len: u64, message: &'static str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::with_draw_target(Some(len), ProgressDrawTarget::stderr());
    if let Ok(style) = ProgressStyle::with_template(BAR_TEMPLATE) {
        bar.set_style(style.progress_chars("=> "));
    }
    bar.set_message(message);
    bar
}

pub fn spinner(message: &'static str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template(SPINNER_TEMPLATE) {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_when_not_visible() {
        assert!(bar(10, "sampling", false).is_hidden());
        assert!(spinner("scanning", false).is_hidden());
    }

    #[test]
    fn test_bar_tracks_length() {
        let progress = bar(10, "sampling", false);
        progress.inc(3);
        assert_eq!(progress.position(), 3);
    }
}
