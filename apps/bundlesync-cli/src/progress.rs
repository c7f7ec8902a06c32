use bundlesync::{format_size, Progress};
use indicatif::{ProgressBar, ProgressStyle};

/// Terminal progress bar fed by the updater's worker thread.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) =
            ProgressStyle::with_template("{msg} [{bar:40}] {bytes}/{total_bytes} ({eta})")
        {
            bar.set_style(style.progress_chars("=>-"));
        }
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Progress for BarProgress {
    fn set_text(&self, text: &str) {
        self.bar.set_message(text.to_string());
    }

    fn set_detail(&self, detail: &str) {
        self.bar.println(detail);
    }

    fn set_bytes(&self, done: u64, total: Option<u64>) {
        match total {
            Some(n) => self.bar.set_length(n),
            // unknown length: keep the bar just ahead of the count
            None => self.bar.set_length(done.max(1)),
        }
        self.bar.set_position(done);
        if done == 0 {
            tracing::debug!("package size {}", format_size(total));
        }
    }
}
