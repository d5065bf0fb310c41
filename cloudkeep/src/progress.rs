use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

pub struct ExportProgress {
    bar: ProgressBar,
    exported: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
    start: Instant,
}

impl ExportProgress {
    pub fn new(total: u64) -> Self {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}) ETA: {eta}"
            )
            .unwrap()
            .progress_chars("#>-"),
        );

        Self {
            bar,
            exported: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            start: Instant::now(),
        }
    }

    pub fn inc(&self, count: u64) {
        self.exported.fetch_add(count, Ordering::Relaxed);
        self.bar.inc(count);
    }

    pub fn inc_skipped(&self, count: u64) {
        self.skipped.fetch_add(count, Ordering::Relaxed);
        self.bar.inc(count);
    }

    pub fn inc_failed(&self, count: u64) {
        self.failed.fetch_add(count, Ordering::Relaxed);
        self.bar.inc(count);
    }

    pub fn finish(&self) {
        let exported = self.exported.load(Ordering::Relaxed);
        let skipped = self.skipped.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        let elapsed = self.start.elapsed();

        self.bar.finish_with_message(format!(
            "Done! Exported {} objects in {:.1}s ({} skipped, {} failed)",
            exported,
            elapsed.as_secs_f64(),
            skipped,
            failed
        ));
    }

    pub fn exported(&self) -> u64 {
        self.exported.load(Ordering::Relaxed)
    }

    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}
