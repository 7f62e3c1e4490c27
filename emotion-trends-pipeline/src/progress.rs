// logs instead of drawing a bar, so the output stays readable when stderr is not a tty
use {
    std::time::{Duration, Instant},
    tracing::info,
};

pub struct Progress {
    message: String,
    started_at: Instant,
    reported_at: Instant,
    report_every: Duration,
    total_processed: u64,
}

impl Progress {
    pub fn new(message: String) -> Self {
        Self::with_interval(message, Duration::from_secs(5))
    }

    pub fn with_interval(message: String, report_every: Duration) -> Self {
        Self {
            message,
            started_at: Instant::now(),
            reported_at: Instant::now(),
            report_every,
            total_processed: 0,
        }
    }

    pub fn update(&mut self) -> bool {
        self.update_by(1)
    }

    /// Returns true when a progress line was logged.
    pub fn update_by(&mut self, processed: u64) -> bool {
        self.total_processed += processed;

        let now = Instant::now();
        if now - self.reported_at >= self.report_every {
            self.reported_at = now;
            info!("{}: {} total ({:.2}/second)", self.message, self.total_processed, self.rate(now));
            true
        } else {
            false
        }
    }

    pub fn total_processed(&self) -> u64 {
        self.total_processed
    }

    pub fn finish(self) {
        let now = Instant::now();
        info!(
            "{}: done, {} total in {:.2}s ({:.2}/second)",
            self.message,
            self.total_processed,
            (now - self.started_at).as_secs_f32(),
            self.rate(now),
        );
    }

    fn rate(&self, now: Instant) -> f32 {
        let elapsed = (now - self.started_at).as_secs_f32();
        if elapsed > 0.0 {
            (self.total_processed as f32) / elapsed
        } else {
            0.0
        }
    }
}
