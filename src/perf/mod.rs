/// Performance measurement utilities
/// Each rendering stage can be timed and logged for optimization analysis
pub mod profiling;

pub use profiling::{CounterSnapshot, FunctionCounters, FUNCTION_COUNTERS};

use std::time::{Duration, Instant};

pub struct PerfTimer {
    name: &'static str,
    start: Instant,
}

impl PerfTimer {
    #[inline]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
        }
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for PerfTimer {
    fn drop(&mut self) {
        log::debug!("[PERF] {}: {}μs", self.name, self.elapsed().as_micros());
    }
}

/// Per-frame timing accumulator for the voxel sprite stages
#[derive(Debug, Default, Clone, Copy)]
pub struct PerfStats {
    pub projection_us: f64,
    pub rasterization_us: f64,
    pub present_us: f64,
    pub total_us: f64,
}

impl PerfStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn share(&self, part: f64) -> f64 {
        if self.total_us > 0.0 {
            (part / self.total_us) * 100.0
        } else {
            0.0
        }
    }

    pub fn log_summary(&self) {
        log::info!(
            "projection {:.2}μs ({:.1}%) | raster {:.2}μs ({:.1}%) | present {:.2}μs ({:.1}%) | total {:.2}μs",
            self.projection_us,
            self.share(self.projection_us),
            self.rasterization_us,
            self.share(self.rasterization_us),
            self.present_us,
            self.share(self.present_us),
            self.total_us
        );
    }
}

/// Macro for easy performance measurement
#[macro_export]
macro_rules! perf_scope {
    ($name:expr) => {
        let _timer = $crate::perf::PerfTimer::new($name);
    };
}
