/// Instrumentation for the voxel sprite pipeline
/// Call counters are compiled in only with the `profiling` feature
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for the projector, rasterizer and coverage buffer
pub struct FunctionCounters {
    // Projector
    pub project_calls: AtomicU64,
    pub project_rejected: AtomicU64,

    // Rasterizer
    pub render_calls: AtomicU64,
    pub render_skipped_empty_mip: AtomicU64,
    pub slabs_visited: AtomicU64,
    pub fill_box_calls: AtomicU64,
    pub fill_box_rejected_depth: AtomicU64,
    pub column_fills: AtomicU64,
    pub pixels_filled: AtomicU64,

    // Coverage buffer
    pub spans_inserted: AtomicU64,
    pub spans_merged: AtomicU64,
    pub coverage_clears: AtomicU64,
}

impl FunctionCounters {
    pub const fn new() -> Self {
        Self {
            project_calls: AtomicU64::new(0),
            project_rejected: AtomicU64::new(0),
            render_calls: AtomicU64::new(0),
            render_skipped_empty_mip: AtomicU64::new(0),
            slabs_visited: AtomicU64::new(0),
            fill_box_calls: AtomicU64::new(0),
            fill_box_rejected_depth: AtomicU64::new(0),
            column_fills: AtomicU64::new(0),
            pixels_filled: AtomicU64::new(0),
            spans_inserted: AtomicU64::new(0),
            spans_merged: AtomicU64::new(0),
            coverage_clears: AtomicU64::new(0),
        }
    }

    fn all(&self) -> [&AtomicU64; 12] {
        [
            &self.project_calls,
            &self.project_rejected,
            &self.render_calls,
            &self.render_skipped_empty_mip,
            &self.slabs_visited,
            &self.fill_box_calls,
            &self.fill_box_rejected_depth,
            &self.column_fills,
            &self.pixels_filled,
            &self.spans_inserted,
            &self.spans_merged,
            &self.coverage_clears,
        ]
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        for counter in self.all() {
            counter.store(0, Ordering::Relaxed);
        }
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            project_calls: self.project_calls.load(Ordering::Relaxed),
            project_rejected: self.project_rejected.load(Ordering::Relaxed),
            render_calls: self.render_calls.load(Ordering::Relaxed),
            render_skipped_empty_mip: self.render_skipped_empty_mip.load(Ordering::Relaxed),
            slabs_visited: self.slabs_visited.load(Ordering::Relaxed),
            fill_box_calls: self.fill_box_calls.load(Ordering::Relaxed),
            fill_box_rejected_depth: self.fill_box_rejected_depth.load(Ordering::Relaxed),
            column_fills: self.column_fills.load(Ordering::Relaxed),
            pixels_filled: self.pixels_filled.load(Ordering::Relaxed),
            spans_inserted: self.spans_inserted.load(Ordering::Relaxed),
            spans_merged: self.spans_merged.load(Ordering::Relaxed),
            coverage_clears: self.coverage_clears.load(Ordering::Relaxed),
        }
    }
}

impl Default for FunctionCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of counter values at a point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub project_calls: u64,
    pub project_rejected: u64,
    pub render_calls: u64,
    pub render_skipped_empty_mip: u64,
    pub slabs_visited: u64,
    pub fill_box_calls: u64,
    pub fill_box_rejected_depth: u64,
    pub column_fills: u64,
    pub pixels_filled: u64,
    pub spans_inserted: u64,
    pub spans_merged: u64,
    pub coverage_clears: u64,
}

impl CounterSnapshot {
    /// Log a formatted report at debug level
    pub fn log_report(&self) {
        log::debug!("=== Voxel Pipeline Counters ===");
        log::debug!(
            "projector: calls={} rejected={}",
            self.project_calls,
            self.project_rejected
        );
        log::debug!(
            "rasterizer: renders={} empty_mip={} slabs={}",
            self.render_calls,
            self.render_skipped_empty_mip,
            self.slabs_visited
        );
        log::debug!(
            "fill: boxes={} depth_rejected={} columns={} pixels={}",
            self.fill_box_calls,
            self.fill_box_rejected_depth,
            self.column_fills,
            self.pixels_filled
        );
        if self.fill_box_calls > 0 {
            let reject_rate =
                (self.fill_box_rejected_depth as f64 / self.fill_box_calls as f64) * 100.0;
            log::debug!("fill depth reject rate: {:.2}%", reject_rate);
        }
        log::debug!(
            "coverage: inserts={} merges={} clears={}",
            self.spans_inserted,
            self.spans_merged,
            self.coverage_clears
        );
    }
}

/// Global function counters instance
pub static FUNCTION_COUNTERS: FunctionCounters = FunctionCounters::new();

/// Macro for incrementing a counter (only when profiling feature is enabled)
#[macro_export]
macro_rules! count_call {
    ($counter:expr) => {
        #[cfg(feature = "profiling")]
        {
            $counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        }
    };
}

/// Macro for adding to a counter (only when profiling feature is enabled)
#[macro_export]
macro_rules! count_add {
    ($counter:expr, $value:expr) => {
        #[cfg(feature = "profiling")]
        {
            $counter.fetch_add($value as u64, std::sync::atomic::Ordering::Relaxed);
        }
    };
}
