//! Simple profiling counters for the per-tick hot paths
//!
//! Lightweight timing without changing function signatures. Enable with the
//! environment variable TRON_PROFILE=1 or `[profiling] enabled = true`.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

/// Profiled code paths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    FloodFill,
    PathSearch,
    Evaluation,
    Tick,
}

const CATEGORY_COUNT: usize = 4;

impl Category {
    fn index(self) -> usize {
        match self {
            Category::FloodFill => 0,
            Category::PathSearch => 1,
            Category::Evaluation => 2,
            Category::Tick => 3,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Category::FloodFill => "Flood Fill",
            Category::PathSearch => "A* Search",
            Category::Evaluation => "Move Evaluation",
            Category::Tick => "Whole Tick",
        }
    }
}

static ENABLED_BY_CONFIG: AtomicBool = AtomicBool::new(false);

static TIME_NS: [AtomicU64; CATEGORY_COUNT] = [
    AtomicU64::new(0),
    AtomicU64::new(0),
    AtomicU64::new(0),
    AtomicU64::new(0),
];
static CALLS: [AtomicUsize; CATEGORY_COUNT] = [
    AtomicUsize::new(0),
    AtomicUsize::new(0),
    AtomicUsize::new(0),
    AtomicUsize::new(0),
];

/// Turns profiling on from configuration, in addition to TRON_PROFILE
pub fn set_enabled(enabled: bool) {
    ENABLED_BY_CONFIG.store(enabled, Ordering::Relaxed);
}

#[inline]
pub fn is_profiling_enabled() -> bool {
    ENABLED_BY_CONFIG.load(Ordering::Relaxed) || std::env::var("TRON_PROFILE").is_ok()
}

pub struct ProfileGuard {
    start: Instant,
    category: Category,
}

impl ProfileGuard {
    pub fn new(category: Category) -> Option<Self> {
        if is_profiling_enabled() {
            Some(ProfileGuard {
                start: Instant::now(),
                category,
            })
        } else {
            None
        }
    }
}

impl Drop for ProfileGuard {
    fn drop(&mut self) {
        let elapsed_ns = self.start.elapsed().as_nanos() as u64;
        let idx = self.category.index();
        TIME_NS[idx].fetch_add(elapsed_ns, Ordering::Relaxed);
        CALLS[idx].fetch_add(1, Ordering::Relaxed);
    }
}

/// Accumulated (calls, nanoseconds) for one category
pub fn snapshot(category: Category) -> (usize, u64) {
    let idx = category.index();
    (
        CALLS[idx].load(Ordering::Relaxed),
        TIME_NS[idx].load(Ordering::Relaxed),
    )
}

pub fn print_report() {
    if !is_profiling_enabled() {
        return;
    }

    eprintln!("\n═══════════════════════════════════════════════════════════");
    eprintln!("                 PERFORMANCE PROFILE");
    eprintln!("═══════════════════════════════════════════════════════════");

    for category in [
        Category::Tick,
        Category::Evaluation,
        Category::FloodFill,
        Category::PathSearch,
    ] {
        let (calls, time_ns) = snapshot(category);
        let ms = time_ns as f64 / 1_000_000.0;
        let avg_us = if calls > 0 {
            time_ns as f64 / (calls * 1000) as f64
        } else {
            0.0
        };
        eprintln!(
            "{:<16} {:>10.2}ms  {:>8} calls  {:>10.2}µs avg",
            category.label(),
            ms,
            calls,
            avg_us
        );
    }

    eprintln!("═══════════════════════════════════════════════════════════\n");
}

pub fn reset() {
    for idx in 0..CATEGORY_COUNT {
        TIME_NS[idx].store(0, Ordering::Relaxed);
        CALLS[idx].store(0, Ordering::Relaxed);
    }
}

#[macro_export]
macro_rules! profile {
    ($category:expr, $code:block) => {{
        let _guard = $crate::simple_profiler::ProfileGuard::new($category);
        $code
    }};
}
