//! Allocation accounting for the end of run memory report.
//!
//! The binary installs [`CountingAlloc`] as its global allocator; library
//! users that do not will simply read zeros.

use std::alloc::{GlobalAlloc, Layout, System};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering::Relaxed};

pub struct CountingAlloc {
    current: AtomicUsize,
    peak: AtomicUsize,
    total: AtomicUsize,
    count: AtomicUsize,
}

impl CountingAlloc {
    pub const fn new() -> Self {
        CountingAlloc {
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
            count: AtomicUsize::new(0),
        }
    }

    fn add(&self, size: usize) {
        let current = self.current.fetch_add(size, Relaxed) + size;
        self.peak.fetch_max(current, Relaxed);
        self.total.fetch_add(size, Relaxed);
        self.count.fetch_add(1, Relaxed);
    }

    fn sub(&self, size: usize) {
        self.current.fetch_sub(size, Relaxed);
    }

    pub fn usage(&self) -> MemUsage {
        MemUsage {
            current: self.current.load(Relaxed),
            peak: self.peak.load(Relaxed),
            total: self.total.load(Relaxed),
            allocations: self.count.load(Relaxed),
        }
    }
}

impl Default for CountingAlloc {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ret = System.alloc(layout);
        if !ret.is_null() {
            self.add(layout.size());
        }
        ret
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ret = System.alloc_zeroed(layout);
        if !ret.is_null() {
            self.add(layout.size());
        }
        ret
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
        self.sub(layout.size());
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let ret = System.realloc(ptr, layout, new_size);
        if !ret.is_null() {
            self.sub(layout.size());
            self.add(new_size);
        }
        ret
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemUsage {
    /// bytes live right now
    pub current: usize,
    /// high water mark of `current`
    pub peak: usize,
    /// bytes ever allocated
    pub total: usize,
    pub allocations: usize,
}

impl fmt::Display for MemUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Alloc = {}\tTotalAlloc = {}\tPeak = {}\tNumAlloc = {}",
            mem_metric_digit(self.current, 4),
            mem_metric_digit(self.total, 4),
            mem_metric_digit(self.peak, 4),
            self.allocations
        )
    }
}

/// Format bytes into human readable units with up to `sig` significant digits.
/// Example: mem_metric_digit(1024,4) => "    1 KB"
pub fn mem_metric_digit(v: usize, sig: usize) -> String {
    if v > usize::MAX / 2 {
        return format!("{:>width$}", "unknown", width = sig + 3);
    }
    const METRIC: [&str; 7] = ["B ", "KB", "MB", "GB", "TB", "PB", "EB"];
    let mut value = v as f64;
    let mut unit = METRIC[0];
    for m in METRIC {
        unit = m;
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
    }
    let mut s = format!("{}", value);
    s.truncate(sig + 1);
    if s.ends_with('.') {
        s.pop();
    }
    format!("{:>width$} {}", s, unit, width = sig + 1)
}
