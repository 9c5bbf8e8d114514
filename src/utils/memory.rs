//! System memory sampling for the reporter's safety valve.

use sysinfo::System;

/// Fraction of total system memory above which training aborts. The valve
/// exists because an oversized replay buffer will otherwise grow until the
/// OS kills the process at an arbitrary point.
pub const MEMORY_ABORT_FRACTION: f64 = 0.98;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Point-in-time memory reading
#[derive(Debug, Clone, Copy)]
pub struct MemoryUsage {
    pub used_bytes: u64,
    pub total_bytes: u64,
}

impl MemoryUsage {
    /// Used fraction of total memory
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        self.used_bytes as f64 / self.total_bytes as f64
    }

    pub fn used_gb(&self) -> f64 {
        self.used_bytes as f64 / BYTES_PER_GB
    }

    pub fn total_gb(&self) -> f64 {
        self.total_bytes as f64 / BYTES_PER_GB
    }

    /// Whether usage crossed the abort threshold
    pub fn exceeds_limit(&self) -> bool {
        self.fraction() > MEMORY_ABORT_FRACTION
    }
}

/// Samples system memory, reusing one `sysinfo` handle
pub struct MemoryMonitor {
    system: System,
}

impl MemoryMonitor {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }

    /// Refresh and read current memory usage
    pub fn sample(&mut self) -> MemoryUsage {
        self.system.refresh_memory();
        MemoryUsage {
            used_bytes: self.system.used_memory(),
            total_bytes: self.system.total_memory(),
        }
    }
}

impl Default for MemoryMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction() {
        let usage = MemoryUsage {
            used_bytes: 1,
            total_bytes: 4,
        };
        assert_eq!(usage.fraction(), 0.25);
    }

    #[test]
    fn test_zero_total_is_not_exhausted() {
        let usage = MemoryUsage {
            used_bytes: 0,
            total_bytes: 0,
        };
        assert_eq!(usage.fraction(), 0.0);
        assert!(!usage.exceeds_limit());
    }

    #[test]
    fn test_limit_boundary() {
        let below = MemoryUsage {
            used_bytes: 97,
            total_bytes: 100,
        };
        let above = MemoryUsage {
            used_bytes: 99,
            total_bytes: 100,
        };

        assert!(!below.exceeds_limit());
        assert!(above.exceeds_limit());
    }

    #[test]
    fn test_sample_reads_real_memory() {
        let mut monitor = MemoryMonitor::new();
        let usage = monitor.sample();

        assert!(usage.total_bytes > 0);
        assert!(usage.used_bytes <= usage.total_bytes);
    }
}
