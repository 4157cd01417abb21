//! Sysinfo Host Metrics
//!
//! Implements HostMetricsSource on top of the `sysinfo` crate.

use crate::domain::errors::MonitorError;
use crate::domain::ports::HostMetricsSource;
use parking_lot::Mutex;
use sysinfo::{Pid, System};

/// Host metrics for the current process.
///
/// The core count is read once at construction; resident memory is
/// refreshed on every call.
pub struct SysinfoHostMetrics {
    system: Mutex<System>,
    pid: Pid,
    cores: usize,
}

impl SysinfoHostMetrics {
    pub fn new() -> Result<Self, MonitorError> {
        let pid = sysinfo::get_current_pid()
            .map_err(|e| MonitorError::TransientMetrics(format!("current pid: {}", e)))?;

        let mut system = System::new();
        system.refresh_cpu();
        let cores = resolve_core_count(
            system.cpus().len(),
            std::thread::available_parallelism().ok().map(|n| n.get()),
        );

        tracing::debug!("host metrics ready pid={} cores={}", pid, cores);

        Ok(Self {
            system: Mutex::new(system),
            pid,
            cores,
        })
    }
}

/// Prefer sysinfo's count, then the std fallback. A zero count makes every
/// tick a degenerate skip.
fn resolve_core_count(reported: usize, fallback: Option<usize>) -> usize {
    let cores = match reported {
        0 => fallback.unwrap_or(0),
        n => n,
    };
    if cores == 0 {
        tracing::warn!("no logical core count available, overload checks will be skipped");
    }
    cores
}

impl HostMetricsSource for SysinfoHostMetrics {
    fn logical_core_count(&self) -> Result<usize, MonitorError> {
        Ok(self.cores)
    }

    fn resident_memory_bytes(&self) -> Result<u64, MonitorError> {
        let mut system = self.system.lock();
        if !system.refresh_process(self.pid) {
            return Err(MonitorError::TransientMetrics(format!(
                "process {} not found",
                self.pid
            )));
        }
        system
            .process(self.pid)
            .map(|p| p.memory())
            .ok_or_else(|| {
                MonitorError::TransientMetrics(format!("process {} not found", self.pid))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[traced_test]
    #[test]
    fn test_core_count_prefers_sysinfo() {
        assert_eq!(resolve_core_count(8, Some(4)), 8);
        assert!(!logs_contain("no logical core count"));
    }

    #[traced_test]
    #[test]
    fn test_core_count_falls_back_to_std() {
        assert_eq!(resolve_core_count(0, Some(4)), 4);
        assert!(!logs_contain("no logical core count"));
    }

    #[traced_test]
    #[test]
    fn test_missing_core_count_warns() {
        assert_eq!(resolve_core_count(0, None), 0);
        assert!(logs_contain("WARN"));
        assert!(logs_contain("no logical core count available"));
    }

    #[test]
    fn test_reports_at_least_one_core() {
        let metrics = SysinfoHostMetrics::new().unwrap();
        assert!(metrics.logical_core_count().unwrap() >= 1);
    }

    #[test]
    fn test_reports_resident_memory() {
        let metrics = SysinfoHostMetrics::new().unwrap();
        let bytes = metrics.resident_memory_bytes().unwrap();
        assert!(bytes > 0);
    }

    #[test]
    fn test_repeated_reads() {
        let metrics = SysinfoHostMetrics::new().unwrap();
        for _ in 0..3 {
            assert!(metrics.resident_memory_bytes().is_ok());
        }
    }
}
