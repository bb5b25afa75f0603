//! Memory pressure detection driving the memory tier's reclamation path.

use std::time::Duration;

use sysinfo::{MemoryRefreshKind, RefreshKind, System};
use tokio::task::JoinHandle;

use crate::{tier::PurgeReport, units::ByteSize};

/// Polling settings for [`MemoryPressureMonitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressureOptions {
    /// Time between probe samples.
    pub poll_interval: Duration,
    /// Available system memory below this counts as pressure.
    pub min_available: ByteSize,
}

impl PressureOptions {
    /// 5 s polling, 256 MiB threshold.
    pub const fn defaults() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            min_available: ByteSize::from_mib(256),
        }
    }
}

impl Default for PressureOptions {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Source of the "how much memory is left" signal.
pub trait MemoryProbe: Send + 'static {
    /// `None` when the platform cannot report it.
    fn available(&mut self) -> Option<ByteSize>;
}

/// Reads available RAM through `sysinfo`.
pub struct SystemMemoryProbe {
    system: System,
}

impl SystemMemoryProbe {
    /// Probe that refreshes RAM figures only.
    pub fn new() -> Self {
        Self {
            system: System::new_with_specifics(
                RefreshKind::nothing()
                    .with_memory(MemoryRefreshKind::nothing().with_ram()),
            ),
        }
    }
}

impl Default for SystemMemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SystemMemoryProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemMemoryProbe").finish_non_exhaustive()
    }
}

impl MemoryProbe for SystemMemoryProbe {
    fn available(&mut self) -> Option<ByteSize> {
        self.system
            .refresh_memory_specifics(MemoryRefreshKind::nothing().with_ram());
        match self.system.available_memory() {
            0 => None,
            bytes => Some(ByteSize::from_bytes(bytes)),
        }
    }
}

/// Background task that polls a [`MemoryProbe`] and runs a reclaim pass
/// while memory is low. Dropping the monitor stops the task.
#[derive(Debug)]
pub struct MemoryPressureMonitor {
    task: JoinHandle<()>,
}

impl MemoryPressureMonitor {
    /// Must be called from within a tokio runtime.
    pub fn spawn<P, F>(mut probe: P, options: PressureOptions, reclaim: F) -> Self
    where
        P: MemoryProbe,
        F: Fn() -> PurgeReport + Send + Sync + 'static,
    {
        let poll_interval = options.poll_interval.max(Duration::from_millis(1));
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;

                let sampled = tokio::task::spawn_blocking(move || {
                    let available = probe.available();
                    (probe, available)
                })
                .await;
                let available = match sampled {
                    Ok((returned, available)) => {
                        probe = returned;
                        available
                    }
                    Err(e) => {
                        log::warn!("memory pressure probe join failed: {e}");
                        return;
                    }
                };

                let Some(available) = available else {
                    continue;
                };
                if available >= options.min_available {
                    continue;
                }

                let report = reclaim();
                if report.discarded > 0 {
                    log::info!(
                        "memory pressure purge; available={}, threshold={}, discarded={}, in_use={}",
                        available,
                        options.min_available,
                        report.discarded,
                        report.retained_in_use
                    );
                } else {
                    log::debug!(
                        "memory pressure purge found nothing to discard; available={}",
                        available
                    );
                }
            }
        });
        Self { task }
    }

    /// Stop polling.
    pub fn stop(self) {
        drop(self);
    }

    /// True once the polling task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for MemoryPressureMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    };

    struct SharedProbe(Arc<AtomicU64>);

    impl MemoryProbe for SharedProbe {
        fn available(&mut self) -> Option<ByteSize> {
            Some(ByteSize::from_bytes(self.0.load(Ordering::SeqCst)))
        }
    }

    fn fast_options() -> PressureOptions {
        PressureOptions {
            poll_interval: Duration::from_millis(5),
            min_available: ByteSize::from_mib(100),
        }
    }

    async fn wait_for(condition: impl Fn() -> bool) -> bool {
        for _ in 0..400 {
            if condition() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        false
    }

    #[tokio::test]
    async fn reclaims_only_below_threshold() {
        let available = Arc::new(AtomicU64::new(ByteSize::from_mib(512).as_bytes()));
        let calls = Arc::new(AtomicUsize::new(0));

        let monitor = {
            let calls = Arc::clone(&calls);
            MemoryPressureMonitor::spawn(
                SharedProbe(Arc::clone(&available)),
                fast_options(),
                move || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    PurgeReport::default()
                },
            )
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        available.store(ByteSize::from_mib(10).as_bytes(), Ordering::SeqCst);
        assert!(wait_for(|| calls.load(Ordering::SeqCst) > 0).await);

        monitor.stop();
    }

    #[tokio::test]
    async fn dropping_monitor_stops_polling() {
        let calls = Arc::new(AtomicUsize::new(0));

        let monitor = {
            let calls = Arc::clone(&calls);
            MemoryPressureMonitor::spawn(
                SharedProbe(Arc::new(AtomicU64::new(1))),
                fast_options(),
                move || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    PurgeReport::default()
                },
            )
        };
        assert!(wait_for(|| calls.load(Ordering::SeqCst) > 0).await);
        drop(monitor);

        tokio::time::sleep(Duration::from_millis(20)).await;
        let after_drop = calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), after_drop);
    }
}
