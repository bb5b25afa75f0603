use std::sync::atomic::{AtomicU64, Ordering};

use super::memory::PurgeReport;

/// Point-in-time copy of the cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStatsSnapshot {
    /// Reads served from memory.
    pub memory_hits: u64,
    /// Discarded entries evicted by readers.
    pub dead_memory_entries: u64,
    /// Reads served from disk.
    pub disk_hits: u64,
    /// Reads that found nothing.
    pub misses: u64,
    /// Disk hits copied into memory.
    pub promotions: u64,
    /// Disk writes that failed to encode or persist.
    pub disk_write_failures: u64,
    /// Disk entries that failed to decode.
    pub decode_failures: u64,
    /// Reclamation passes run.
    pub pressure_purges: u64,
    /// Entries discarded by those passes.
    pub pressure_discarded: u64,
}

#[derive(Debug, Default)]
pub struct CacheStats {
    memory_hits: AtomicU64,
    dead_memory_entries: AtomicU64,
    disk_hits: AtomicU64,
    misses: AtomicU64,
    promotions: AtomicU64,
    disk_write_failures: AtomicU64,
    decode_failures: AtomicU64,
    pressure_purges: AtomicU64,
    pressure_discarded: AtomicU64,
}

impl CacheStats {
    pub fn on_memory_hit(&self) {
        self.memory_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn on_dead_memory_entry(&self) {
        self.dead_memory_entries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn on_disk_hit(&self) {
        self.disk_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn on_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn on_promotion(&self) {
        self.promotions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn on_disk_write_failure(&self) {
        self.disk_write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn on_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn on_pressure_purge(&self, report: &PurgeReport) {
        self.pressure_purges.fetch_add(1, Ordering::Relaxed);
        self.pressure_discarded
            .fetch_add(report.discarded as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            memory_hits: self.memory_hits.load(Ordering::Relaxed),
            dead_memory_entries: self
                .dead_memory_entries
                .load(Ordering::Relaxed),
            disk_hits: self.disk_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            promotions: self.promotions.load(Ordering::Relaxed),
            disk_write_failures: self
                .disk_write_failures
                .load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            pressure_purges: self.pressure_purges.load(Ordering::Relaxed),
            pressure_discarded: self
                .pressure_discarded
                .load(Ordering::Relaxed),
        }
    }
}
