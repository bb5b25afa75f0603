//! Public cache API orchestrating the memory and disk tiers.

use std::sync::Arc;

use crate::{
    codec::{CachedImage, ImageCodec, MAX_JPEG_QUALITY},
    error::Result,
    key::CacheKey,
    policy::{CachePolicy, PromotionMode},
    pressure::{MemoryPressureMonitor, MemoryProbe, PressureOptions},
    tier::{
        CacheStatsSnapshot, DEFAULT_DIRECTORY_NAME, DiskCacheRoot, DiskTier,
        MemoryTier, PurgeReport, stats::CacheStats,
    },
};

/// Construction options for [`ImageCache`].
#[derive(Debug, Clone)]
pub struct ImageCacheOptions {
    /// Directory holding one file per key.
    pub disk_root: DiskCacheRoot,
    /// JPEG quality for disk entries, 1..=100.
    pub jpeg_quality: u8,
    /// When disk hits are copied into memory.
    pub promotion: PromotionMode,
}

impl ImageCacheOptions {
    /// Default options rooted at `disk_root`.
    pub fn with_root(disk_root: DiskCacheRoot) -> Self {
        Self {
            disk_root,
            jpeg_quality: MAX_JPEG_QUALITY,
            promotion: PromotionMode::default(),
        }
    }

    /// Options rooted at `<platform-caches-dir>/ImageCache`.
    pub fn platform_default() -> Result<Self> {
        Ok(Self::with_root(DiskCacheRoot::platform_default(
            DEFAULT_DIRECTORY_NAME,
        )?))
    }
}

/// Two-tier image cache.
///
/// Reads are memory-first; writes and removals fan out to the tiers the
/// [`CachePolicy`] selects. The tiers are never updated atomically together:
/// the memory tier is advisory, the disk tier is the durable copy.
#[derive(Debug)]
pub struct ImageCache {
    memory: Arc<MemoryTier>,
    disk: DiskTier,
    codec: ImageCodec,
    promotion: PromotionMode,
    stats: Arc<CacheStats>,
}

impl ImageCache {
    /// Fails only when the disk root cannot be created.
    pub fn open(options: ImageCacheOptions) -> Result<Self> {
        let disk = DiskTier::open(options.disk_root)?;
        log::debug!(
            "image cache opened; root={}, quality={}, promotion={:?}",
            disk.root().as_path().display(),
            options.jpeg_quality,
            options.promotion
        );
        Ok(Self {
            memory: Arc::new(MemoryTier::new()),
            disk,
            codec: ImageCodec::new(options.jpeg_quality),
            promotion: options.promotion,
            stats: Arc::new(CacheStats::default()),
        })
    }

    /// The memory tier.
    pub fn memory(&self) -> &Arc<MemoryTier> {
        &self.memory
    }

    /// The disk tier.
    pub fn disk(&self) -> &DiskTier {
        &self.disk
    }

    /// Codec used for disk entries.
    pub fn codec(&self) -> ImageCodec {
        self.codec
    }

    /// Configured promotion mode.
    pub fn promotion(&self) -> PromotionMode {
        self.promotion
    }

    /// Store `image` in the selected tiers. Each tier is best-effort; a disk
    /// failure does not undo the memory write.
    pub async fn set(&self, key: &CacheKey, image: CachedImage, policy: CachePolicy) {
        if policy.includes_memory() {
            self.memory.put_image(key.clone(), image.clone());
        }
        if policy.includes_disk() {
            self.write_disk(key, image).await;
        }
    }

    /// Memory first, then disk. A live memory hit ends the lookup even under
    /// [`CachePolicy::MemoryAndDisk`].
    pub async fn get(&self, key: &CacheKey, policy: CachePolicy) -> Option<CachedImage> {
        if policy.includes_memory()
            && let Some(image) = self.get_from_memory(key)
        {
            return Some(image);
        }

        if policy.includes_disk()
            && let Some(image) = self.read_disk(key).await
        {
            self.stats.on_disk_hit();
            if self.promotion.promotes(policy) {
                self.promote(key, image.clone());
            }
            return Some(image);
        }

        self.stats.on_miss();
        None
    }

    /// Synchronous, I/O-free memory lookup.
    ///
    /// A dead entry is evicted and reported as a miss.
    pub fn get_from_memory(&self, key: &CacheKey) -> Option<CachedImage> {
        let content = self.memory.get(key)?;
        match content.access() {
            Some(access) => {
                self.stats.on_memory_hit();
                Some(access.into_payload())
            }
            None => {
                log::debug!("evicting discarded memory entry; key={}", key);
                self.memory.remove_if_same(key, &content);
                self.stats.on_dead_memory_entry();
                None
            }
        }
    }

    /// Copy a lower-tier hit into memory unless a live entry is already
    /// there. A concurrent `set` that landed during the lookup is kept.
    pub fn promote(&self, key: &CacheKey, image: CachedImage) -> bool {
        let promoted = self.memory.promote(key.clone(), image);
        if promoted {
            log::debug!("promoted disk hit into memory; key={}", key);
            self.stats.on_promotion();
        } else {
            log::debug!("kept newer memory entry over disk hit; key={}", key);
        }
        promoted
    }

    /// Remove `key` from the selected tiers. Missing entries are ignored.
    pub async fn remove(&self, key: &CacheKey, policy: CachePolicy) {
        if policy.includes_memory() {
            self.memory.remove(key);
        }
        if policy.includes_disk() {
            self.disk.remove(key).await;
        }
    }

    /// Run the memory tier's reclamation path now.
    pub fn handle_memory_pressure(&self) -> PurgeReport {
        reclaim(&self.memory, &self.stats)
    }

    /// Start polling `probe` and reclaim memory whenever it reports pressure.
    /// Must be called from within a tokio runtime.
    pub fn spawn_pressure_monitor<P: MemoryProbe>(
        &self,
        probe: P,
        options: PressureOptions,
    ) -> MemoryPressureMonitor {
        let memory = Arc::clone(&self.memory);
        let stats = Arc::clone(&self.stats);
        MemoryPressureMonitor::spawn(probe, options, move || reclaim(&memory, &stats))
    }

    /// Current counter values.
    pub fn stats_snapshot(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    async fn write_disk(&self, key: &CacheKey, image: CachedImage) {
        let codec = self.codec;
        let encoded = tokio::task::spawn_blocking(move || codec.encode(&image)).await;
        let bytes = match encoded {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => {
                log::warn!("image encode for disk cache failed; key={}, err={}", key, e);
                self.stats.on_disk_write_failure();
                return;
            }
            Err(e) => {
                log::warn!("image encode task failed; key={}, err={}", key, e);
                self.stats.on_disk_write_failure();
                return;
            }
        };

        if !self.disk.put(key, &bytes).await {
            self.stats.on_disk_write_failure();
        }
    }

    async fn read_disk(&self, key: &CacheKey) -> Option<CachedImage> {
        let bytes = self.disk.get(key).await?;
        let codec = self.codec;
        match tokio::task::spawn_blocking(move || codec.decode(&bytes)).await {
            Ok(Ok(image)) => Some(image),
            Ok(Err(e)) => {
                log::warn!("disk cache entry failed to decode; key={}, err={}", key, e);
                self.stats.on_decode_failure();
                None
            }
            Err(e) => {
                log::warn!("image decode task failed; key={}, err={}", key, e);
                self.stats.on_decode_failure();
                None
            }
        }
    }
}

fn reclaim(memory: &MemoryTier, stats: &CacheStats) -> PurgeReport {
    let report = memory.discard_unused();
    stats.on_pressure_purge(&report);
    report
}
