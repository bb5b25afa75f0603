/// Which tier(s) a single cache operation acts on. Passed per call, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CachePolicy {
    /// Only the memory tier.
    Memory,
    /// Only the disk tier.
    Disk,
    /// Both tiers; reads try memory first.
    MemoryAndDisk,
}

impl CachePolicy {
    /// Every policy.
    pub const ALL: [Self; 3] = [Self::Memory, Self::Disk, Self::MemoryAndDisk];

    /// Whether the memory tier is selected.
    pub const fn includes_memory(self) -> bool {
        matches!(self, Self::Memory | Self::MemoryAndDisk)
    }

    /// Whether the disk tier is selected.
    pub const fn includes_disk(self) -> bool {
        matches!(self, Self::Disk | Self::MemoryAndDisk)
    }
}

/// When a disk hit is copied into the memory tier during `get`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PromotionMode {
    /// Promote only when the lookup selected both tiers.
    #[default]
    CombinedOnly,
    /// Promote on every disk hit, including disk-only lookups.
    Always,
}

impl PromotionMode {
    /// Whether a disk hit under `policy` is copied into memory.
    pub const fn promotes(self, policy: CachePolicy) -> bool {
        match self {
            PromotionMode::CombinedOnly => {
                matches!(policy, CachePolicy::MemoryAndDisk)
            }
            PromotionMode::Always => policy.includes_disk(),
        }
    }
}

impl std::fmt::Display for CachePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Disk => write!(f, "disk"),
            Self::MemoryAndDisk => write!(f, "memory+disk"),
        }
    }
}
