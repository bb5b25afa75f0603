use std::{
    fmt,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use directories::BaseDirs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::{
    error::{CacheError, Result},
    key::CacheKey,
};

/// Directory name created beneath the platform caches area.
pub const DEFAULT_DIRECTORY_NAME: &str = "ImageCache";

/// Prefix of in-flight write files. Keys may not start with `.`, so no
/// entry can collide with it.
const TEMP_PREFIX: &str = ".tmp-";

/// Root directory of the disk tier. One file per key lives directly in it.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DiskCacheRoot(PathBuf);

impl DiskCacheRoot {
    /// Root at an explicit path.
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    /// `<platform-caches-dir>/<directory_name>`.
    pub fn platform_default(directory_name: &str) -> Result<Self> {
        let base = BaseDirs::new().ok_or_else(|| CacheError::DirectoryInit {
            path: PathBuf::from(directory_name),
            source: std::io::Error::new(
                ErrorKind::NotFound,
                "no home directory to resolve the platform caches dir from",
            ),
        })?;
        Ok(Self(base.cache_dir().join(directory_name)))
    }

    /// The root directory.
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Debug for DiskCacheRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DiskCacheRoot").field(&self.0).finish()
    }
}

/// Key → file store for encoded image bytes.
#[derive(Clone, Debug)]
pub struct DiskTier {
    root: DiskCacheRoot,
}

impl DiskTier {
    /// Create the root directory if needed and delete temp files left by
    /// interrupted writes. Failure to create the root is fatal for the tier
    /// and is reported immediately rather than on first use.
    pub fn open(root: DiskCacheRoot) -> Result<Self> {
        std::fs::create_dir_all(root.as_path()).map_err(|source| {
            CacheError::DirectoryInit {
                path: root.as_path().to_path_buf(),
                source,
            }
        })?;
        sweep_temp_files(root.as_path());
        Ok(Self { root })
    }

    /// The directory entries live in.
    pub fn root(&self) -> &DiskCacheRoot {
        &self.root
    }

    /// `<root>/<key>`.
    pub fn path_for_key(&self, key: &CacheKey) -> PathBuf {
        self.root.as_path().join(key.as_str())
    }

    /// Best-effort write; failures are logged and dropped.
    pub async fn put(&self, key: &CacheKey, bytes: &[u8]) -> bool {
        match self.try_put(key, bytes).await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("disk cache write failed; key={}, err={}", key, e);
                false
            }
        }
    }

    /// Atomic overwrite: write a hidden temp file, flush, rename over the
    /// target. A crash leaves either the old file or the new one.
    pub async fn try_put(&self, key: &CacheKey, bytes: &[u8]) -> Result<()> {
        let path = self.path_for_key(key);
        let tmp = self
            .root
            .as_path()
            .join(format!("{TEMP_PREFIX}{}", Uuid::new_v4().simple()));

        let written = write_file(&tmp, bytes).await;
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e);
        }

        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    /// `None` on a missing file or any read failure.
    pub async fn get(&self, key: &CacheKey) -> Option<Vec<u8>> {
        match tokio::fs::read(self.path_for_key(key)).await {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                log::warn!("disk cache read failed; key={}, err={}", key, e);
                None
            }
        }
    }

    /// Deleting a missing file is not an error.
    pub async fn remove(&self, key: &CacheKey) {
        match tokio::fs::remove_file(self.path_for_key(key)).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                log::warn!("disk cache remove failed; key={}, err={}", key, e);
            }
        }
    }

    /// Whether a file exists for `key`.
    pub async fn contains(&self, key: &CacheKey) -> bool {
        tokio::fs::try_exists(self.path_for_key(key))
            .await
            .unwrap_or(false)
    }
}

fn sweep_temp_files(root: &Path) {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("disk cache temp sweep skipped; root={}, err={}", root.display(), e);
            return;
        }
    };

    let mut removed = 0usize;
    for entry in entries.flatten() {
        if !entry.file_name().to_string_lossy().starts_with(TEMP_PREFIX) {
            continue;
        }
        match std::fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => log::warn!(
                "disk cache temp file not removed; path={}, err={}",
                entry.path().display(),
                e
            ),
        }
    }
    if removed > 0 {
        log::info!(
            "removed interrupted disk cache writes; root={}, count={}",
            root.display(),
            removed
        );
    }
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn key(s: &str) -> CacheKey {
        CacheKey::new(s).unwrap()
    }

    #[tokio::test]
    async fn open_creates_nested_root() {
        let dir = tempdir().unwrap();
        let root = DiskCacheRoot::new(dir.path().join("a/b/ImageCache"));
        let tier = DiskTier::open(root).unwrap();
        assert!(tier.root().as_path().is_dir());
    }

    #[tokio::test]
    async fn open_fails_when_root_is_a_file() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("ImageCache");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let err = DiskTier::open(DiskCacheRoot::new(blocker.clone())).unwrap_err();
        match err {
            CacheError::DirectoryInit { path, .. } => assert_eq!(path, blocker),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn open_sweeps_interrupted_writes_and_keeps_entries() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(".tmp-0123abcd"), b"half written").unwrap();
        std::fs::write(dir.path().join("cat1"), b"complete").unwrap();

        let tier = DiskTier::open(DiskCacheRoot::new(dir.path().to_path_buf())).unwrap();

        assert!(!dir.path().join(".tmp-0123abcd").exists());
        assert_eq!(tier.get(&key("cat1")).await.as_deref(), Some(&b"complete"[..]));
    }

    #[tokio::test]
    async fn put_writes_file_named_after_key() {
        let dir = tempdir().unwrap();
        let tier = DiskTier::open(DiskCacheRoot::new(dir.path().to_path_buf())).unwrap();

        assert!(tier.put(&key("cat1"), b"first").await);
        assert_eq!(std::fs::read(dir.path().join("cat1")).unwrap(), b"first");

        assert!(tier.put(&key("cat1"), b"second").await);
        assert_eq!(tier.get(&key("cat1")).await.as_deref(), Some(&b"second"[..]));

        // Only the target remains; temp files were renamed away.
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("cat1")]);
    }

    #[tokio::test]
    async fn missing_entries_read_as_none_and_remove_twice() {
        let dir = tempdir().unwrap();
        let tier = DiskTier::open(DiskCacheRoot::new(dir.path().to_path_buf())).unwrap();

        assert!(tier.get(&key("unknown")).await.is_none());

        tier.put(&key("dog2"), b"bytes").await;
        assert!(tier.contains(&key("dog2")).await);
        tier.remove(&key("dog2")).await;
        tier.remove(&key("dog2")).await;
        assert!(!tier.contains(&key("dog2")).await);
        assert!(tier.get(&key("dog2")).await.is_none());
    }

    #[tokio::test]
    async fn write_failure_is_reported_not_raised() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("gone");
        let tier = DiskTier::open(DiskCacheRoot::new(root.clone())).unwrap();
        std::fs::remove_dir_all(&root).unwrap();

        assert!(!tier.put(&key("cat1"), b"bytes").await);
        assert!(tier.try_put(&key("cat1"), b"bytes").await.is_err());
        assert!(tier.get(&key("cat1")).await.is_none());
    }
}
