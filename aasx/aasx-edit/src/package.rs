//! Supplementary files stored inside an AASX package.
//!
//! File elements and thumbnails address package content by a
//! package-relative path such as `/aasx/docs/manual.pdf`. A
//! [`SupplementaryFileStore`] gives access to that content independent of
//! whether the package is unpacked on disk or held in memory.

use aasx_core::error::{AasxError, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// A normalized path inside a package.
///
/// Paths are stored as segments relative to the package root. Values that
/// carry a URI scheme (`http://...`, `file:...`) are not package paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackagePath {
    segments: Vec<String>,
}

impl PackagePath {
    /// Parse a File element value or thumbnail path.
    pub fn parse(value: &str) -> std::result::Result<Self, PackagePathError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(PackagePathError::Empty);
        }
        if let Some(scheme) = uri_scheme(value) {
            return Err(PackagePathError::HasScheme(scheme.to_string()));
        }

        let path = Self::root().join(value)?;
        if path.is_root() {
            return Err(PackagePathError::Empty);
        }
        Ok(path)
    }

    /// Whether `value` addresses content inside the package.
    pub fn is_package_path(value: &str) -> bool {
        Self::parse(value).is_ok()
    }

    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Join a relative path. `..` may not climb above the root.
    pub fn join(&self, other: &str) -> std::result::Result<Self, PackagePathError> {
        let mut segments = self.segments.clone();
        for segment in other.split(['/', '\\']) {
            match segment {
                "" | "." => continue,
                ".." => {
                    if segments.pop().is_none() {
                        return Err(PackagePathError::EscapesRoot);
                    }
                }
                _ => {
                    if segment.contains('\0') {
                        return Err(PackagePathError::InvalidCharacter('\0'));
                    }
                    segments.push(segment.to_string());
                }
            }
        }
        Ok(Self { segments })
    }

    pub fn parent(&self) -> Option<Self> {
        let (_, head) = self.segments.split_last()?;
        Some(Self {
            segments: head.to_vec(),
        })
    }

    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name()?;
        match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => Some(ext),
            _ => None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Location of this path below an unpacked package directory.
    pub fn to_physical(&self, base: &Path) -> PathBuf {
        let mut physical = base.to_path_buf();
        for segment in &self.segments {
            physical.push(segment);
        }
        physical
    }
}

impl fmt::Display for PackagePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.segments.join("/"))
    }
}

fn uri_scheme(value: &str) -> Option<&str> {
    let (scheme, _) = value.split_once(':')?;
    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(scheme)
}

/// Errors that can occur when parsing package paths.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PackagePathError {
    #[error("Package path is empty")]
    Empty,

    #[error("Value has URI scheme '{0}' and is not a package path")]
    HasScheme(String),

    #[error("Invalid character in path: {0:?}")]
    InvalidCharacter(char),

    #[error("Path escapes package root")]
    EscapesRoot,
}

impl From<PackagePathError> for AasxError {
    fn from(err: PackagePathError) -> Self {
        AasxError::package(err.to_string())
    }
}

/// Access to the binary content of a package.
#[async_trait]
pub trait SupplementaryFileStore: Send + Sync {
    /// Whether a File value refers to content inside the package rather than
    /// an external resource.
    fn is_local_file(&self, value: &str) -> bool {
        PackagePath::is_package_path(value)
    }

    async fn exists(&self, path: &PackagePath) -> Result<bool>;

    /// Store the file at `source` as `target_dir/target_name`, optionally
    /// making it the package thumbnail. Existing content is never replaced.
    async fn add_supplementary_file(
        &self,
        source: &Path,
        target_dir: &PackagePath,
        target_name: &str,
        embed_as_thumbnail: bool,
    ) -> Result<PackagePath>;

    /// Copy package content to a fresh temporary file the caller owns.
    async fn make_package_file_available_as_temp_file(&self, path: &PackagePath) -> Result<PathBuf>;

    async fn delete_supplementary_file(&self, path: &PackagePath) -> Result<()>;

    async fn thumbnail(&self) -> Result<Option<PackagePath>>;
}

fn target_path(target_dir: &PackagePath, target_name: &str) -> Result<PackagePath> {
    let target = target_dir.join(target_name)?;
    if target.is_root() || target.parent().as_ref() != Some(target_dir) {
        return Err(AasxError::package(format!(
            "Invalid target name '{}' in {}",
            target_name, target_dir
        )));
    }
    Ok(target)
}

fn temp_file_for(path: &PackagePath) -> PathBuf {
    let name = path.file_name().unwrap_or("content");
    std::env::temp_dir().join(format!("aasx-{}-{}", Uuid::new_v4(), name))
}

/// Package unpacked into a directory.
#[derive(Debug)]
pub struct DirectoryPackageStore {
    root: PathBuf,
    thumbnail: RwLock<Option<PackagePath>>,
}

impl DirectoryPackageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            thumbnail: RwLock::new(None),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl SupplementaryFileStore for DirectoryPackageStore {
    async fn exists(&self, path: &PackagePath) -> Result<bool> {
        Ok(tokio::fs::try_exists(path.to_physical(&self.root)).await?)
    }

    async fn add_supplementary_file(
        &self,
        source: &Path,
        target_dir: &PackagePath,
        target_name: &str,
        embed_as_thumbnail: bool,
    ) -> Result<PackagePath> {
        let target = target_path(target_dir, target_name)?;
        let physical = target.to_physical(&self.root);
        if tokio::fs::try_exists(&physical).await? {
            return Err(AasxError::package(format!("{} already exists", target)));
        }
        if let Some(parent) = physical.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(source, &physical).await?;

        if embed_as_thumbnail {
            *self.thumbnail.write() = Some(target.clone());
        }
        debug!("Stored {} from {}", target, source.display());
        Ok(target)
    }

    async fn make_package_file_available_as_temp_file(&self, path: &PackagePath) -> Result<PathBuf> {
        let temp = temp_file_for(path);
        tokio::fs::copy(path.to_physical(&self.root), &temp)
            .await
            .map_err(|e| AasxError::package(format!("Failed to read {}: {}", path, e)))?;
        Ok(temp)
    }

    async fn delete_supplementary_file(&self, path: &PackagePath) -> Result<()> {
        tokio::fs::remove_file(path.to_physical(&self.root))
            .await
            .map_err(|e| AasxError::package(format!("Failed to delete {}: {}", path, e)))?;

        let mut thumbnail = self.thumbnail.write();
        if thumbnail.as_ref() == Some(path) {
            *thumbnail = None;
        }
        info!("Deleted supplementary file {}", path);
        Ok(())
    }

    async fn thumbnail(&self) -> Result<Option<PackagePath>> {
        Ok(self.thumbnail.read().clone())
    }
}

/// Package content held in memory.
#[derive(Debug, Default)]
pub struct MemoryPackageStore {
    files: DashMap<PackagePath, Vec<u8>>,
    thumbnail: RwLock<Option<PackagePath>>,
}

impl MemoryPackageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put content directly, replacing what was there.
    pub fn insert(&self, path: PackagePath, content: impl Into<Vec<u8>>) {
        self.files.insert(path, content.into());
    }

    pub fn read(&self, path: &PackagePath) -> Option<Vec<u8>> {
        self.files.get(path).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[async_trait]
impl SupplementaryFileStore for MemoryPackageStore {
    async fn exists(&self, path: &PackagePath) -> Result<bool> {
        Ok(self.files.contains_key(path))
    }

    async fn add_supplementary_file(
        &self,
        source: &Path,
        target_dir: &PackagePath,
        target_name: &str,
        embed_as_thumbnail: bool,
    ) -> Result<PackagePath> {
        let target = target_path(target_dir, target_name)?;
        let content = tokio::fs::read(source).await?;

        match self.files.entry(target.clone()) {
            Entry::Occupied(_) => {
                return Err(AasxError::package(format!("{} already exists", target)));
            }
            Entry::Vacant(entry) => {
                entry.insert(content);
            }
        }

        if embed_as_thumbnail {
            *self.thumbnail.write() = Some(target.clone());
        }
        debug!("Stored {} from {}", target, source.display());
        Ok(target)
    }

    async fn make_package_file_available_as_temp_file(&self, path: &PackagePath) -> Result<PathBuf> {
        let content = self
            .read(path)
            .ok_or_else(|| AasxError::not_found("SupplementaryFile", path.to_string()))?;
        let temp = temp_file_for(path);
        tokio::fs::write(&temp, content).await?;
        Ok(temp)
    }

    async fn delete_supplementary_file(&self, path: &PackagePath) -> Result<()> {
        if self.files.remove(path).is_none() {
            return Err(AasxError::not_found("SupplementaryFile", path.to_string()));
        }
        let mut thumbnail = self.thumbnail.write();
        if thumbnail.as_ref() == Some(path) {
            *thumbnail = None;
        }
        Ok(())
    }

    async fn thumbnail(&self) -> Result<Option<PackagePath>> {
        Ok(self.thumbnail.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_package_paths() {
        let path = PackagePath::parse("/aasx/docs/./manual.pdf").unwrap();
        assert_eq!(path.segments(), &["aasx", "docs", "manual.pdf"]);
        assert_eq!(path.to_string(), "/aasx/docs/manual.pdf");
        assert_eq!(path.extension(), Some("pdf"));
        assert_eq!(path.parent().unwrap().to_string(), "/aasx/docs");

        assert_eq!(
            PackagePath::parse("https://example.com/manual.pdf"),
            Err(PackagePathError::HasScheme("https".to_string()))
        );
        assert_eq!(PackagePath::parse("  "), Err(PackagePathError::Empty));
        assert_eq!(PackagePath::parse("/../etc/passwd"), Err(PackagePathError::EscapesRoot));
        assert!(PackagePath::is_package_path("aasx/thumbnail.png"));
    }

    #[tokio::test]
    async fn test_memory_store_never_replaces() {
        let store = MemoryPackageStore::new();
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("manual.pdf");
        tokio::fs::write(&source, b"v1").await.unwrap();

        let docs = PackagePath::parse("/aasx/docs").unwrap();
        let stored = store
            .add_supplementary_file(&source, &docs, "manual.pdf", false)
            .await
            .unwrap();
        assert_eq!(stored.to_string(), "/aasx/docs/manual.pdf");

        tokio::fs::write(&source, b"v2").await.unwrap();
        assert!(store
            .add_supplementary_file(&source, &docs, "manual.pdf", false)
            .await
            .is_err());
        assert_eq!(store.read(&stored).unwrap(), b"v1");
    }

    #[tokio::test]
    async fn test_directory_store_round_trip() {
        let package = TempDir::new().unwrap();
        let store = DirectoryPackageStore::new(package.path());
        let source = package.path().join("incoming.png");
        tokio::fs::write(&source, b"png").await.unwrap();

        let target = store
            .add_supplementary_file(&source, &PackagePath::parse("/aasx").unwrap(), "thumb.png", true)
            .await
            .unwrap();
        assert!(store.exists(&target).await.unwrap());
        assert_eq!(store.thumbnail().await.unwrap(), Some(target.clone()));

        let temp = store
            .make_package_file_available_as_temp_file(&target)
            .await
            .unwrap();
        assert_eq!(tokio::fs::read(&temp).await.unwrap(), b"png");
        tokio::fs::remove_file(&temp).await.unwrap();

        store.delete_supplementary_file(&target).await.unwrap();
        assert!(!store.exists(&target).await.unwrap());
        assert_eq!(store.thumbnail().await.unwrap(), None);
    }

    #[test]
    fn test_target_name_must_stay_in_directory() {
        let dir = PackagePath::parse("/aasx").unwrap();
        assert!(target_path(&dir, "../escape.txt").is_err());
        assert!(target_path(&dir, "nested/file.txt").is_err());
        assert!(target_path(&dir, "file.txt").is_ok());
    }
}
