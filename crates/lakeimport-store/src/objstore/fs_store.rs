//! Object store rooted in a local directory.
//!
//! Bucket `b`, key `k` lives at `<root>/b/k`. Keys are split on `/`; empty,
//! `.` and `..` segments are rejected so every object stays under the root.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use lakeimport_core::errors::{ExError, ExErrorKind};
use lakeimport_core::Manifest;

use super::atomic::atomic_write;
use crate::errors::{invalid_url, io_error, Result};

const SCHEME: &str = "s3://";

/// Split an `s3://bucket/key` URL into bucket and key
///
/// # Errors
///
/// `InvalidInput` if the scheme is not `s3`, or the bucket or key is empty.
pub fn parse_url(url: &str) -> Result<(String, String)> {
    let rest = url.strip_prefix(SCHEME).ok_or_else(|| invalid_url(url))?;
    let (bucket, key) = rest.split_once('/').ok_or_else(|| invalid_url(url))?;
    if bucket.is_empty() || key.is_empty() {
        return Err(invalid_url(url));
    }
    Ok((bucket.to_string(), key.to_string()))
}

/// Local-directory object store
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Create a store at the given root directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path of an object
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the bucket or key would escape the root.
    pub fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        let mut path = self.root.clone();
        for segment in std::iter::once(bucket).chain(key.split('/')) {
            if segment.is_empty() || segment == "." || segment == ".." {
                return Err(ExError::new(ExErrorKind::InvalidInput)
                    .with_op("object_path")
                    .with_key(key)
                    .with_message(format!("invalid object location {}/{}", bucket, key)));
            }
            path.push(segment);
        }
        Ok(path)
    }

    /// Read a whole object
    ///
    /// # Errors
    ///
    /// `NotFound` if the object does not exist, `Io` if it cannot be read.
    pub fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let path = self.object_path(bucket, key)?;
        fs::read(&path).map_err(|e| io_error("get_object", e).with_file(key))
    }

    /// Open an object for streaming reads
    ///
    /// # Errors
    ///
    /// `NotFound` if the object does not exist, `Io` if it cannot be opened.
    pub fn open(&self, bucket: &str, key: &str) -> Result<BufReader<File>> {
        let path = self.object_path(bucket, key)?;
        let file = File::open(&path).map_err(|e| io_error("open_object", e).with_file(key))?;
        Ok(BufReader::new(file))
    }

    /// Write an object atomically
    ///
    /// # Errors
    ///
    /// `Io` if the write fails.
    pub fn put(&self, bucket: &str, key: &str, content: &[u8]) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        atomic_write(&path, content).map_err(|e| e.or_file(key))
    }

    /// Fetch and parse the manifest at `manifest_url`
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a bad URL, `NotFound` if the manifest is missing,
    /// `InvalidManifest`/`MissingField` if it does not parse.
    pub fn load_manifest(&self, manifest_url: &str) -> Result<Manifest> {
        let (bucket, key) = parse_url(manifest_url)?;
        let bytes = self.get(&bucket, &key)?;
        Manifest::from_json_bytes(&bytes).map_err(|e| e.or_file(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_url() {
        assert_eq!(
            parse_url("s3://inv-bucket/path/to/manifest.json").unwrap(),
            ("inv-bucket".to_string(), "path/to/manifest.json".to_string())
        );
        for bad in ["inv-bucket/manifest.json", "s3://", "s3://bucket", "s3:///key", "s3://bucket/"] {
            let err = parse_url(bad).unwrap_err();
            assert_eq!(err.kind(), ExErrorKind::InvalidInput, "{}", bad);
        }
    }

    #[test]
    fn test_put_then_get() {
        let dir = TempDir::new().unwrap();
        let store = FsObjectStore::new(dir.path());

        store.put("bucket", "a/b/c.txt", b"hello").unwrap();
        assert_eq!(store.get("bucket", "a/b/c.txt").unwrap(), b"hello");
        assert!(dir.path().join("bucket/a/b/c.txt").exists());
    }

    #[test]
    fn test_missing_object_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = FsObjectStore::new(dir.path());
        let err = store.get("bucket", "nope").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::NotFound);
        assert_eq!(err.file(), Some("nope"));
    }

    #[test]
    fn test_traversal_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = FsObjectStore::new(dir.path());
        let err = store.get("bucket", "../../etc/passwd").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidInput);
    }
}
