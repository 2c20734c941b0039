use std::{
    fs::create_dir_all,
    path::{Path, PathBuf},
};

use crate::error::CollocError;
use tempfile::TempDir;

const DEFAULT_SUFFIXES: &[&str] = &[".hdf", ".HDF5"];

/// A local directory of downloaded archive files, so nothing is downloaded twice.
///
/// The cache either lives in a caller supplied directory that persists, or in a fresh temporary
/// directory that is deleted together with its contents when the cache is dropped.
#[derive(Debug)]
pub struct FileCache {
    root: PathBuf,
    suffixes: Vec<String>,
    // Held only so the directory is removed on drop.
    _ephemeral: Option<TempDir>,
}

impl FileCache {
    /// Use `root` as a persistent cache directory, creating it if needed.
    pub fn persistent<P>(root: P) -> Result<Self, CollocError>
    where
        P: Into<PathBuf>,
    {
        let root = root.into();
        if !root.exists() {
            log::debug!("Creating cache directory: {:?}", &root);
            create_dir_all(&root)?;
        }

        log::info!("Using file cache at: {:?}", &root);
        Ok(FileCache {
            root,
            suffixes: Self::default_suffixes(),
            _ephemeral: None,
        })
    }

    /// Cache into a new temporary directory that is removed when the cache is dropped.
    pub fn ephemeral() -> Result<Self, CollocError> {
        let dir = tempfile::Builder::new().prefix("sat_colloc").tempdir()?;
        log::info!("Using temporary file cache at: {:?}", dir.path());

        Ok(FileCache {
            root: dir.path().to_path_buf(),
            suffixes: Self::default_suffixes(),
            _ephemeral: Some(dir),
        })
    }

    /// Replace the set of known file suffixes. The first one is appended to names lacking all.
    pub fn with_suffixes(mut self, suffixes: &[&str]) -> Self {
        self.suffixes = suffixes.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The local path of `filename` if it has already been downloaded.
    pub fn lookup(&self, filename: &str) -> Option<PathBuf> {
        let path = self.destination(filename);
        if path.is_file() {
            Some(path)
        } else {
            None
        }
    }

    /// Return the cached copy of `filename`, calling `fetch` to populate it on a miss.
    ///
    /// `fetch` writes into a temporary file in the cache directory, which is only renamed to its
    /// final name once `fetch` succeeds. On failure the temporary file is removed.
    pub fn download_via<F>(&self, filename: &str, fetch: F) -> Result<PathBuf, CollocError>
    where
        F: FnOnce(&Path) -> Result<(), CollocError>,
    {
        if let Some(path) = self.lookup(filename) {
            log::debug!("Cache hit for {}", filename);
            return Ok(path);
        }

        let dest = self.destination(filename);
        let partial = tempfile::Builder::new()
            .prefix(".")
            .suffix(".partial")
            .tempfile_in(&self.root)?;

        fetch(partial.path())?;

        partial
            .persist(&dest)
            .map_err(|err| CollocError::Transport(format!("{:?} : {}", dest, err.error)))?;
        log::debug!("Saved {:?}", dest);

        Ok(dest)
    }

    fn destination(&self, filename: &str) -> PathBuf {
        self.root.join(ensure_extension(filename, &self.suffixes))
    }

    fn default_suffixes() -> Vec<String> {
        DEFAULT_SUFFIXES.iter().map(|s| s.to_string()).collect()
    }
}

fn ensure_extension(filename: &str, suffixes: &[String]) -> String {
    if suffixes.is_empty() || suffixes.iter().any(|s| filename.ends_with(s.as_str())) {
        filename.to_owned()
    } else {
        format!("{}{}", filename, suffixes[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_ensure_extension() {
        let suffixes = FileCache::default_suffixes();
        assert_eq!(ensure_extension("a.hdf", &suffixes), "a.hdf");
        assert_eq!(ensure_extension("a.HDF5", &suffixes), "a.HDF5");
        assert_eq!(ensure_extension("a", &suffixes), "a.hdf");
    }

    #[test]
    fn test_fetch_called_once() {
        let cache = FileCache::ephemeral().unwrap();
        let calls = Cell::new(0);
        let fetch = |dest: &Path| -> Result<(), CollocError> {
            calls.set(calls.get() + 1);
            std::fs::write(dest, b"granule")?;
            Ok(())
        };

        let first = cache.download_via("granule.hdf", fetch).unwrap();
        let second = cache.download_via("granule.hdf", fetch).unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(first, second);
        assert_eq!(std::fs::read(&first).unwrap(), b"granule");
    }

    #[test]
    fn test_lookup_uses_normalized_name() {
        let cache = FileCache::ephemeral().unwrap();
        assert!(cache.lookup("granule").is_none());

        let path = cache
            .download_via("granule", |dest| Ok(std::fs::write(dest, b"x")?))
            .unwrap();

        assert_eq!(path, cache.root().join("granule.hdf"));
        assert_eq!(cache.lookup("granule"), Some(path));
    }

    #[test]
    fn test_failed_fetch_leaves_nothing_behind() {
        let cache = FileCache::ephemeral().unwrap();
        let result = cache.download_via("granule.hdf", |dest| {
            std::fs::write(dest, b"half a gran")?;
            Err(CollocError::transport("connection reset"))
        });

        assert!(matches!(result, Err(CollocError::Transport(_))));
        assert!(cache.lookup("granule.hdf").is_none());
        assert_eq!(std::fs::read_dir(cache.root()).unwrap().count(), 0);
    }

    #[test]
    fn test_ephemeral_cache_removed_on_drop() {
        let cache = FileCache::ephemeral().unwrap();
        cache
            .download_via("granule.hdf", |dest| Ok(std::fs::write(dest, b"x")?))
            .unwrap();
        let root = cache.root().to_path_buf();
        assert!(root.exists());

        drop(cache);
        assert!(!root.exists());
    }

    #[test]
    fn test_persistent_cache_survives_drop() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("cache");

        let cache = FileCache::persistent(&root).unwrap();
        cache
            .download_via("granule.hdf", |dest| Ok(std::fs::write(dest, b"x")?))
            .unwrap();
        drop(cache);

        let cache = FileCache::persistent(&root).unwrap();
        assert!(cache.lookup("granule.hdf").is_some());
    }
}
