use std::path::{Path, PathBuf};

/// The data file of a store and the lock file that guards it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorePaths {
    pub data: PathBuf,
    pub lock: PathBuf,
}

impl StorePaths {
    pub fn new(data: impl Into<PathBuf>, lock: impl Into<PathBuf>) -> Self {
        Self {
            data: data.into(),
            lock: lock.into(),
        }
    }

    /// Pair `data` with `<data>.lock` in the same directory.
    pub fn beside(data: impl Into<PathBuf>) -> Self {
        let data = data.into();
        let mut lock = data.clone().into_os_string();
        lock.push(".lock");
        Self {
            data,
            lock: PathBuf::from(lock),
        }
    }

    /// Directory holding the data file.
    pub fn data_dir(&self) -> &Path {
        match self.data.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}
