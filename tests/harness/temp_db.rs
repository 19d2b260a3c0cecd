use tempfile::TempDir;
use whalewatch::infrastructure::bootstrap::open_storage;
use whalewatch::port::Storage;

/// Temporary SQLite database for integration tests.
///
/// The file lives as long as the value; reopening the same path simulates a
/// process restart.
pub struct TempDb {
    dir: TempDir,
    storage: Storage,
}

impl TempDb {
    pub fn create() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let storage = open_storage(&Self::path_in(&dir)).expect("open sqlite storage");
        Self { dir, storage }
    }

    pub fn storage(&self) -> Storage {
        self.storage.clone()
    }

    /// Open a second, independent pool on the same file.
    pub fn reopen(&self) -> Storage {
        open_storage(&Self::path_in(&self.dir)).expect("reopen sqlite storage")
    }

    fn path_in(dir: &TempDir) -> String {
        dir.path().join("whalewatch.db").display().to_string()
    }
}
