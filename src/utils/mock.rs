use std::path::Path;

use tempfile::TempDir;

use crate::{
    config::Config,
    storage::{schema::TableCol, storage_manager::StorageManager},
    types::{DEFAULT_PAGE_SIZE_POWER, error::Result, value::DataType},
};

/// A freshly initialized data store inside a temporary directory that is
/// removed on drop.
pub struct TempDatabase {
    pub storage_manager: StorageManager,
    // Dropped last so the directory outlives the manager.
    dir: TempDir,
}

impl TempDatabase {
    pub fn new() -> Result<Self> {
        Self::with_page_size_power(DEFAULT_PAGE_SIZE_POWER)
    }

    pub fn with_prefix(prefix: &str) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
        Self::in_dir(dir, DEFAULT_PAGE_SIZE_POWER)
    }

    pub fn with_page_size_power(power: u32) -> Result<Self> {
        Self::in_dir(tempfile::tempdir()?, power)
    }

    fn in_dir(dir: TempDir, power: u32) -> Result<Self> {
        let config = Config::new(dir.path()).with_page_size_power(power);
        let storage_manager = StorageManager::initialize(config)?;
        Ok(Self {
            storage_manager,
            dir,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self) -> Config {
        self.storage_manager.config().clone()
    }

    /// Reopens the same directory with a new manager.
    pub fn reopen(&mut self) -> Result<&mut StorageManager> {
        self.storage_manager = StorageManager::open(self.config())?;
        Ok(&mut self.storage_manager)
    }

    /// Creates `name(id INT, label TEXT)`.
    pub fn create_simple_table(&mut self, name: &str) -> Result<()> {
        self.storage_manager.create_table(
            name,
            vec![
                TableCol::new("id", DataType::Int),
                TableCol::new("label", DataType::Text),
            ],
        )?;
        Ok(())
    }
}
