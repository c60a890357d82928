use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::info;

use crate::{
    config::{Config, TABLE_FILE_EXTENSION},
    executor::{
        predicate::Predicate,
        scan::{ScanIterator, Scanner},
        sequential_scan::SequentialScanner,
    },
    storage::{
        bplus_tree::BPlusTree,
        page_file::PageFile,
        schema::{COLUMNS_TABLE, TABLES_TABLE, TableInfo, is_system_table},
    },
    types::{
        PageNo,
        error::{DatabaseError, Result},
        page::PageType,
        row::Row,
    },
};

/// Session context over one data store directory.
///
/// Holds no open files and no cached metadata: every operation opens the
/// table file it needs and rebuilds `TableInfo` from the catalog.
#[derive(Debug)]
pub struct StorageManager {
    config: Config,
}

impl StorageManager {
    /// Opens an existing data store.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        let storage = Self { config };
        if !storage.catalog_exists() {
            return Err(DatabaseError::DataStoreNotInitialized {
                path: storage.config.catalog_dir(),
            });
        }
        info!(data_dir = %storage.config.data_dir.display(), "Opened data store");
        Ok(storage)
    }

    /// Creates the catalog of a new data store. Refuses to touch an existing
    /// one.
    pub fn initialize(config: Config) -> Result<Self> {
        config.validate()?;
        let mut storage = Self { config };
        if storage.catalog_exists() {
            return Err(DatabaseError::DataStoreExists {
                path: storage.config.catalog_dir(),
            });
        }
        storage.bootstrap_catalog()?;
        Ok(storage)
    }

    /// Wipes the catalog and user data directories, then initializes.
    pub fn initialize_fresh(config: Config) -> Result<Self> {
        config.validate()?;
        for dir in [config.catalog_dir(), config.user_data_dir()] {
            if dir.exists() {
                fs::remove_dir_all(&dir)?;
            }
        }
        Self::initialize(config)
    }

    pub fn open_or_initialize(config: Config) -> Result<Self> {
        match Self::open(config.clone()) {
            Err(DatabaseError::DataStoreNotInitialized { .. }) => Self::initialize(config),
            other => other,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn set_show_row_id(&mut self, show: bool) {
        self.config.show_row_id = show;
    }

    pub fn page_size(&self) -> usize {
        self.config.page_size()
    }

    fn catalog_exists(&self) -> bool {
        self.table_path(TABLES_TABLE).exists() && self.table_path(COLUMNS_TABLE).exists()
    }

    /// File backing `table_name`: system tables live in the catalog
    /// directory, everything else in the user data directory.
    pub fn table_path(&self, table_name: &str) -> PathBuf {
        let dir = if is_system_table(table_name) {
            self.config.catalog_dir()
        } else {
            self.config.user_data_dir()
        };
        dir.join(format!("{}.{}", table_name, TABLE_FILE_EXTENSION))
    }

    /// Rejects direct row changes to the catalog tables. The catalog
    /// maintains them itself.
    pub(crate) fn ensure_user_table(table_name: &str) -> Result<()> {
        if is_system_table(table_name) {
            return Err(DatabaseError::SystemTable {
                name: table_name.to_string(),
            });
        }
        Ok(())
    }

    pub fn open_table_file(&self, table_name: &str) -> Result<PageFile> {
        let path = self.table_path(table_name);
        if !path.exists() {
            return Err(DatabaseError::TableNotFound {
                name: table_name.to_string(),
            });
        }
        PageFile::open(path, self.page_size())
    }

    /// Creates a table file holding a single empty root leaf.
    pub(crate) fn create_table_file(&self, table_name: &str) -> Result<PageFile> {
        let path = self.table_path(table_name);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut file = PageFile::create(&path, self.page_size())?;
        file.allocate_page(PageType::Leaf, None, None)?;
        Ok(file)
    }

    pub(crate) fn remove_table_file(&self, table_name: &str) -> Result<bool> {
        let path = self.table_path(table_name);
        if path.exists() {
            fs::remove_file(&path)?;
            return Ok(true);
        }
        Ok(false)
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Table metadata, rebuilt from the catalog.
    pub fn lookup_table(&self, table_name: &str) -> Result<TableInfo> {
        self.load_table_info(table_name)
    }

    /// Current root page of a table, found by scanning its file.
    pub fn find_root(&self, table_name: &str) -> Result<PageNo> {
        self.open_table_file(table_name)?.find_root()
    }

    /// Leaf pages of a table in row-id order.
    pub fn list_leaves(&self, table_name: &str) -> Result<Vec<PageNo>> {
        let mut file = self.open_table_file(table_name)?;
        BPlusTree::open(&mut file)?.collect_leaves()
    }

    pub fn create_scanner(&self, table_name: &str) -> Result<SequentialScanner> {
        SequentialScanner::new(self, table_name.to_string())
    }

    /// Rows of a table in row-id order, optionally filtered.
    pub fn scan_table(&self, table_name: &str, predicate: Option<&Predicate>) -> Result<Vec<Row>> {
        let table_info = match predicate {
            Some(pred) => {
                let info = self.load_table_info(table_name)?;
                pred.validate_against_schema(&info)?;
                Some(info)
            }
            None => None,
        };

        let mut rows = Vec::new();
        for row in ScanIterator::new(self.create_scanner(table_name)?) {
            let row = row?;
            let matches = match (predicate, &table_info) {
                (Some(pred), Some(info)) => pred.evaluate(&row, info)?,
                _ => true,
            };
            if matches {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    /// Every row of a table without consulting the catalog.
    pub(crate) fn read_all_rows(&self, table_name: &str) -> Result<Vec<Row>> {
        let mut scanner = self.create_scanner(table_name)?;
        let mut rows = Vec::new();
        while let Some(row) = scanner.scan()? {
            rows.push(row);
        }
        Ok(rows)
    }
}
