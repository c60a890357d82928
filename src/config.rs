use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::{
    DEFAULT_PAGE_SIZE_POWER, MAX_PAGE_SIZE_POWER, MIN_PAGE_SIZE_POWER,
    error::{DatabaseError, Result},
};

const CATALOG_DIR: &str = "catalog";
const USER_DATA_DIR: &str = "user_data";
pub const TABLE_FILE_EXTENSION: &str = "tbl";

/// Settings of one data store. Passed explicitly to everything that needs
/// them; there is no global state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory holding `catalog/` and `user_data/`.
    pub data_dir: PathBuf,
    /// Page size is `2^page_size_power` bytes.
    pub page_size_power: u32,
    /// Prepend the row id to displayed rows.
    pub show_row_id: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            page_size_power: DEFAULT_PAGE_SIZE_POWER,
            show_row_id: false,
        }
    }
}

impl Config {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn with_page_size_power(mut self, power: u32) -> Self {
        self.page_size_power = power;
        self
    }

    pub fn with_show_row_id(mut self, show: bool) -> Self {
        self.show_row_id = show;
        self
    }

    pub fn page_size(&self) -> usize {
        1usize << self.page_size_power
    }

    /// The content boundary is a u16 that must be able to hold the page size.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_PAGE_SIZE_POWER..=MAX_PAGE_SIZE_POWER).contains(&self.page_size_power) {
            return Err(DatabaseError::InvalidPageSize {
                power: self.page_size_power,
            });
        }
        Ok(())
    }

    pub fn catalog_dir(&self) -> PathBuf {
        self.data_dir.join(CATALOG_DIR)
    }

    pub fn user_data_dir(&self) -> PathBuf {
        self.data_dir.join(USER_DATA_DIR)
    }
}
