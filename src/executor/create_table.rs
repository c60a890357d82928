use tracing::info;

use crate::{
    executor::predicate::Predicate,
    storage::{
        schema::{COLUMNS_TABLE, TABLES_TABLE, TableCol, TableInfo, finalize_columns, is_system_table},
        storage_manager::StorageManager,
    },
    types::{
        error::{DatabaseError, Result},
        value::{DataType, Value},
    },
};

/// Builder for the column list of a new table
pub struct TableSchemaBuilder {
    table_name: String,
    columns: Vec<TableCol>,
}

impl TableSchemaBuilder {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns: Vec::new(),
        }
    }

    pub fn add_column(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.columns.push(TableCol::new(name, data_type));
        self
    }

    pub fn add_column_def(mut self, column: TableCol) -> Self {
        self.columns.push(column);
        self
    }

    pub fn build(self) -> Result<(String, Vec<TableCol>)> {
        let columns = finalize_columns(&self.table_name, self.columns)?;
        Ok((self.table_name, columns))
    }
}

fn validate_table_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| {
        Err(DatabaseError::InvalidSchema {
            details: format!("invalid table name '{}': {}", name, reason),
        })
    };
    if name.trim().is_empty() {
        return invalid("empty");
    }
    if name.contains(['/', '\\', '.']) || name.chars().any(char::is_whitespace) {
        return invalid("must not contain path separators, dots or whitespace");
    }
    Ok(())
}

/// Extension methods for StorageManager to create tables
impl StorageManager {
    /// Registers the table in the catalog and creates its file with one empty
    /// root leaf.
    pub fn create_table(&mut self, table_name: &str, columns: Vec<TableCol>) -> Result<TableInfo> {
        validate_table_name(table_name)?;
        if is_system_table(table_name) {
            return Err(DatabaseError::TableAlreadyExists {
                name: table_name.to_string(),
            });
        }
        let columns = finalize_columns(table_name, columns)?;

        let table_row = vec![
            Value::Text(table_name.to_string()),
            Value::Int(0),
            Value::Int(0),
            Value::Int(0),
        ];
        self.insert_catalog_row(TABLES_TABLE, table_row)?;

        self.create_table_file(table_name)?;
        for col in &columns {
            self.insert_catalog_row(COLUMNS_TABLE, col.to_catalog_row(table_name))?;
        }

        info!(table = table_name, columns = columns.len(), "Created table");
        self.load_table_info(table_name)
    }

    pub fn create_table_with_builder(&mut self, builder: TableSchemaBuilder) -> Result<TableInfo> {
        let (table_name, columns) = builder.build()?;
        self.create_table(&table_name, columns)
    }

    /// Removes the table's catalog rows and deletes its file.
    pub fn drop_table(&mut self, table_name: &str) -> Result<()> {
        Self::ensure_user_table(table_name)?;
        self.load_table_info(table_name)?;

        let predicate = Predicate::equals("table_name", table_name);
        let columns = self.delete_rows(COLUMNS_TABLE, Some(&predicate))?;
        self.delete_rows(TABLES_TABLE, Some(&predicate))?;
        let removed_file = self.remove_table_file(table_name)?;

        info!(table = table_name, columns, removed_file, "Dropped table");
        Ok(())
    }

    pub fn table_exists(&self, table_name: &str) -> Result<bool> {
        match self.load_table_info(table_name) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}
