use serde::{Deserialize, Serialize};

use crate::types::{
    PageNo, RowId,
    error::{DatabaseError, Result},
    row::Row,
    value::{DataType, Value},
};

pub const TABLES_TABLE: &str = "petak_tables";
pub const COLUMNS_TABLE: &str = "petak_columns";

const YES: &str = "YES";
const NO: &str = "NO";
const PRIMARY_KEY_MARKER: &str = "PRI";

pub fn is_system_table(name: &str) -> bool {
    name == TABLES_TABLE || name == COLUMNS_TABLE
}

/// A column definition as recorded in the columns catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCol {
    pub name: String,
    pub data_type: DataType,
    /// 1-based position in the record.
    pub ordinal_position: u16,
    pub nullable: bool,
    pub unique: bool,
    pub primary_key: bool,
}

impl TableCol {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            ordinal_position: 0,
            nullable: true,
            unique: false,
            primary_key: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Primary keys are also unique and not null.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.unique = true;
        self.nullable = false;
        self
    }

    fn at(mut self, ordinal_position: u16) -> Self {
        self.ordinal_position = ordinal_position;
        self
    }

    pub fn is_unique(&self) -> bool {
        self.unique || self.primary_key
    }

    /// Field list of this column's row in the columns catalog.
    pub fn to_catalog_row(&self, table_name: &str) -> Vec<Value> {
        let flag = |set: bool| Value::Text(if set { YES } else { NO }.to_string());
        vec![
            Value::Text(table_name.to_string()),
            Value::Text(self.name.clone()),
            Value::Text(self.data_type.name().to_string()),
            Value::SmallInt(self.ordinal_position as i16),
            flag(self.nullable),
            if self.primary_key {
                Value::Text(PRIMARY_KEY_MARKER.to_string())
            } else {
                Value::Null
            },
            flag(self.is_unique()),
        ]
    }

    pub fn from_catalog_row(table_name: &str, row: &Row) -> Result<Self> {
        let corrupt = |reason: &str| DatabaseError::CorruptCatalog {
            table: table_name.to_string(),
            reason: reason.to_string(),
        };
        if row.values.len() != 7 {
            return Err(corrupt("column row has wrong field count"));
        }

        let text = |index: usize| match &row.values[index] {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        };

        let name = text(1).ok_or_else(|| corrupt("column name is not TEXT"))?;
        let data_type: DataType = text(2)
            .ok_or_else(|| corrupt("data type is not TEXT"))?
            .parse()
            .map_err(|_| corrupt("unknown data type"))?;
        let ordinal_position = match row.values[3] {
            Value::SmallInt(position) if position > 0 => position as u16,
            _ => return Err(corrupt("invalid ordinal position")),
        };
        let nullable = text(4) != Some(NO);
        let primary_key = text(5) == Some(PRIMARY_KEY_MARKER);
        let unique = text(6) == Some(YES);

        Ok(Self {
            name: name.to_string(),
            data_type,
            ordinal_position,
            nullable,
            unique,
            primary_key,
        })
    }
}

/// A table's catalog entry together with its columns in ordinal order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableInfo {
    pub table_name: String,
    pub root_page: PageNo,
    pub last_id: RowId,
    pub record_count: u32,
    pub columns: Vec<TableCol>,
}

impl TableInfo {
    pub fn is_system(&self) -> bool {
        is_system_table(&self.table_name)
    }

    /// Index of the column called `name`, compared case-insensitively.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|col| col.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| DatabaseError::ColumnNotFound {
                name: name.to_string(),
                table: self.table_name.clone(),
            })
    }

    pub fn column(&self, name: &str) -> Result<&TableCol> {
        Ok(&self.columns[self.column_index(name)?])
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|col| col.name.as_str()).collect()
    }

    /// Field list of this table's row in the tables catalog.
    pub fn to_catalog_row(&self) -> Vec<Value> {
        vec![
            Value::Text(self.table_name.clone()),
            Value::Int(self.root_page as i32),
            Value::Int(self.last_id as i32),
            Value::Int(self.record_count as i32),
        ]
    }

    /// Rebuilds a `TableInfo` from its tables-catalog row and its column rows.
    pub fn from_catalog_rows(row: &Row, columns: Vec<TableCol>) -> Result<Self> {
        let table_name = match row.get_value(0) {
            Some(Value::Text(name)) => name.clone(),
            _ => {
                return Err(DatabaseError::CorruptCatalog {
                    table: TABLES_TABLE.to_string(),
                    reason: format!("row {} has no table name", row.row_id),
                });
            }
        };
        let counter = |index: usize, label: &str| match row.get_value(index) {
            Some(Value::Int(n)) if *n >= 0 => Ok(*n as u32),
            _ => Err(DatabaseError::CorruptCatalog {
                table: table_name.clone(),
                reason: format!("invalid {}", label),
            }),
        };
        let root_page = counter(1, "root_page")?;
        let last_id = counter(2, "last_id")?;
        let record_count = counter(3, "record_count")?;

        if columns.is_empty() {
            return Err(DatabaseError::CorruptCatalog {
                table: table_name,
                reason: "no column definitions".to_string(),
            });
        }

        Ok(Self {
            table_name,
            root_page,
            last_id,
            record_count,
            columns,
        })
    }
}

/// Numbers columns 1.. in the given order and checks the definitions.
pub fn finalize_columns(table_name: &str, columns: Vec<TableCol>) -> Result<Vec<TableCol>> {
    let invalid = |details: String| Err(DatabaseError::InvalidSchema { details });

    if columns.is_empty() {
        return invalid(format!("table '{}' must have at least one column", table_name));
    }
    if columns.len() > u8::MAX as usize {
        return invalid(format!("table '{}' has too many columns", table_name));
    }
    if columns.iter().filter(|col| col.primary_key).count() > 1 {
        return invalid(format!("table '{}' has more than one primary key", table_name));
    }
    for (i, col) in columns.iter().enumerate() {
        if col.name.trim().is_empty() {
            return invalid(format!("column {} of '{}' has no name", i + 1, table_name));
        }
        if col.data_type == DataType::Null {
            return invalid(format!("column '{}' cannot have type NULL", col.name));
        }
        if columns[..i]
            .iter()
            .any(|other| other.name.eq_ignore_ascii_case(&col.name))
        {
            return invalid(format!("duplicate column name '{}'", col.name));
        }
    }

    Ok(columns
        .into_iter()
        .enumerate()
        .map(|(i, col)| {
            let col = if col.primary_key { col.primary_key() } else { col };
            col.at(i as u16 + 1)
        })
        .collect())
}

/// Hard-coded schema of the tables catalog.
pub fn tables_catalog_columns() -> Vec<TableCol> {
    vec![
        TableCol::new("table_name", DataType::Text).unique().not_null().at(1),
        TableCol::new("root_page", DataType::Int).at(2),
        TableCol::new("last_id", DataType::Int).at(3),
        TableCol::new("record_count", DataType::Int).at(4),
    ]
}

/// Hard-coded schema of the columns catalog.
pub fn columns_catalog_columns() -> Vec<TableCol> {
    vec![
        TableCol::new("table_name", DataType::Text).at(1),
        TableCol::new("column_name", DataType::Text).at(2),
        TableCol::new("data_type", DataType::Text).at(3),
        TableCol::new("ordinal_position", DataType::SmallInt).at(4),
        TableCol::new("is_nullable", DataType::Text).at(5),
        TableCol::new("primary_key", DataType::Text).at(6),
        TableCol::new("is_unique", DataType::Text).at(7),
    ]
}

/// Rows a fresh data store starts with: one per system table in the tables
/// catalog, one per system column in the columns catalog.
pub fn bootstrap_rows() -> (Vec<Vec<Value>>, Vec<Vec<Value>>) {
    let tables_columns = tables_catalog_columns();
    let columns_columns = columns_catalog_columns();

    let seed = |name: &str, count: usize| TableInfo {
        table_name: name.to_string(),
        root_page: 0,
        last_id: count as RowId,
        record_count: count as u32,
        columns: Vec::new(),
    };
    let tables_rows = vec![
        seed(TABLES_TABLE, 2).to_catalog_row(),
        seed(COLUMNS_TABLE, tables_columns.len() + columns_columns.len()).to_catalog_row(),
    ];

    let column_rows = tables_columns
        .iter()
        .map(|col| col.to_catalog_row(TABLES_TABLE))
        .chain(
            columns_columns
                .iter()
                .map(|col| col.to_catalog_row(COLUMNS_TABLE)),
        )
        .collect();

    (tables_rows, column_rows)
}
