use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    types::{
        RECORD_HEADER_SIZE, RowId,
        error::{DatabaseError, Result},
        value::{DataType, Value},
    },
};

/// One leaf record.
///
/// Cell layout (big-endian):
/// ```text
/// payload_size u16 | row_id i32 | column_count u8 | tag u8 * n | field bytes
/// ```
/// `payload_size` counts everything after the row id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub row_id: RowId,
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(row_id: RowId, values: Vec<Value>) -> Self {
        Self { row_id, values }
    }

    pub fn get_value(&self, column_index: usize) -> Option<&Value> {
        self.values.get(column_index)
    }

    pub fn set_value(&mut self, column_index: usize, value: Value) -> Result<()> {
        if column_index >= self.values.len() {
            return Err(DatabaseError::ColumnIndexOutOfBounds {
                index: column_index,
            });
        }
        self.values[column_index] = value;
        Ok(())
    }

    /// Bytes after the row id: column count, tags and field bodies.
    pub fn payload_size(&self) -> usize {
        1 + self.values.len() + self.values.iter().map(Value::size).sum::<usize>()
    }

    /// Full cell length, header included.
    pub fn cell_size(&self) -> usize {
        RECORD_HEADER_SIZE - 1 + self.payload_size()
    }

    /// Offset of field `index` from the start of the cell.
    pub fn field_offset(&self, index: usize) -> usize {
        RECORD_HEADER_SIZE
            + self.values.len()
            + self.values[..index.min(self.values.len())]
                .iter()
                .map(Value::size)
                .sum::<usize>()
    }

    /// Offset of the type tag of field `index` from the start of the cell.
    pub fn tag_offset(index: usize) -> usize {
        RECORD_HEADER_SIZE + index
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if self.values.len() > u8::MAX as usize {
            return Err(DatabaseError::SerializationError {
                details: format!("Too many columns: {}", self.values.len()),
            });
        }
        let payload_size = self.payload_size();
        if payload_size > u16::MAX as usize {
            return Err(DatabaseError::RecordTooLarge {
                size: payload_size,
                max: u16::MAX as usize,
            });
        }

        let mut buffer = Vec::with_capacity(self.cell_size());
        buffer.extend_from_slice(&(payload_size as u16).to_be_bytes());
        buffer.extend_from_slice(&(self.row_id as i32).to_be_bytes());
        buffer.push(self.values.len() as u8);
        for value in &self.values {
            buffer.push(value.type_tag()?);
        }
        for value in &self.values {
            buffer.extend_from_slice(&value.to_bytes());
        }
        Ok(buffer)
    }

    /// Total cell length announced by the first two bytes of a cell.
    pub fn cell_size_from_prefix(prefix: [u8; 2]) -> usize {
        RECORD_HEADER_SIZE - 1 + u16::from_be_bytes(prefix) as usize
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < RECORD_HEADER_SIZE {
            return Err(DatabaseError::SerializationError {
                details: "Incomplete record header".to_string(),
            });
        }
        let cell_size = Self::cell_size_from_prefix([bytes[0], bytes[1]]);
        if bytes.len() < cell_size {
            return Err(DatabaseError::SerializationError {
                details: format!(
                    "Truncated record: expected {} bytes, got {}",
                    cell_size,
                    bytes.len()
                ),
            });
        }
        let row_id = i32::from_be_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]) as RowId;
        let column_count = bytes[6] as usize;

        let tags_end = RECORD_HEADER_SIZE + column_count;
        if tags_end > cell_size {
            return Err(DatabaseError::SerializationError {
                details: "Type tags run past the record".to_string(),
            });
        }
        let tags = &bytes[RECORD_HEADER_SIZE..tags_end];

        let mut cursor = tags_end;
        let mut values = Vec::with_capacity(column_count);
        for &tag in tags {
            let size = DataType::size_of_tag(tag).ok_or_else(|| {
                DatabaseError::SerializationError {
                    details: format!("Unknown type tag: {}", tag),
                }
            })?;
            if cursor + size > cell_size {
                return Err(DatabaseError::SerializationError {
                    details: format!("Field with tag {} runs past the record", tag),
                });
            }
            values.push(Value::from_bytes(tag, &bytes[cursor..cursor + size])?);
            cursor += size;
        }

        Ok(Row { row_id, values })
    }

    /// Display strings for the result formatter, row id first when enabled.
    pub fn display_values(&self, config: &Config) -> Vec<String> {
        let mut out = Vec::with_capacity(self.values.len() + 1);
        if config.show_row_id {
            out.push(self.row_id.to_string());
        }
        out.extend(self.values.iter().map(Value::to_string));
        out
    }
}
