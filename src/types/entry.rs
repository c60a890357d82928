use crate::types::{
    PageNo, ROUTING_ENTRY_SIZE, RowId,
    error::{DatabaseError, Result},
};

/// Interior routing entry: every row id in `left_child`'s subtree is at most
/// `max_row_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub left_child: PageNo,
    pub max_row_id: RowId,
}

impl Entry {
    pub fn new(left_child: PageNo, max_row_id: RowId) -> Self {
        Self {
            left_child,
            max_row_id,
        }
    }

    pub fn to_bytes(&self) -> [u8; ROUTING_ENTRY_SIZE] {
        let mut bytes = [0u8; ROUTING_ENTRY_SIZE];
        bytes[0..4].copy_from_slice(&(self.left_child as i32).to_be_bytes());
        bytes[4..8].copy_from_slice(&(self.max_row_id as i32).to_be_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < ROUTING_ENTRY_SIZE {
            return Err(DatabaseError::SerializationError {
                details: "Insufficient bytes for Entry".to_string(),
            });
        }
        let left_child = i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if left_child < 0 {
            return Err(DatabaseError::SerializationError {
                details: format!("Negative child pointer {} in routing entry", left_child),
            });
        }
        let max_row_id = i32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        Ok(Self::new(left_child as PageNo, max_row_id as RowId))
    }
}
