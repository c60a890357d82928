use petak::{
    executor::predicate::Predicate,
    types::{RowId, error::DatabaseError, value::Value},
    utils::mock::TempDatabase,
};

fn seeded(count: i32) -> Result<TempDatabase, DatabaseError> {
    let mut temp_db = TempDatabase::new()?;
    temp_db.create_simple_table("t")?;
    for i in 1..=count {
        let label = if i % 3 == 0 { "fizz" } else { "plain" };
        temp_db
            .storage_manager
            .insert_row("t", vec![Value::Int(i), Value::Text(label.into())])?;
    }
    Ok(temp_db)
}

fn remaining_ids(temp_db: &TempDatabase) -> Result<Vec<RowId>, DatabaseError> {
    Ok(temp_db
        .storage_manager
        .scan_table("t", None)?
        .iter()
        .map(|row| row.row_id)
        .collect())
}

#[test]
fn test_delete_matching_rows() -> Result<(), DatabaseError> {
    let mut temp_db = seeded(9)?;
    let deleted = temp_db
        .storage_manager
        .delete_matching_rows("t", Some(&Predicate::equals("label", "fizz")))?;
    assert_eq!(deleted, 3);
    assert_eq!(remaining_ids(&temp_db)?, vec![1, 2, 4, 5, 7, 8]);

    let info = temp_db.storage_manager.lookup_table("t")?;
    assert_eq!(info.record_count, 6);
    assert_eq!(info.last_id, 9);
    Ok(())
}

#[test]
fn test_delete_consecutive_rows_in_one_leaf() -> Result<(), DatabaseError> {
    let mut temp_db = seeded(6)?;
    let in_middle = Predicate::new("id", |field| matches!(field, "2" | "3" | "4"));
    let deleted = temp_db
        .storage_manager
        .delete_matching_rows("t", Some(&in_middle))?;
    assert_eq!(deleted, 3);
    assert_eq!(remaining_ids(&temp_db)?, vec![1, 5, 6]);
    Ok(())
}

#[test]
fn test_delete_across_leaves() -> Result<(), DatabaseError> {
    let mut temp_db = seeded(90)?;
    assert!(temp_db.storage_manager.list_leaves("t")?.len() > 2);

    let deleted = temp_db
        .storage_manager
        .delete_matching_rows("t", Some(&Predicate::equals("label", "plain")))?;
    assert_eq!(deleted, 60);
    let expected: Vec<RowId> = (1..=90).filter(|i| i % 3 == 0).collect();
    assert_eq!(remaining_ids(&temp_db)?, expected);
    assert_eq!(temp_db.storage_manager.lookup_table("t")?.record_count, 30);
    Ok(())
}

#[test]
fn test_delete_all_keeps_ids_monotonic() -> Result<(), DatabaseError> {
    let mut temp_db = seeded(3)?;
    let deleted = temp_db.storage_manager.delete_matching_rows("t", None)?;
    assert_eq!(deleted, 3);
    assert!(remaining_ids(&temp_db)?.is_empty());
    assert_eq!(temp_db.storage_manager.lookup_table("t")?.record_count, 0);

    let id = temp_db
        .storage_manager
        .insert_row("t", vec![Value::Int(4), Value::Null])?;
    assert_eq!(id, 4);
    assert_eq!(remaining_ids(&temp_db)?, vec![4]);
    Ok(())
}

#[test]
fn test_delete_persists_across_reopen() -> Result<(), DatabaseError> {
    let mut temp_db = seeded(5)?;
    temp_db
        .storage_manager
        .delete_matching_rows("t", Some(&Predicate::equals("id", "1")))?;

    let storage = temp_db.reopen()?;
    let info = storage.lookup_table("t")?;
    assert_eq!(info.record_count, 4);
    assert_eq!(info.last_id, 5);
    let ids: Vec<RowId> = storage.scan_table("t", None)?.iter().map(|r| r.row_id).collect();
    assert_eq!(ids, vec![2, 3, 4, 5]);
    assert_eq!(storage.insert_row("t", vec![Value::Int(6), Value::Null])?, 6);
    Ok(())
}

#[test]
fn test_delete_from_empty_table() -> Result<(), DatabaseError> {
    let mut temp_db = seeded(0)?;
    assert_eq!(temp_db.storage_manager.delete_matching_rows("t", None)?, 0);
    let info = temp_db.storage_manager.lookup_table("t")?;
    assert_eq!(info.record_count, 0);
    assert_eq!(info.last_id, 0);
    Ok(())
}

#[test]
fn test_delete_errors() -> Result<(), DatabaseError> {
    let mut temp_db = seeded(2)?;
    assert!(matches!(
        temp_db
            .storage_manager
            .delete_matching_rows("t", Some(&Predicate::equals("ghost", "1"))),
        Err(DatabaseError::ColumnNotFound { .. })
    ));
    assert!(matches!(
        temp_db.storage_manager.delete_matching_rows("nope", None),
        Err(DatabaseError::TableNotFound { .. })
    ));
    assert_eq!(remaining_ids(&temp_db)?.len(), 2);
    Ok(())
}
