use petak::{
    executor::predicate::Predicate,
    storage::schema::TableCol,
    types::{
        RowId,
        error::DatabaseError,
        value::{DataType, Value},
    },
    utils::mock::TempDatabase,
};

fn seeded(labels: &[&str]) -> Result<TempDatabase, DatabaseError> {
    let mut temp_db = TempDatabase::new()?;
    temp_db.create_simple_table("t")?;
    for (i, label) in labels.iter().enumerate() {
        temp_db
            .storage_manager
            .insert_row("t", vec![Value::Int(i as i32 + 1), Value::Text(label.to_string())])?;
    }
    Ok(temp_db)
}

fn row_ids(temp_db: &TempDatabase) -> Result<Vec<RowId>, DatabaseError> {
    Ok(temp_db
        .storage_manager
        .scan_table("t", None)?
        .iter()
        .map(|row| row.row_id)
        .collect())
}

#[test]
fn test_fixed_width_update_is_in_place() -> Result<(), DatabaseError> {
    let mut temp_db = seeded(&["a", "b", "c"])?;
    let updated = temp_db.storage_manager.update_matching_rows(
        "t",
        Some(&Predicate::equals("id", "2")),
        &[("id", Value::Int(20))],
    )?;
    assert_eq!(updated, 1);

    let rows = temp_db.storage_manager.scan_table("t", None)?;
    assert_eq!(row_ids(&temp_db)?, vec![1, 2, 3]);
    assert_eq!(rows[1].values, vec![Value::Int(20), Value::Text("b".into())]);

    let info = temp_db.storage_manager.lookup_table("t")?;
    assert_eq!(info.last_id, 3);
    assert_eq!(info.record_count, 3);
    Ok(())
}

#[test]
fn test_same_length_text_is_in_place() -> Result<(), DatabaseError> {
    let mut temp_db = seeded(&["cat", "dog"])?;
    temp_db.storage_manager.update_matching_rows(
        "t",
        Some(&Predicate::equals("label", "dog")),
        &[("label", Value::Text("owl".into()))],
    )?;
    assert_eq!(row_ids(&temp_db)?, vec![1, 2]);
    let rows = temp_db.storage_manager.scan_table("t", None)?;
    assert_eq!(rows[1].values[1], Value::Text("owl".into()));
    Ok(())
}

#[test]
fn test_growing_text_reinserts_with_new_id() -> Result<(), DatabaseError> {
    let mut temp_db = seeded(&["one", "two", "six"])?;
    let updated = temp_db.storage_manager.update_matching_rows(
        "t",
        Some(&Predicate::equals("id", "2")),
        &[("label", Value::Text("twenty-two".into()))],
    )?;
    assert_eq!(updated, 1);
    assert_eq!(row_ids(&temp_db)?, vec![1, 3, 4]);

    let rows = temp_db.storage_manager.scan_table("t", None)?;
    assert_eq!(
        rows[2].values,
        vec![Value::Int(2), Value::Text("twenty-two".into())]
    );

    let info = temp_db.storage_manager.lookup_table("t")?;
    assert_eq!(info.last_id, 4);
    assert_eq!(info.record_count, 3);
    Ok(())
}

#[test]
fn test_update_all_rows_visits_each_once() -> Result<(), DatabaseError> {
    let mut temp_db = seeded(&["a", "b", "c", "d"])?;
    let updated = temp_db.storage_manager.update_matching_rows(
        "t",
        None,
        &[("label", Value::Text("longer".into()))],
    )?;
    assert_eq!(updated, 4);
    assert_eq!(row_ids(&temp_db)?, vec![5, 6, 7, 8]);

    let rows = temp_db.storage_manager.scan_table("t", None)?;
    let ids: Vec<Value> = rows.iter().map(|r| r.values[0].clone()).collect();
    assert_eq!(
        ids,
        vec![Value::Int(1), Value::Int(2), Value::Int(3), Value::Int(4)]
    );
    assert!(rows.iter().all(|r| r.values[1] == Value::Text("longer".into())));

    let info = temp_db.storage_manager.lookup_table("t")?;
    assert_eq!(info.record_count, 4);
    assert_eq!(info.last_id, 8);
    Ok(())
}

#[test]
fn test_null_to_value_reinserts() -> Result<(), DatabaseError> {
    let mut temp_db = TempDatabase::new()?;
    temp_db.create_simple_table("t")?;
    let storage = &mut temp_db.storage_manager;
    storage.insert_row("t", vec![Value::Int(1), Value::Null])?;
    storage.insert_row("t", vec![Value::Int(2), Value::Null])?;

    let updated = storage.update_matching_rows(
        "t",
        Some(&Predicate::equals("label", "NULL")),
        &[("label", Value::Text("x".into()))],
    )?;
    assert_eq!(updated, 2);
    let ids: Vec<RowId> = storage.scan_table("t", None)?.iter().map(|r| r.row_id).collect();
    assert_eq!(ids, vec![3, 4]);
    Ok(())
}

#[test]
fn test_update_coerces_and_validates() -> Result<(), DatabaseError> {
    let mut temp_db = TempDatabase::new()?;
    temp_db.storage_manager.create_table(
        "strict",
        vec![
            TableCol::new("code", DataType::SmallInt).not_null(),
            TableCol::new("note", DataType::Text),
        ],
    )?;
    let storage = &mut temp_db.storage_manager;
    storage.insert_row("strict", vec![Value::SmallInt(1), Value::Null])?;

    storage.update_matching_rows("strict", None, &[("CODE", Value::Text("9".into()))])?;
    let row = storage.scan_table("strict", None)?.remove(0);
    assert_eq!(row.values[0], Value::SmallInt(9));
    assert_eq!(row.row_id, 1);

    assert!(matches!(
        storage.update_matching_rows("strict", None, &[("code", Value::Null)]),
        Err(DatabaseError::NotNullViolation { .. })
    ));
    assert!(matches!(
        storage.update_matching_rows("strict", None, &[("code", Value::Text("many".into()))]),
        Err(DatabaseError::TypeConversion { .. })
    ));
    assert!(matches!(
        storage.update_matching_rows("strict", None, &[("nothing", Value::Int(1))]),
        Err(DatabaseError::ColumnNotFound { .. })
    ));
    assert!(matches!(
        storage.update_matching_rows(
            "strict",
            Some(&Predicate::equals("nothing", "1")),
            &[("code", Value::Int(2))]
        ),
        Err(DatabaseError::ColumnNotFound { .. })
    ));
    Ok(())
}

#[test]
fn test_update_without_matches() -> Result<(), DatabaseError> {
    let mut temp_db = seeded(&["a"])?;
    let updated = temp_db.storage_manager.update_matching_rows(
        "t",
        Some(&Predicate::equals("label", "zzz")),
        &[("label", Value::Text("much longer".into()))],
    )?;
    assert_eq!(updated, 0);
    assert_eq!(row_ids(&temp_db)?, vec![1]);
    Ok(())
}

#[test]
fn test_reinsert_across_split() -> Result<(), DatabaseError> {
    let labels: Vec<String> = (0..40).map(|i| format!("r{:02}", i)).collect();
    let refs: Vec<&str> = labels.iter().map(String::as_str).collect();
    let mut temp_db = seeded(&refs)?;
    let leaves_before = temp_db.storage_manager.list_leaves("t")?.len();

    let updated = temp_db.storage_manager.update_matching_rows(
        "t",
        None,
        &[("label", Value::Text("a considerably longer label".into()))],
    )?;
    assert_eq!(updated, 40);
    assert!(temp_db.storage_manager.list_leaves("t")?.len() > leaves_before);

    let rows = temp_db.storage_manager.scan_table("t", None)?;
    assert_eq!(rows.len(), 40);
    let ids: Vec<RowId> = rows.iter().map(|r| r.row_id).collect();
    assert_eq!(ids, (41..=80).collect::<Vec<RowId>>());

    let info = temp_db.storage_manager.lookup_table("t")?;
    assert_eq!(info.last_id, 80);
    assert_eq!(info.record_count, 40);
    Ok(())
}

fn keyed_table() -> Result<TempDatabase, DatabaseError> {
    let mut temp_db = TempDatabase::new()?;
    temp_db.storage_manager.create_table(
        "keyed",
        vec![
            TableCol::new("id", DataType::Int).primary_key(),
            TableCol::new("name", DataType::Text).unique(),
        ],
    )?;
    let storage = &mut temp_db.storage_manager;
    storage.insert_row("keyed", vec![Value::Int(1), Value::Text("ann".into())])?;
    storage.insert_row("keyed", vec![Value::Int(3), Value::Text("bo".into())])?;
    Ok(temp_db)
}

fn keyed_values(temp_db: &TempDatabase) -> Result<Vec<(RowId, Vec<Value>)>, DatabaseError> {
    Ok(temp_db
        .storage_manager
        .scan_table("keyed", None)?
        .into_iter()
        .map(|row| (row.row_id, row.values))
        .collect())
}

#[test]
fn test_update_primary_key_to_taken_value() -> Result<(), DatabaseError> {
    let mut temp_db = keyed_table()?;
    let before = keyed_values(&temp_db)?;

    let result = temp_db.storage_manager.update_matching_rows(
        "keyed",
        Some(&Predicate::equals("id", "3")),
        &[("id", Value::Int(1))],
    );
    match result {
        Err(DatabaseError::UniqueConstraintViolation { table, column, value }) => {
            assert_eq!(table, "keyed");
            assert_eq!(column, "id");
            assert_eq!(value, "1");
        }
        other => panic!("Expected UniqueConstraintViolation, got {:?}", other),
    }
    assert_eq!(keyed_values(&temp_db)?, before);
    Ok(())
}

#[test]
fn test_update_unique_text_that_moves_the_row() -> Result<(), DatabaseError> {
    let mut temp_db = keyed_table()?;
    let before = keyed_values(&temp_db)?;

    // "bo" -> "ANN" changes width, so the row would be reinserted.
    assert!(matches!(
        temp_db.storage_manager.update_matching_rows(
            "keyed",
            Some(&Predicate::equals("id", "3")),
            &[("name", Value::Text("ANN".into()))],
        ),
        Err(DatabaseError::UniqueConstraintViolation { .. })
    ));
    assert_eq!(keyed_values(&temp_db)?, before);

    let info = temp_db.storage_manager.lookup_table("keyed")?;
    assert_eq!(info.last_id, 2);
    assert_eq!(info.record_count, 2);
    Ok(())
}

#[test]
fn test_update_unique_column_to_own_or_free_value() -> Result<(), DatabaseError> {
    let mut temp_db = keyed_table()?;
    let storage = &mut temp_db.storage_manager;

    let same = storage.update_matching_rows(
        "keyed",
        Some(&Predicate::equals("id", "1")),
        &[("id", Value::Int(1)), ("name", Value::Text("Ann".into()))],
    )?;
    assert_eq!(same, 1);

    let moved = storage.update_matching_rows(
        "keyed",
        Some(&Predicate::equals("id", "3")),
        &[("id", Value::Int(2)), ("name", Value::Text("bea".into()))],
    )?;
    assert_eq!(moved, 1);

    let rows = storage.scan_table("keyed", None)?;
    assert_eq!(rows[0].values, vec![Value::Int(1), Value::Text("Ann".into())]);
    assert_eq!(rows[1].values, vec![Value::Int(2), Value::Text("bea".into())]);
    Ok(())
}

#[test]
fn test_update_many_rows_to_one_unique_value() -> Result<(), DatabaseError> {
    let mut temp_db = keyed_table()?;
    assert!(matches!(
        temp_db
            .storage_manager
            .update_matching_rows("keyed", None, &[("name", Value::Text("cyd".into()))]),
        Err(DatabaseError::UniqueConstraintViolation { .. })
    ));
    let names: Vec<Value> = keyed_values(&temp_db)?
        .into_iter()
        .map(|(_, values)| values[1].clone())
        .collect();
    // Rows are written one at a time, so the first row already changed.
    assert_eq!(names, vec![Value::Text("cyd".into()), Value::Text("bo".into())]);
    Ok(())
}
