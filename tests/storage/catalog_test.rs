use petak::{
    executor::predicate::Predicate,
    storage::schema::{COLUMNS_TABLE, TABLES_TABLE, TableCol},
    types::{error::DatabaseError, value::{DataType, Value}},
    utils::mock::TempDatabase,
};

#[test]
fn test_bootstrap_seeds_system_tables() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("catalog_bootstrap")?;
    let storage = &temp_db.storage_manager;

    let tables = storage.lookup_table(TABLES_TABLE)?;
    assert_eq!(tables.record_count, 2);
    assert_eq!(tables.last_id, 2);
    assert_eq!(
        tables.column_names(),
        vec!["table_name", "root_page", "last_id", "record_count"]
    );

    let columns = storage.lookup_table(COLUMNS_TABLE)?;
    assert_eq!(columns.record_count, 11);
    assert_eq!(columns.last_id, 11);
    assert_eq!(columns.columns.len(), 7);
    assert_eq!(columns.columns[3].name, "ordinal_position");
    assert_eq!(columns.columns[3].data_type, DataType::SmallInt);

    assert_eq!(storage.scan_table(TABLES_TABLE, None)?.len(), 2);
    assert_eq!(storage.scan_table(COLUMNS_TABLE, None)?.len(), 11);
    Ok(())
}

#[test]
fn test_root_pages_match_files_after_bootstrap() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("catalog_roots")?;
    let storage = &temp_db.storage_manager;

    for name in [TABLES_TABLE, COLUMNS_TABLE] {
        let info = storage.lookup_table(name)?;
        assert_eq!(info.root_page, storage.find_root(name)?);
    }
    Ok(())
}

#[test]
fn test_system_table_flags() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::new()?;
    let tables = temp_db.storage_manager.lookup_table(TABLES_TABLE)?;
    let name_col = tables.column("table_name")?;
    assert!(name_col.unique);
    assert!(!name_col.nullable);
    assert!(!name_col.primary_key);
    assert_eq!(name_col.ordinal_position, 1);
    Ok(())
}

#[test]
fn test_lookup_missing_table() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::new()?;
    match temp_db.storage_manager.lookup_table("ghost") {
        Err(DatabaseError::TableNotFound { name }) => assert_eq!(name, "ghost"),
        other => panic!("Expected TableNotFound, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_column_rows_written_for_user_table() -> Result<(), DatabaseError> {
    let mut temp_db = TempDatabase::new()?;
    let storage = &mut temp_db.storage_manager;
    storage.create_table(
        "people",
        vec![
            TableCol::new("id", DataType::Int).primary_key(),
            TableCol::new("name", DataType::Text).not_null(),
            TableCol::new("email", DataType::Text).unique(),
        ],
    )?;

    let rows = storage.scan_table(COLUMNS_TABLE, None)?;
    let people: Vec<_> = rows
        .iter()
        .filter(|row| row.values[0] == Value::Text("people".into()))
        .collect();
    assert_eq!(people.len(), 3);
    assert_eq!(
        people[0].values,
        vec![
            Value::Text("people".into()),
            Value::Text("id".into()),
            Value::Text("INT".into()),
            Value::SmallInt(1),
            Value::Text("NO".into()),
            Value::Text("PRI".into()),
            Value::Text("YES".into()),
        ]
    );
    assert_eq!(people[2].values[5], Value::Null);
    assert_eq!(people[2].values[6], Value::Text("YES".into()));

    let columns = storage.lookup_table(COLUMNS_TABLE)?;
    assert_eq!(columns.record_count, 14);
    assert_eq!(columns.last_id, 14);
    Ok(())
}

#[test]
fn test_unique_constraint_case_insensitive() -> Result<(), DatabaseError> {
    let mut temp_db = TempDatabase::new()?;
    let storage = &mut temp_db.storage_manager;
    storage.create_table(
        "users",
        vec![
            TableCol::new("id", DataType::Int),
            TableCol::new("name", DataType::Text).unique(),
        ],
    )?;

    storage.insert_row("users", vec![Value::Int(1), Value::Text("Alice".into())])?;
    let result = storage.insert_row("users", vec![Value::Int(2), Value::Text("aLiCe".into())]);
    match result {
        Err(DatabaseError::UniqueConstraintViolation { table, column, value }) => {
            assert_eq!(table, "users");
            assert_eq!(column, "name");
            assert_eq!(value, "aLiCe");
        }
        other => panic!("Expected UniqueConstraintViolation, got {:?}", other),
    }

    // NULL never conflicts.
    storage.insert_row("users", vec![Value::Int(3), Value::Null])?;
    storage.insert_row("users", vec![Value::Int(4), Value::Null])?;
    storage.insert_row("users", vec![Value::Int(5), Value::Text("Bob".into())])?;

    let info = storage.lookup_table("users")?;
    assert_eq!(info.record_count, 4);
    // The rejected insert consumed no row id.
    assert_eq!(info.last_id, 4);
    Ok(())
}

#[test]
fn test_primary_key_is_unique() -> Result<(), DatabaseError> {
    let mut temp_db = TempDatabase::new()?;
    let storage = &mut temp_db.storage_manager;
    storage.create_table(
        "items",
        vec![
            TableCol::new("sku", DataType::Int).primary_key(),
            TableCol::new("label", DataType::Text),
        ],
    )?;
    storage.insert_row("items", vec![Value::Int(7), Value::Text("a".into())])?;
    assert!(matches!(
        storage.insert_row("items", vec![Value::Int(7), Value::Text("b".into())]),
        Err(DatabaseError::UniqueConstraintViolation { .. })
    ));
    assert!(matches!(
        storage.insert_row("items", vec![Value::Null, Value::Text("c".into())]),
        Err(DatabaseError::NotNullViolation { .. })
    ));
    Ok(())
}

#[test]
fn test_duplicates_allowed_without_unique() -> Result<(), DatabaseError> {
    let mut temp_db = TempDatabase::new()?;
    let storage = &mut temp_db.storage_manager;
    storage.create_table(
        "people",
        vec![
            TableCol::new("id", DataType::Int),
            TableCol::new("name", DataType::Text),
        ],
    )?;

    assert_eq!(storage.insert_row("people", vec![Value::Int(1), Value::Text("ann".into())])?, 1);
    assert_eq!(storage.insert_row("people", vec![Value::Int(2), Value::Text("ann".into())])?, 2);
    assert_eq!(storage.insert_row("people", vec![Value::Int(2), Value::Text("ANN".into())])?, 3);

    let rows = storage.scan_table("people", Some(&Predicate::eq_ignore_case("name", "ann")))?;
    assert_eq!(rows.len(), 3);
    assert_eq!(storage.lookup_table("people")?.record_count, 3);
    Ok(())
}

#[test]
fn test_system_tables_reject_row_changes() -> Result<(), DatabaseError> {
    let mut temp_db = TempDatabase::new()?;
    temp_db.create_simple_table("notes")?;
    let storage = &mut temp_db.storage_manager;

    for name in [TABLES_TABLE, COLUMNS_TABLE] {
        match storage.insert_row(name, vec![Value::Text("x".into())]) {
            Err(DatabaseError::SystemTable { name: refused }) => assert_eq!(refused, name),
            other => panic!("Expected SystemTable, got {:?}", other),
        }
        assert!(matches!(
            storage.insert_values(name, &[("table_name", "x")]),
            Err(DatabaseError::SystemTable { .. })
        ));
        assert!(matches!(
            storage.delete_matching_rows(name, None),
            Err(DatabaseError::SystemTable { .. })
        ));
    }
    assert!(matches!(
        storage.update_matching_rows(
            TABLES_TABLE,
            Some(&Predicate::equals("table_name", "notes")),
            &[("record_count", Value::Int(99))]
        ),
        Err(DatabaseError::SystemTable { .. })
    ));
    assert!(matches!(
        storage.create_inserter(COLUMNS_TABLE),
        Err(DatabaseError::SystemTable { .. })
    ));

    // The catalog itself still keeps its rows current.
    assert_eq!(storage.lookup_table(TABLES_TABLE)?.record_count, 3);
    assert_eq!(storage.lookup_table(COLUMNS_TABLE)?.record_count, 13);
    storage.insert_row("notes", vec![Value::Int(1), Value::Null])?;
    assert_eq!(storage.lookup_table("notes")?.record_count, 1);
    storage.drop_table("notes")?;
    assert_eq!(storage.lookup_table(TABLES_TABLE)?.record_count, 2);
    assert_eq!(storage.lookup_table(COLUMNS_TABLE)?.record_count, 11);
    Ok(())
}

#[test]
fn test_counters_survive_reopen() -> Result<(), DatabaseError> {
    let mut temp_db = TempDatabase::new()?;
    temp_db.create_simple_table("notes")?;
    for i in 1..=3 {
        temp_db
            .storage_manager
            .insert_row("notes", vec![Value::Int(i), Value::Text(format!("n{}", i))])?;
    }

    let storage = temp_db.reopen()?;
    let info = storage.lookup_table("notes")?;
    assert_eq!(info.record_count, 3);
    assert_eq!(info.last_id, 3);
    assert_eq!(info.root_page, 0);
    assert_eq!(storage.insert_row("notes", vec![Value::Int(4), Value::Null])?, 4);
    Ok(())
}

#[test]
fn test_root_page_recorded_after_split() -> Result<(), DatabaseError> {
    let mut temp_db = TempDatabase::new()?;
    temp_db.create_simple_table("big")?;
    let storage = &mut temp_db.storage_manager;
    for i in 1..=60 {
        storage.insert_row("big", vec![Value::Int(i), Value::Text("some text".into())])?;
    }
    let info = storage.lookup_table("big")?;
    assert_ne!(info.root_page, 0);
    assert_eq!(info.root_page, storage.find_root("big")?);
    Ok(())
}

#[test]
fn test_table_names() -> Result<(), DatabaseError> {
    let mut temp_db = TempDatabase::new()?;
    temp_db.create_simple_table("alpha")?;
    temp_db.create_simple_table("beta")?;
    assert_eq!(
        temp_db.storage_manager.table_names()?,
        vec![TABLES_TABLE, COLUMNS_TABLE, "alpha", "beta"]
    );
    Ok(())
}
