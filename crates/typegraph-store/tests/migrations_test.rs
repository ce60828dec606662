// Integration tests for the migration framework

use rusqlite::Connection;

fn setup_test_db() -> Connection {
    Connection::open_in_memory().expect("Failed to create in-memory database")
}

fn get_table_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap()
}

#[test]
fn test_apply_migrations_on_empty_db() {
    // Given: An empty SQLite database
    let mut conn = setup_test_db();

    // When: Migrations are applied
    let result = typegraph_store::migrations::apply_migrations(&mut conn);

    // Then: All migrations succeed
    assert!(
        result.is_ok(),
        "Migrations should succeed: {:?}",
        result.err()
    );

    // And: The expected tables exist
    let tables = get_table_names(&conn);
    assert_eq!(tables, vec!["entity_types", "schema_version"]);
}

#[test]
fn test_migration_recorded_with_checksum() {
    let mut conn = setup_test_db();
    typegraph_store::migrations::apply_migrations(&mut conn).unwrap();

    let (migration_id, checksum): (String, String) = conn
        .query_row(
            "SELECT migration_id, checksum FROM schema_version",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();

    assert_eq!(migration_id, "001_entity_types");
    assert_eq!(checksum.len(), 64);
}

#[test]
fn test_migration_idempotency() {
    // Given: A database with migrations already applied
    let mut conn = setup_test_db();
    typegraph_store::migrations::apply_migrations(&mut conn).unwrap();

    // When: Migrations are applied again
    let result = typegraph_store::migrations::apply_migrations(&mut conn);

    // Then: No error and no duplicate version rows
    assert!(result.is_ok());
    let version_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version_count, 1);
}

#[test]
fn test_unique_key_per_workspace_enforced() {
    let mut conn = setup_test_db();
    typegraph_store::migrations::apply_migrations(&mut conn).unwrap();

    let insert = "INSERT INTO entity_types (id, workspace_id, key, deleted, body, created_at, updated_at)
                  VALUES (?1, ?2, 'Employee', 0, '{}', 0, 0)";
    conn.execute(insert, ["et-1", "ws-1"]).unwrap();
    conn.execute(insert, ["et-2", "ws-2"]).unwrap();

    assert!(conn.execute(insert, ["et-3", "ws-1"]).is_err());
}
