use onboard_core::db::migrations::latest_version;
use onboard_core::db::{open_db, open_db_in_memory, DbError};
use onboard_core::{SessionStorage, SqliteSessionStorage, TOKEN_KEY};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "client_storage");
}

#[test]
fn reopening_the_same_file_keeps_schema_and_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("client.db");

    let storage = SqliteSessionStorage::open(&path).unwrap();
    storage.write(TOKEN_KEY, "first").unwrap();
    storage.write(TOKEN_KEY, "second").unwrap();
    drop(storage);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM client_storage;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);

    let reopened = SqliteSessionStorage::from_connection(conn);
    assert_eq!(reopened.read(TOKEN_KEY).unwrap().as_deref(), Some("second"));
    reopened.remove(TOKEN_KEY).unwrap();
    reopened.remove(TOKEN_KEY).unwrap();
    assert_eq!(reopened.read(TOKEN_KEY).unwrap(), None);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
