use rusqlite::Connection;
use streetcode_core::db::migrations::latest_version;
use streetcode_core::db::{open_db, open_db_in_memory, DbError};

#[test]
fn in_memory_database_gets_every_table() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in ["streetcodes", "facts", "images", "arts", "streetcode_arts"] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn reopening_file_database_keeps_schema_and_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("streetcode.sqlite3");

    let first = open_db(&path).unwrap();
    first
        .execute(
            "INSERT INTO streetcodes (\"index\", title) VALUES (1, 'Kyiv');",
            [],
        )
        .unwrap();
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second), latest_version());
    let count: i64 = second
        .query_row("SELECT COUNT(*) FROM streetcodes;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 42;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 42);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn fact_numbers_must_be_positive() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO streetcodes (\"index\", title) VALUES (1, 'Kyiv');",
        [],
    )
    .unwrap();

    let result = conn.execute(
        "INSERT INTO facts (streetcode_id, number, title, fact_content)
         VALUES (1, 0, 't', 'c');",
        [],
    );
    assert!(result.is_err());
}

#[test]
fn deleting_streetcode_cascades_to_facts() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO streetcodes (\"index\", title) VALUES (1, 'Kyiv');
         INSERT INTO facts (streetcode_id, number, title, fact_content)
         VALUES (1, 1, 't', 'c');
         DELETE FROM streetcodes WHERE id = 1;",
    )
    .unwrap();

    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM facts;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
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

#[test]
fn fact_image_must_exist_and_is_cleared_with_it() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO streetcodes (\"index\", title) VALUES (1, 'Kyiv');
         INSERT INTO images (blob_name, mime_type) VALUES ('a.png', 'image/png');
         INSERT INTO facts (streetcode_id, number, title, fact_content, image_id)
         VALUES (1, 1, 't', 'c', 1);",
    )
    .unwrap();

    let dangling = conn.execute(
        "INSERT INTO facts (streetcode_id, number, title, fact_content, image_id)
         VALUES (1, 2, 't', 'c', 99);",
        [],
    );
    assert!(dangling.is_err());

    conn.execute("DELETE FROM images WHERE id = 1;", []).unwrap();
    let image_id: Option<i64> = conn
        .query_row("SELECT image_id FROM facts WHERE id = 1;", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(image_id, None);
}

#[test]
fn upgrade_keeps_facts_and_drops_dangling_image_refs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("v2.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(include_str!(
        "../src/db/migrations/0001_streetcodes_facts.sql"
    ))
    .unwrap();
    conn.execute_batch(include_str!("../src/db/migrations/0002_images_arts.sql"))
        .unwrap();
    conn.execute_batch(
        "PRAGMA user_version = 2;
         INSERT INTO streetcodes (\"index\", title) VALUES (1, 'Kyiv');
         INSERT INTO images (blob_name, mime_type) VALUES ('a.png', 'image/png');
         INSERT INTO facts (id, streetcode_id, number, title, fact_content, image_id)
         VALUES (10, 1, 1, 'kept', 'c', 1),
                (11, 1, 2, 'dangling', 'c', 42);",
    )
    .unwrap();
    drop(conn);

    let upgraded = open_db(&path).unwrap();
    assert_eq!(schema_version(&upgraded), latest_version());

    let rows = upgraded
        .prepare("SELECT id, number, image_id FROM facts ORDER BY number;")
        .unwrap()
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, Option<i64>>(2)?,
            ))
        })
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(rows, vec![(10, 1, Some(1)), (11, 2, None)]);
}
