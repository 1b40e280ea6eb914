use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::Text;

mod common;

#[derive(QueryableByName)]
struct JournalMode {
    #[diesel(sql_type = Text)]
    journal_mode: String,
}

#[test]
fn test_creates_and_removes_db_files() {
    let test_db = common::TestDb::new("test_creates_and_removes_db_files.db");
    let conn = test_db.pool().get();
    assert!(conn.is_ok());
}

#[test]
fn test_connections_use_wal_journal() {
    let test_db = common::TestDb::new("test_connections_use_wal_journal.db");
    let mut conn = test_db.pool().get().unwrap();

    let mode = sql_query("PRAGMA journal_mode")
        .get_result::<JournalMode>(&mut conn)
        .unwrap();

    assert_eq!(mode.journal_mode.to_lowercase(), "wal");
}
