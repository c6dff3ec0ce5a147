use configs::DatabaseConfig;
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};

use crate::db::Db;

#[tokio::test]
async fn reader_falls_back_to_primary_without_replicas() -> anyhow::Result<()> {
    let cfg = DatabaseConfig { primary_url: "sqlite::memory:".into(), ..Default::default() };
    let db = Db::connect(&cfg).await?;
    assert_eq!(db.replica_count(), 0);

    let row = db
        .reader()
        .query_one(Statement::from_string(DatabaseBackend::Sqlite, "SELECT 1 AS one".to_string()))
        .await?;
    assert!(row.is_some());
    Ok(())
}

#[tokio::test]
async fn reader_round_robins_over_replicas() -> anyhow::Result<()> {
    let cfg = DatabaseConfig {
        primary_url: "sqlite::memory:".into(),
        secondary_urls: vec!["sqlite::memory:".into(), "sqlite::memory:".into()],
        max_connections: 1,
        ..Default::default()
    };
    let db = Db::connect(&cfg).await?;
    assert_eq!(db.replica_count(), 2);

    // Each in-memory database is private, so a table created through one
    // replica is only visible when the cursor comes back to it.
    db.reader()
        .execute_unprepared("CREATE TABLE marker (id INTEGER)")
        .await?;
    let other = db.reader().execute_unprepared("SELECT * FROM marker").await;
    assert!(other.is_err());
    let same = db.reader().execute_unprepared("SELECT * FROM marker").await;
    assert!(same.is_ok());
    Ok(())
}

#[tokio::test]
async fn writer_is_never_a_replica() -> anyhow::Result<()> {
    let cfg = DatabaseConfig {
        primary_url: "sqlite::memory:".into(),
        secondary_urls: vec!["sqlite::memory:".into()],
        max_connections: 1,
        ..Default::default()
    };
    let db = Db::connect(&cfg).await?;
    db.writer().execute_unprepared("CREATE TABLE only_primary (id INTEGER)").await?;
    assert!(db.writer().execute_unprepared("SELECT * FROM only_primary").await.is_ok());
    assert!(db.reader().execute_unprepared("SELECT * FROM only_primary").await.is_err());
    Ok(())
}
