use catalog::{CatalogParams, Phase, StatementCatalog};
use common::types::{UserDedup, WarehouseDialect};
use executor::{Pipeline, QualityChecker, RunReport, RunState, SchemaManager};
use shared_clients::postgres::PostgresAdapter;
use shared_clients::AsyncDatabaseAdapter;
use std::time::Duration;
use test_utils::{setup_postgres, PgTestContainer};
use tokio::time::sleep;

const MUSE_EVENT: &str = "\
INSERT INTO staging_events (artist, auth, firstName, gender, itemInSession, lastName, length,
    level, location, method, page, registration, sessionId, song, status, ts, userAgent, userId)
VALUES ('Muse', 'Logged In', 'Jacob', 'M', 0, 'Klein', 227.3, 'free', 'Tampa, FL', 'PUT',
    'NextSong', 1540558108796, 954, 'Hysteria', 200, '2018-11-01 21:05:52', 'Mozilla/5.0', 10)";

const LATER_PAID_EVENT: &str = "\
INSERT INTO staging_events (artist, auth, firstName, gender, itemInSession, lastName, length,
    level, location, method, page, registration, sessionId, song, status, ts, userAgent, userId)
VALUES (NULL, 'Logged In', 'Jacob', 'M', 1, 'Klein', NULL, 'paid', 'Tampa, FL', 'GET',
    'Home', 1540558108796, 1020, NULL, 200, '2018-11-20 08:15:00', 'Mozilla/5.0', 10)";

const HYSTERIA_SONG: &str = "\
INSERT INTO staging_songs (song_id, num_songs, title, artist_name, artist_latitude, year,
    duration, artist_id, artist_longitude, artist_location)
VALUES ('S1', 1, 'Hysteria', 'Muse', 50.5, 2003, 227.3, 'A1', -3.5, 'Teignmouth')";

async fn connect(pg: &PgTestContainer) -> anyhow::Result<PostgresAdapter> {
    let mut last_err = None;
    // the image restarts once after init, so the first ready message can be early
    for _ in 0..10 {
        match PostgresAdapter::new(pg.host, pg.port, pg.db_name, pg.user, pg.password).await {
            Ok(adapter) => return Ok(adapter),
            Err(e) => {
                last_err = Some(e);
                sleep(Duration::from_millis(500)).await;
            }
        }
    }
    Err(anyhow::anyhow!("postgres never accepted connections: {last_err:?}"))
}

fn catalog(user_dedup: UserDedup) -> anyhow::Result<StatementCatalog> {
    Ok(StatementCatalog::build(&CatalogParams {
        dialect: WarehouseDialect::Postgres,
        user_dedup,
        sources: None,
    })?)
}

async fn prepare(
    adapter: &mut PostgresAdapter,
    catalog: &StatementCatalog,
    rows: &[&str],
) -> anyhow::Result<()> {
    SchemaManager::new(catalog)
        .reset(adapter, &mut RunReport::new())
        .await?;
    for row in rows {
        adapter.execute(row).await?;
    }
    Ok(())
}

async fn count(adapter: &PostgresAdapter, sql: &str) -> anyhow::Result<i64> {
    let rows = adapter.query(sql).await?;
    rows.first()
        .and_then(|r| r.get_i64(0).transpose())
        .transpose()?
        .ok_or_else(|| anyhow::anyhow!("no rows for {sql}"))
}

#[tokio::test]
#[ignore = "requires docker"]
async fn single_event_builds_one_row_per_table() -> anyhow::Result<()> {
    let pg = setup_postgres().await.map_err(|e| anyhow::anyhow!("{e}"))?;
    let mut adapter = connect(&pg).await?;
    let catalog = catalog(UserDedup::Distinct)?;
    prepare(&mut adapter, &catalog, &[MUSE_EVENT, HYSTERIA_SONG]).await?;

    let mut report = RunReport::new();
    Pipeline::new(&catalog).run(&mut adapter, &mut report).await?;
    assert_eq!(report.state, RunState::Done);

    for table in ["fact_songplay", "dim_users", "dim_songs", "dim_artists", "dim_time"] {
        let rows = count(&adapter, &format!("SELECT COUNT(*) FROM {table}")).await?;
        assert_eq!(rows, 1, "{table}");
    }

    let fact = adapter
        .query("SELECT user_id, song_id, artist_id, session_id FROM fact_songplay")
        .await?;
    assert_eq!(fact[0].get(0), Some("10"));
    assert_eq!(fact[0].get(1), Some("S1"));
    assert_eq!(fact[0].get(2), Some("A1"));
    assert_eq!(fact[0].get(3), Some("954"));

    let time = adapter.query("SELECT hour, weekday FROM dim_time").await?;
    assert_eq!(time[0].get_i64(0)?, Some(21));
    assert_eq!(time[0].get_i64(1)?, Some(4));

    let quality = QualityChecker::run(&adapter).await?;
    assert!(quality.is_strictly_clean(), "{:?}", quality.problems(true));
    Ok(())
}

#[tokio::test]
#[ignore = "requires docker"]
async fn user_dedup_strategies() -> anyhow::Result<()> {
    let pg = setup_postgres().await.map_err(|e| anyhow::anyhow!("{e}"))?;
    let mut adapter = connect(&pg).await?;

    let distinct = catalog(UserDedup::Distinct)?;
    prepare(
        &mut adapter,
        &distinct,
        &[MUSE_EVENT, LATER_PAID_EVENT, HYSTERIA_SONG],
    )
    .await?;
    Pipeline::new(&distinct)
        .run(&mut adapter, &mut RunReport::new())
        .await?;

    // a level change leaves the same user_id on two rows
    let users = count(&adapter, "SELECT COUNT(*) FROM dim_users WHERE user_id = '10'").await?;
    assert_eq!(users, 2);
    let quality = QualityChecker::run(&adapter).await?;
    assert_eq!(quality.duplicate_user_ids, 1);
    assert!(quality.is_clean());
    assert!(!quality.is_strictly_clean());

    let latest = catalog(UserDedup::LatestLevel)?;
    prepare(
        &mut adapter,
        &latest,
        &[MUSE_EVENT, LATER_PAID_EVENT, HYSTERIA_SONG],
    )
    .await?;
    Pipeline::new(&latest)
        .run(&mut adapter, &mut RunReport::new())
        .await?;

    let rows = adapter
        .query("SELECT level FROM dim_users WHERE user_id = '10'")
        .await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get(0), Some("paid"));

    // the unmatched second event still lands in dim_time but not in the fact table
    assert_eq!(count(&adapter, "SELECT COUNT(*) FROM dim_time").await?, 2);
    assert_eq!(count(&adapter, "SELECT COUNT(*) FROM fact_songplay").await?, 1);
    Ok(())
}

#[tokio::test]
#[ignore = "requires docker"]
async fn warehouse_error_stops_the_run() -> anyhow::Result<()> {
    let pg = setup_postgres().await.map_err(|e| anyhow::anyhow!("{e}"))?;
    let mut adapter = connect(&pg).await?;
    let catalog = catalog(UserDedup::Distinct)?;
    prepare(&mut adapter, &catalog, &[MUSE_EVENT, HYSTERIA_SONG]).await?;
    adapter.execute("DROP TABLE dim_songs").await?;

    let mut report = RunReport::new();
    let err = Pipeline::new(&catalog)
        .run(&mut adapter, &mut report)
        .await
        .unwrap_err();

    assert_eq!(err.failed_target(), Some(catalog::Table::DimSongs));
    assert!(err.to_string().contains("dim_songs"));
    assert_eq!(report.state, RunState::Failed);
    let committed = report
        .phase(Phase::Transform)
        .map(|t| t.target.as_str())
        .collect::<Vec<_>>();
    assert_eq!(committed, vec!["fact_songplay", "dim_users"]);
    // fact and users committed before the failure and stay committed
    assert_eq!(count(&adapter, "SELECT COUNT(*) FROM dim_users").await?, 1);
    assert_eq!(count(&adapter, "SELECT COUNT(*) FROM dim_artists").await?, 0);
    Ok(())
}

const UNKNOWN_ARTIST_SONG: &str = "\
INSERT INTO staging_songs (song_id, num_songs, title, artist_name, artist_latitude, year,
    duration, artist_id, artist_longitude, artist_location)
VALUES ('S1', 1, 'Hysteria', 'Muse', NULL, 2003, 227.3, NULL, NULL, NULL)";

#[tokio::test]
#[ignore = "requires docker"]
async fn null_artist_ids_still_match_their_song() -> anyhow::Result<()> {
    let pg = setup_postgres().await.map_err(|e| anyhow::anyhow!("{e}"))?;
    let mut adapter = connect(&pg).await?;
    let catalog = catalog(UserDedup::Distinct)?;
    prepare(&mut adapter, &catalog, &[MUSE_EVENT, UNKNOWN_ARTIST_SONG]).await?;

    Pipeline::new(&catalog)
        .run(&mut adapter, &mut RunReport::new())
        .await?;
    let nulls = count(
        &adapter,
        "SELECT COUNT(*) FROM fact_songplay WHERE artist_id IS NULL",
    )
    .await?;
    assert_eq!(nulls, 1);

    let quality = QualityChecker::run(&adapter).await?;
    assert_eq!(quality.unmatched_fact_rows, 0);
    Ok(())
}
