//! Integration tests against a real MySQL server.
//!
//! Run with: cargo nextest run -p rowmap --features test-mysql --test mysql_integration
//!
//! Note: Requires Docker to be running.

#![cfg(feature = "test-mysql")]

use chrono::NaiveDate;
use rowmap::config::MySqlConfig;
use rowmap::{
    Config, Executor, MySqlStore, ObjectId, Store, Where, column, record, sql_enum,
};
use testcontainers::ContainerAsync;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::mysql::Mysql;

sql_enum! {
    pub enum Rank {
        Member,
        Officer,
    }
}

record! {
    #[table = "player"]
    #[derive(Debug, Clone, PartialEq)]
    pub struct Player {
        pub id: ObjectId => column("id").primary(),
        pub name: String => column("name").limit(32).unique(),
        pub level: i32 => column("level"),
        pub rank: Option<Rank> => column("rank"),
        pub joined: chrono::NaiveDateTime => column("joined"),
        pub token: uuid::Uuid => column("token"),
        pub titles: Vec<String> => column("titles"),
        pub banned: bool => column("banned"),
        pub score: f64 => column("score"),
    }
}

async fn setup_mysql() -> (ContainerAsync<Mysql>, MySqlStore) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let container = Mysql::default()
        .start()
        .await
        .expect("failed to start mysql container");
    let host = container.get_host().await.expect("container host");
    let port = container
        .get_host_port_ipv4(3306)
        .await
        .expect("mysql port not available");

    let mut mysql = MySqlConfig::new(format!("mysql://{host}:{port}/test"));
    mysql.username = Some("root".to_string());
    let config = Config {
        mysql: Some(mysql),
        ..Default::default()
    };

    let store = MySqlStore::connect(&config)
        .await
        .expect("failed to connect to mysql");
    (container, store)
}

fn player(id: u64, name: &str, level: i32) -> Player {
    Player {
        id: ObjectId::from_raw(id),
        name: name.to_string(),
        level,
        rank: Some(Rank::Officer),
        joined: NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(18, 30, 0)
            .unwrap(),
        token: uuid::Uuid::new_v4(),
        titles: vec!["founder".to_string(), "builder".to_string()],
        banned: false,
        score: 12.5,
    }
}

#[tokio::test]
async fn test_create_then_migrate_is_a_no_op() {
    let (_container, store) = setup_mysql().await;

    assert!(!store.check_if_table_exists::<Player>().await.unwrap());
    store.create_or_migrate::<Player>().await.unwrap();
    assert!(store.check_if_table_exists::<Player>().await.unwrap());

    let plan = store.plan::<Player>().await.unwrap();
    assert!(plan.is_empty(), "unexpected delta:\n{plan}");

    store.close().await;
}

#[tokio::test]
async fn test_migrate_restores_dropped_column() {
    let (_container, store) = setup_mysql().await;
    store.create_or_migrate::<Player>().await.unwrap();

    store
        .executor()
        .execute("ALTER TABLE `player` DROP COLUMN `rank`", &[])
        .await
        .unwrap();

    let delta = store.migrate::<Player>().await.unwrap();
    assert_eq!(delta.len(), 1);
    assert!(store.plan::<Player>().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_records_round_trip() {
    let (_container, store) = setup_mysql().await;
    store.create_or_migrate::<Player>().await.unwrap();

    let ada = player(1, "ada", 3);
    store.insert(&ada).await.unwrap();

    let found = store
        .select_one::<Player>(&Where::eq("name", "ada".to_string()))
        .await
        .unwrap();
    assert_eq!(found, Some(ada));
}

#[tokio::test]
async fn test_sequential_upserts_leave_one_row() {
    let (_container, store) = setup_mysql().await;
    store.create_or_migrate::<Player>().await.unwrap();

    store.upsert_by_key(&player(7, "bob", 1)).await.unwrap();
    let mut bob = player(7, "bob", 9);
    bob.rank = None;
    store.upsert_by_key(&bob).await.unwrap();

    let rows = store.select::<Player>(&Where::all()).await.unwrap();
    assert_eq!(rows, vec![bob]);
    assert!(
        store
            .exists::<Player>(&Where::eq("level", 9))
            .await
            .unwrap()
    );
    assert!(
        !store
            .exists::<Player>(&Where::eq("level", 1))
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_unreadable_cells_only_drop_their_row() {
    let (_container, store) = setup_mysql().await;
    store.create_or_migrate::<Player>().await.unwrap();
    store.insert(&player(1, "ada", 3)).await.unwrap();
    store.insert(&player(2, "bob", 4)).await.unwrap();

    // Legacy data: a zero timestamp and a non-UTF-8 blob in a column the
    // record does not map.
    let mut conn = store.executor().pool().acquire().await.unwrap();
    for sql in [
        "SET SESSION sql_mode = ''",
        "ALTER TABLE `player` ADD COLUMN `legacy` BLOB NULL",
        "UPDATE `player` SET `legacy` = X'FF00FE' WHERE `name` = 'ada'",
        "UPDATE `player` SET `joined` = '0000-00-00 00:00:00' WHERE `name` = 'bob'",
    ] {
        sqlx::query(sql).execute(&mut *conn).await.unwrap();
    }
    drop(conn);

    let rows = store.select::<Player>(&Where::all()).await.unwrap();
    let names: Vec<_> = rows.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["ada"]);
}
