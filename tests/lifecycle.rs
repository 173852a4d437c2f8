//! Background polling, cancellation and the shared-client registry.

mod common;

use std::sync::Arc;
use std::time::Duration;

use apollo_sync::{ClientRegistry, ConfigClient};
use common::{config_body, meta_server, test_config, MockServer};

#[tokio::test]
async fn test_stop_interrupts_sleep() {
    let dir = tempfile::tempdir().unwrap();
    let (config_server, _script) =
        MockServer::scripted(200, config_body(&[("timeout", "30")], "r1")).await;
    let meta = meta_server(vec![config_server.homepage()]).await;

    let client = ConfigClient::connect(test_config(&meta.url(), dir.path()))
        .await
        .unwrap();
    assert!(client.is_running());

    client.stop();
    client.stop();
    tokio::time::timeout(Duration::from_secs(1), client.shutdown())
        .await
        .expect("worker must leave its hour-long sleep promptly");
    assert!(!client.is_running());

    // Reads keep working after stop.
    assert_eq!(client.get("timeout", "application").as_deref(), Some("30"));
}

#[tokio::test]
async fn test_stop_from_another_thread() {
    let dir = tempfile::tempdir().unwrap();
    let (config_server, _script) =
        MockServer::scripted(200, config_body(&[("timeout", "30")], "r1")).await;
    let meta = meta_server(vec![config_server.homepage()]).await;

    let client = Arc::new(
        ConfigClient::connect(test_config(&meta.url(), dir.path()))
            .await
            .unwrap(),
    );

    let remote = client.clone();
    std::thread::spawn(move || remote.stop()).join().unwrap();

    tokio::time::timeout(Duration::from_secs(1), client.shutdown())
        .await
        .unwrap();
    assert!(!client.is_running());
}

#[tokio::test]
async fn test_background_polling_picks_up_changes() {
    let dir = tempfile::tempdir().unwrap();
    let (config_server, script) =
        MockServer::scripted(200, config_body(&[("timeout", "30")], "r1")).await;
    let meta = meta_server(vec![config_server.homepage()]).await;
    let config = test_config(&meta.url(), dir.path()).with_cycle_time_secs(1);

    let client = ConfigClient::connect(config).await.unwrap();
    assert_eq!(client.get("timeout", "application").as_deref(), Some("30"));

    script.set(200, config_body(&[("timeout", "45")], "r2"));

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while client.get("timeout", "application").as_deref() != Some("45") {
        assert!(tokio::time::Instant::now() < deadline, "change not picked up");
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(client.disk_cache().write_count(), 2);

    client.shutdown().await;
}

#[tokio::test]
async fn test_start_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let (config_server, _script) =
        MockServer::scripted(200, config_body(&[("timeout", "30")], "r1")).await;
    let meta = meta_server(vec![config_server.homepage()]).await;

    let client = ConfigClient::new(test_config(&meta.url(), dir.path()))
        .await
        .unwrap();
    client.start().await;
    client.start().await;

    assert_eq!(config_server.request_count(), 1);
    client.shutdown().await;
}

#[tokio::test]
async fn test_dropping_client_stops_polling() {
    let dir = tempfile::tempdir().unwrap();
    let (config_server, _script) =
        MockServer::scripted(200, config_body(&[("timeout", "30")], "r1")).await;
    let meta = meta_server(vec![config_server.homepage()]).await;
    let config = test_config(&meta.url(), dir.path()).with_cycle_time_secs(1);

    let client = ConfigClient::connect(config).await.unwrap();
    drop(client);

    tokio::time::sleep(Duration::from_millis(300)).await;
    let after_drop = config_server.request_count();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(config_server.request_count(), after_drop);
}

#[tokio::test]
async fn test_registry_shares_identical_clients() {
    let dir = tempfile::tempdir().unwrap();
    let (config_server, _script) =
        MockServer::scripted(200, config_body(&[("timeout", "30")], "r1")).await;
    let meta = meta_server(vec![config_server.homepage()]).await;
    let registry = ClientRegistry::new();

    let base = test_config(&meta.url(), dir.path()).with_namespaces(["application", "db"]);
    let first = registry.get_or_create(base.clone()).await.unwrap();
    let reordered = base.clone().with_namespaces(["db", "application"]);
    let second = registry.get_or_create(reordered).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(meta.request_count(), 1);
    assert_eq!(registry.len().await, 1);

    let other_cluster = base.clone().with_cluster("backup");
    let third = registry.get_or_create(other_cluster).await.unwrap();
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(registry.len().await, 2);

    let removed = registry.remove(&base).await.unwrap();
    assert!(Arc::ptr_eq(&removed, &first));
    assert!(registry.get(&base).await.is_none());

    registry.shutdown_all().await;
    assert!(registry.is_empty().await);
    assert!(!third.is_running());
}
