mod common;

use std::sync::Arc;

use sugarnail_core::manifest::AssetManifest;
use sugarnail_core::net::Request;
use sugarnail_core::store::{CacheStore, MemoryCacheStore};
use sugarnail_core::worker::{ResponseSource, WorkerEvent, WorkerState};
use sugarnail_core::WorkerError;

use common::*;

#[tokio::test]
async fn test_install_caches_whole_manifest() {
    let manifest = AssetManifest::new(["/", "/app.js"]).unwrap();
    let fetcher = fetcher_for(&manifest);
    let store = Arc::new(MemoryCacheStore::new());
    let (worker, _events) = build_worker(worker_config("v1"), manifest, store.clone(), fetcher.clone());

    worker.install().await.unwrap();
    assert_eq!(worker.state().await, WorkerState::Active);

    fetcher.set_online(false);
    let root = worker.fetch(&Request::get(url("/"))).await.unwrap();
    let app = worker.fetch(&Request::get(url("/app.js"))).await.unwrap();
    assert_eq!(root.source, ResponseSource::Cache);
    assert_eq!(root.response.body.as_ref(), b"body of /");
    assert_eq!(app.response.body.as_ref(), b"body of /app.js");
}

#[tokio::test]
async fn test_unreachable_asset_fails_install() {
    let manifest = AssetManifest::new(["/", "/app.js", "/assets/logo.jpg"]).unwrap();
    let fetcher = fetcher_for(&manifest);
    fetcher.unreachable("/assets/logo.jpg");
    let store = Arc::new(MemoryCacheStore::new());
    store.put("v1", "/".into(), record("old shell")).await.unwrap();

    let (worker, mut events) = build_worker(worker_config("v2"), manifest, store.clone(), fetcher);
    let err = worker.install().await.unwrap_err();

    assert!(matches!(err, WorkerError::InstallFailed { ref path, .. } if path == "/assets/logo.jpg"));
    assert_eq!(worker.state().await, WorkerState::Installing);
    assert!(!store.has_generation("v2").await.unwrap());
    let old = store.match_entry("v1", &"/".into()).await.unwrap().unwrap();
    assert_eq!(old.body.as_ref(), b"old shell");
    assert!(drain(&mut events).is_empty());
}

#[tokio::test]
async fn test_error_status_fails_install() {
    let manifest = AssetManifest::new(["/", "/missing.png"]).unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher.serve("/", "shell");
    let store = Arc::new(MemoryCacheStore::new());
    let (worker, _events) = build_worker(worker_config("v2"), manifest, store.clone(), fetcher);

    let err = worker.install().await.unwrap_err();
    assert!(err.to_string().contains("Status 404"));
    assert!(store.generations().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_install_can_be_retried() {
    let manifest = AssetManifest::new(["/", "/app.js"]).unwrap();
    let fetcher = fetcher_for(&manifest);
    fetcher.set_online(false);
    let store = Arc::new(MemoryCacheStore::new());
    let (worker, _events) = build_worker(worker_config("v1"), manifest, store.clone(), fetcher.clone());

    assert!(worker.install().await.is_err());
    fetcher.set_online(true);
    worker.install().await.unwrap();
    assert_eq!(worker.state().await, WorkerState::Active);
}

#[tokio::test]
async fn test_activate_prunes_before_claiming() {
    let manifest = AssetManifest::new(["/", "/app.js"]).unwrap();
    let fetcher = fetcher_for(&manifest);
    let store = Arc::new(MemoryCacheStore::new());
    store.put("v1", "/".into(), record("old")).await.unwrap();
    store.put("v0", "/".into(), record("older")).await.unwrap();

    let (worker, mut events) = build_worker(
        worker_config("v2").with_skip_waiting(false),
        manifest,
        store.clone(),
        fetcher,
    );
    let page = worker.clients().open("https://sugarnail.test/index.html").await;

    worker.install().await.unwrap();
    assert_eq!(worker.state().await, WorkerState::Waiting);
    assert_eq!(store.generations().await.unwrap(), vec!["v0", "v1", "v2"]);

    worker.activate().await.unwrap();
    assert_eq!(worker.state().await, WorkerState::Active);
    assert_eq!(store.generations().await.unwrap(), vec!["v2"]);
    assert_eq!(
        worker.clients().get(page).await.unwrap().controller.unwrap().as_str(),
        "v2"
    );

    let events = drain(&mut events);
    let claimed_at = events
        .iter()
        .position(|e| matches!(e, WorkerEvent::ClientsClaimed { count: 1, .. }))
        .unwrap();
    let deleted: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| matches!(e, WorkerEvent::GenerationDeleted { .. }))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(deleted.len(), 2);
    assert!(deleted.iter().all(|&i| i < claimed_at));
    assert_eq!(
        events.last(),
        Some(&WorkerEvent::StateChanged {
            version: "v2".to_string(),
            state: WorkerState::Active,
        })
    );
}

#[tokio::test]
async fn test_failed_deletion_does_not_block_claim() {
    let manifest = AssetManifest::new(["/"]).unwrap();
    let fetcher = fetcher_for(&manifest);
    let store = Arc::new(StickyGenerationStore::new("v1"));
    store.put("v1", "/".into(), record("old")).await.unwrap();
    store.put("v0", "/".into(), record("older")).await.unwrap();

    let (worker, mut events) = build_worker(worker_config("v2"), manifest, store.clone(), fetcher);
    worker.clients().open("https://sugarnail.test/").await;
    worker.install().await.unwrap();

    assert_eq!(worker.state().await, WorkerState::Active);
    assert_eq!(store.generations().await.unwrap(), vec!["v1", "v2"]);
    let events = drain(&mut events);
    assert!(events.contains(&WorkerEvent::GenerationDeleted {
        generation: "v0".to_string()
    }));
    assert!(events.contains(&WorkerEvent::ClientsClaimed {
        version: "v2".to_string(),
        count: 1
    }));
}

#[tokio::test]
async fn test_reinstall_is_idempotent() {
    let manifest = AssetManifest::new(["/", "/app.js", "/cart.html"]).unwrap();
    let fetcher = fetcher_for(&manifest);
    let store = Arc::new(MemoryCacheStore::new());
    let (worker, _events) = build_worker(worker_config("v1"), manifest, store.clone(), fetcher);

    worker.install().await.unwrap();
    let first = store.keys("v1").await.unwrap();
    worker.install().await.unwrap();

    assert_eq!(store.keys("v1").await.unwrap(), first);
    assert_eq!(store.generations().await.unwrap(), vec!["v1"]);
    assert_eq!(worker.state().await, WorkerState::Active);
}

#[tokio::test]
async fn test_activate_requires_waiting() {
    let manifest = AssetManifest::new(["/"]).unwrap();
    let fetcher = fetcher_for(&manifest);
    let (worker, _events) = build_worker(
        worker_config("v1"),
        manifest,
        Arc::new(MemoryCacheStore::new()),
        fetcher,
    );

    let err = worker.activate().await.unwrap_err();
    assert!(matches!(
        err,
        WorkerError::InvalidState {
            expected: WorkerState::Waiting,
            actual: WorkerState::Installing,
        }
    ));
}

#[tokio::test]
async fn test_default_manifest_installs() {
    let manifest = AssetManifest::default();
    let fetcher = fetcher_for(&manifest);
    let store = Arc::new(MemoryCacheStore::new());
    let (worker, _events) = build_worker(
        worker_config("sugar-nail-art-v2"),
        manifest.clone(),
        store.clone(),
        fetcher,
    );

    worker.install().await.unwrap();
    let keys = store.keys("sugar-nail-art-v2").await.unwrap();
    assert_eq!(keys.len(), manifest.len());
    assert!(keys.iter().all(|k| manifest.contains(k)));
}

#[tokio::test]
async fn test_resume_takes_over_installed_generation() {
    let manifest = AssetManifest::new(["/", "/app.js"]).unwrap();
    let fetcher = fetcher_for(&manifest);
    let store = Arc::new(MemoryCacheStore::new());
    store.put("v1", "/".into(), record("stale")).await.unwrap();
    store.put("v2", "/".into(), record("shell")).await.unwrap();
    store.put("v2", "/app.js".into(), record("app")).await.unwrap();

    let (worker, _events) = build_worker(worker_config("v2"), manifest, store.clone(), fetcher.clone());
    assert!(worker.resume().await.unwrap());
    assert_eq!(worker.state().await, WorkerState::Active);
    assert_eq!(store.generations().await.unwrap(), vec!["v2"]);
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn test_resume_without_install_is_noop() {
    let manifest = AssetManifest::new(["/"]).unwrap();
    let fetcher = fetcher_for(&manifest);
    let store = Arc::new(MemoryCacheStore::new());
    store.put("v1", "/".into(), record("old")).await.unwrap();

    let (worker, _events) = build_worker(worker_config("v2"), manifest, store.clone(), fetcher);
    assert!(!worker.resume().await.unwrap());
    assert_eq!(worker.state().await, WorkerState::Installing);
    assert_eq!(store.generations().await.unwrap(), vec!["v1"]);
}
