//! Stress test: large key sets and many service accounts rotated at once.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;

use sa_key_rotator::memory::{MemoryLabels, MemoryRegistry, MemoryStore, StaticMinter};
use sa_key_rotator::{
    plan, CancellationToken, Clock, DeleteReason, FixedClock, Key, KeyType, RotationConfig,
    Rotator,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

#[test]
fn stress_plan_over_10000_keys() {
    let email = "svc@proj.iam.gserviceaccount.com";
    let mut keys = Vec::with_capacity(10_000);
    let mut labels = HashMap::new();
    for i in 0..10_000 {
        let id = format!("k{i:05}");
        let valid_before = if i % 4 == 0 {
            "2024-05-31T00:00:00Z"
        } else {
            "2024-12-01T00:00:00Z"
        };
        keys.push(Key {
            name: format!("projects/proj/serviceAccounts/{email}/keys/{id}"),
            valid_before_time: valid_before.to_string(),
            valid_after_time: None,
            key_type: KeyType::UserManaged,
        });
        let label = if i % 2 == 0 { "sa-key-rotator" } else { "other" };
        labels.insert(id, label.to_string());
    }

    let now = FixedClock::new(today()).today();

    let routine = plan(&keys, &labels, now, &RotationConfig::new(email, "b")).unwrap();
    assert!(routine.create.is_none(), "fresh owned keys exist");
    assert_eq!(routine.delete.len(), 2_500);
    assert!(routine
        .delete
        .iter()
        .all(|d| d.reason == DeleteReason::Expired));

    let forced = plan(
        &keys,
        &labels,
        now,
        &RotationConfig::new(email, "b").force_delete(true),
    )
    .unwrap();
    // every expired key plus the fresh owned ones
    assert_eq!(forced.delete.len(), 2_500 + 2_500);
    let unique: HashSet<&str> = forced.delete.iter().map(|d| d.key_name.as_str()).collect();
    assert_eq!(unique.len(), forced.delete.len(), "no key is deleted twice");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn stress_200_service_accounts_in_parallel() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::new(today()));
    let minter = Arc::new(StaticMinter::new());

    let mut registries = Vec::new();
    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..200 {
        let email = format!("svc-{i:03}@proj.iam.gserviceaccount.com");
        let registry = Arc::new(MemoryRegistry::new(&email, "proj"));
        // one expired key each, so every rotation uploads and deletes
        registry.insert_key("expired", "2024-01-01T00:00:00Z");
        registries.push(registry.clone());

        let rotator = Rotator::new(registry, Arc::new(MemoryLabels::new()), store.clone())
            .with_minter(minter.clone())
            .with_clock(clock.clone());
        tasks.spawn(async move {
            let cfg = RotationConfig::new(email, "keys");
            rotator.rotate(&cfg, &CancellationToken::new()).await
        });
    }

    let mut object_names = HashSet::new();
    while let Some(joined) = tasks.join_next().await {
        let report = joined.unwrap().unwrap();
        let uploaded = report.uploaded.expect("every account gets a key");
        assert_eq!(report.deleted.len(), 1);
        object_names.insert(uploaded.object_name);
    }

    assert_eq!(minter.requests().len(), 200);
    for registry in &registries {
        assert_eq!(registry.uploads().len(), 1);
        assert_eq!(registry.keys().len(), 1);
    }
    // registries share id sequences, so names may collide; the store holds one per name
    assert_eq!(store.len(), object_names.len());
}
