//! Reconciliation pass behavior against the mock provider.

mod common;

use std::sync::atomic::Ordering;

use dns_warden_core::types::{FailureStage, RecordSpec};
use dns_warden_provider::{DnsRecord, DnsRecordType, OWNERSHIP_MARKER, RecordKey};

use common::harness;

fn spec(name: &str, content: &str) -> RecordSpec {
    RecordSpec::new(DnsRecordType::A, name, content)
}

#[tokio::test]
async fn create_from_empty_cache() {
    let h = harness().await;

    let summary = h
        .reconciler
        .run_pass(&[spec("app.example.com", "203.0.113.5")])
        .await
        .unwrap();

    assert_eq!(summary.created, 1);
    assert_eq!(summary.updated, 0);
    assert_eq!(summary.errors, 0);
    assert_eq!(h.provider.create_calls.load(Ordering::SeqCst), 1);

    // Tracker entry exists and is Active.
    let key = RecordKey::new(DnsRecordType::A, "app.example.com");
    let tracked = h.tracker.get(&key).await.unwrap();
    assert!(!tracked.is_orphaned());

    // The remote record carries the ownership marker.
    let remote = h.provider.remote_records().await;
    assert_eq!(remote.len(), 1);
    assert!(remote[0]
        .comment
        .as_deref()
        .is_some_and(|c| c.contains(OWNERSHIP_MARKER)));
}

#[tokio::test]
async fn second_pass_is_idempotent() {
    let h = harness().await;
    let desired = [spec("app.example.com", "203.0.113.5")];

    h.reconciler.run_pass(&desired).await.unwrap();
    let second = h.reconciler.run_pass(&desired).await.unwrap();

    assert_eq!(second.created, 0);
    assert_eq!(second.updated, 0);
    assert_eq!(second.unchanged, 1);
    assert_eq!(h.provider.create_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.provider.update_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn changed_content_updates_in_place() {
    let h = harness().await;

    h.reconciler
        .run_pass(&[spec("app.example.com", "203.0.113.5")])
        .await
        .unwrap();
    let summary = h
        .reconciler
        .run_pass(&[spec("app.example.com", "203.0.113.99")])
        .await
        .unwrap();

    assert_eq!(summary.created, 0);
    assert_eq!(summary.updated, 1);
    let remote = h.provider.remote_records().await;
    assert_eq!(remote.len(), 1);
    assert_eq!(remote[0].content, "203.0.113.99");
}

#[tokio::test]
async fn one_bad_record_does_not_abort_the_batch() {
    let h = harness().await;
    let desired = [
        spec("one.example.com", "203.0.113.1"),
        spec("two.example.com", "203.0.113.2"),
        spec("three.example.com", ""), // no content, fails validation
        spec("four.example.com", "203.0.113.4"),
        spec("five.example.com", "203.0.113.5"),
    ];

    let summary = h.reconciler.run_pass(&desired).await.unwrap();

    assert_eq!(summary.created, 4);
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].name, "three.example.com");
    assert_eq!(summary.failures[0].stage, FailureStage::Validation);
}

#[tokio::test]
async fn duplicate_desired_entries_last_wins() {
    let h = harness().await;
    let desired = [
        spec("app.example.com", "203.0.113.1"),
        spec("App.Example.Com", "203.0.113.2"),
    ];

    let summary = h.reconciler.run_pass(&desired).await.unwrap();

    assert_eq!(summary.created, 1);
    let remote = h.provider.remote_records().await;
    assert_eq!(remote[0].content, "203.0.113.2");
}

#[tokio::test]
async fn connection_failure_skips_remaining_operations() {
    let h = harness().await;
    h.provider.set_fail_create(Some("connection refused")).await;

    let desired = [
        spec("one.example.com", "203.0.113.1"),
        spec("two.example.com", "203.0.113.2"),
        spec("three.example.com", "203.0.113.3"),
    ];
    let summary = h.reconciler.run_pass(&desired).await.unwrap();

    assert_eq!(summary.created, 0);
    assert_eq!(summary.errors, 3);
    // Only the first operation hit the wire; the rest were skipped.
    assert_eq!(h.provider.create_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unchanged_foreign_record_is_adopted() {
    let h = harness().await;
    h.provider
        .seed_remote(DnsRecord::new(
            DnsRecordType::A,
            "app.example.com",
            "203.0.113.5",
            300,
        ))
        .await;

    let mut desired = spec("app.example.com", "203.0.113.5");
    desired.ttl = Some(300);
    let summary = h.reconciler.run_pass(&[desired]).await.unwrap();

    assert_eq!(summary.created, 0);
    assert_eq!(summary.unchanged, 1);
    let key = RecordKey::new(DnsRecordType::A, "app.example.com");
    assert!(h.tracker.contains(&key).await);
}

#[tokio::test]
async fn failing_desired_record_is_not_orphaned() {
    let h = harness().await;
    h.reconciler
        .run_pass(&[spec("dyn.example.com", "203.0.113.5")])
        .await
        .unwrap();

    // The hostname stays in the desired set, but this pass needs a public
    // IP the harness resolver cannot provide, so its step fails.
    let mut failing = spec("dyn.example.com", "");
    failing.needs_ip_lookup = true;
    let summary = h.reconciler.run_pass(&[failing.clone()]).await.unwrap();
    assert_eq!(summary.errors, 1);

    // Still desired means never orphaned, however many passes fail.
    let key = RecordKey::new(DnsRecordType::A, "dyn.example.com");
    assert!(!h.tracker.get(&key).await.unwrap().is_orphaned());

    h.reconciler.run_pass(&[failing]).await.unwrap();
    assert!(!h.tracker.get(&key).await.unwrap().is_orphaned());
}

#[tokio::test]
async fn provider_down_skip_does_not_orphan_desired_records() {
    let h = harness().await;
    h.reconciler
        .run_pass(&[spec("one.example.com", "203.0.113.1")])
        .await
        .unwrap();

    // The new record's create dies on the connection, so the changed
    // record's update is skipped for the rest of the pass. Both hostnames
    // are still desired and must stay out of the orphan state.
    h.provider.set_fail_create(Some("connection refused")).await;
    let desired = [
        spec("two.example.com", "203.0.113.2"),
        spec("one.example.com", "203.0.113.11"),
    ];
    let summary = h.reconciler.run_pass(&desired).await.unwrap();
    assert_eq!(summary.errors, 2);

    let key = RecordKey::new(DnsRecordType::A, "one.example.com");
    assert!(!h.tracker.get(&key).await.unwrap().is_orphaned());
}

#[tokio::test]
async fn default_ttl_is_clamped_to_provider_floor() {
    let h = harness().await;
    h.provider.set_ttl_floor(600);

    let summary = h
        .reconciler
        .run_pass(&[spec("app.example.com", "203.0.113.5")])
        .await
        .unwrap();

    // The 300s built-in fallback sits below the floor; the record is
    // created at the floor instead of failing validation.
    assert_eq!(summary.created, 1);
    assert_eq!(summary.errors, 0);
    let remote = h.provider.remote_records().await;
    assert_eq!(remote[0].ttl, 600);
}

#[tokio::test]
async fn ip_lookup_failure_fails_only_dependent_records() {
    let h = harness().await;
    let mut dynamic = spec("dyn.example.com", "");
    dynamic.needs_ip_lookup = true;

    let desired = [dynamic, spec("static.example.com", "203.0.113.9")];
    let summary = h.reconciler.run_pass(&desired).await.unwrap();

    assert_eq!(summary.created, 1);
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.failures[0].stage, FailureStage::IpResolution);
    assert_eq!(summary.failures[0].name, "dyn.example.com");
}
