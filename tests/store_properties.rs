//! Integration tests for store-level properties.

use std::thread;

use warden::engine::Engine;
use warden::policy::{Binding, Policy};
use warden::store::Store;
use warden::trace::NullSink;

fn binding(role: &str, members: &[&str]) -> Binding {
    Binding { role: role.into(), members: members.iter().map(|s| s.to_string()).collect(), condition: None }
}

#[test]
fn write_read_round_trip_normalizes_version_zero() {
    let engine = Engine::new(Store::new());
    let written = engine
        .set_policy("projects/p/secrets/s", Policy { version: 0, bindings: vec![binding("roles/viewer", &["user:a@example.com"])], ..Policy::empty() })
        .unwrap();
    assert_eq!(written.version, 1);
    assert!(!written.etag.is_empty());

    let read = engine.get_policy("projects/p/secrets/s");
    assert_eq!(read, written);
}

#[test]
fn etag_determinism_across_writes_at_different_times() {
    let engine = Engine::new(Store::new());
    let policy_a = Policy { version: 1, bindings: vec![binding("roles/viewer", &["user:a@example.com", "user:b@example.com"])], ..Policy::empty() };
    let policy_b = Policy { version: 1, bindings: vec![binding("roles/viewer", &["user:b@example.com", "user:a@example.com"])], ..Policy::empty() };

    let written_a = engine.set_policy("projects/p1", policy_a).unwrap();
    let written_b = engine.set_policy("projects/p2", policy_b).unwrap();
    assert_eq!(written_a.etag, written_b.etag);

    let distinct = engine.set_policy("projects/p3", Policy { version: 1, bindings: vec![binding("roles/editor", &["user:a@example.com"])], ..Policy::empty() }).unwrap();
    assert_ne!(written_a.etag, distinct.etag);
}

#[test]
fn hierarchical_resolution_prefers_closest_ancestor() {
    let engine = Engine::new(Store::new());
    engine.set_policy("projects/p", Policy { version: 1, bindings: vec![binding("roles/viewer", &["user:dev@example.com"])], ..Policy::empty() }).unwrap();

    let deep = engine.test_permissions("projects/p/X/y/Z/w", "user:dev@example.com", &["secretmanager.secrets.get".to_string()], false, &NullSink).unwrap();
    assert_eq!(deep, vec!["secretmanager.secrets.get".to_string()]);

    engine.set_policy("projects/p/X/y", Policy { version: 1, bindings: vec![binding("roles/editor", &["user:dev@example.com"])], ..Policy::empty() }).unwrap();

    let still_deep = engine.test_permissions("projects/p/X/y/Z/w", "user:dev@example.com", &["secretmanager.secrets.get".to_string()], false, &NullSink).unwrap();
    assert_eq!(still_deep, vec!["secretmanager.secrets.get".to_string()]);

    let at_intermediate = engine.test_permissions("projects/p/X/y", "user:dev@example.com", &["secretmanager.secrets.delete".to_string()], false, &NullSink).unwrap();
    assert_eq!(at_intermediate, vec!["secretmanager.secrets.delete".to_string()]);
}

#[test]
fn concurrent_decisions_never_observe_a_blend_of_two_writes() {
    let store = Store::new();
    let engine = Engine::new(store.clone());

    let policy_get = Policy { version: 1, bindings: vec![binding("roles/viewer", &["user:a@example.com"])], ..Policy::empty() };
    let policy_encrypt = Policy { version: 1, bindings: vec![binding("roles/cloudkms.cryptoKeyEncrypterDecrypter", &["user:a@example.com"])], ..Policy::empty() };
    engine.set_policy("projects/race", policy_get.clone()).unwrap();

    let writer_engine = engine.clone();
    let writer = thread::spawn(move || {
        for i in 0..500 {
            let p = if i % 2 == 0 { policy_get.clone() } else { policy_encrypt.clone() };
            writer_engine.set_policy("projects/race", p).unwrap();
        }
    });

    let mut readers = Vec::new();
    for _ in 0..8 {
        let reader_engine = engine.clone();
        readers.push(thread::spawn(move || {
            let permissions = vec!["secretmanager.secrets.get".to_string(), "cloudkms.cryptoKeys.encrypt".to_string()];
            let mut observed = Vec::new();
            for _ in 0..200 {
                let allowed = reader_engine.test_permissions("projects/race/secrets/s", "user:a@example.com", &permissions, false, &NullSink).unwrap();
                observed.push(allowed);
            }
            observed
        }));
    }

    writer.join().unwrap();
    for reader in readers {
        let observed = reader.join().unwrap();
        for allowed in observed {
            assert!(allowed.len() <= 1, "decision observed a blend of both policies: {allowed:?}");
        }
    }
}
