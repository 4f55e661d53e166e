//! Single-Flight Guard Integration Tests
//!
//! Tests the at-most-one-pipeline-per-path invariant under concurrent
//! acquisition.

use std::path::PathBuf;
use std::sync::Arc;

use recap::FlightGuard;
use tokio::sync::Barrier;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_acquire_has_single_winner() {
    let guard = FlightGuard::new();
    let path = PathBuf::from("/videos/standup.mp4");

    let contenders = 32;
    let barrier = Arc::new(Barrier::new(contenders));

    let handles: Vec<_> = (0..contenders)
        .map(|_| {
            let guard = Arc::clone(&guard);
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                guard.try_acquire(&path)
            })
        })
        .collect();

    let mut permits = Vec::new();
    for handle in handles {
        permits.push(handle.await.unwrap());
    }

    let wins = permits.iter().filter(|p| p.is_some()).count();
    assert_eq!(wins, 1, "expected exactly one admission, got {wins}");
    assert_eq!(guard.in_flight(), 1);

    drop(permits);
    assert_eq!(guard.in_flight(), 0);
}

#[tokio::test]
async fn test_reacquire_after_release() {
    let guard = FlightGuard::new();
    let path = PathBuf::from("/videos/retro.mkv");

    let permit = guard.try_acquire(&path).expect("first acquire");
    assert!(guard.try_acquire(&path).is_none());

    drop(permit);

    assert!(
        guard.try_acquire(&path).is_some(),
        "released path must be admittable again"
    );
}

#[tokio::test]
async fn test_release_happens_on_failure_paths() {
    let guard = FlightGuard::new();
    let path = PathBuf::from("/videos/kickoff.mov");

    // A processing attempt that fails must still release its permit
    let attempt: Result<(), &str> = async {
        let _permit = guard.try_acquire(&path).expect("acquire");
        Err("extraction failed")
    }
    .await;

    assert!(attempt.is_err());
    assert_eq!(guard.in_flight(), 0);
    assert!(guard.try_acquire(&path).is_some());
}

#[tokio::test]
async fn test_paths_are_independent_keys() {
    let guard = FlightGuard::new();

    let a = guard.try_acquire(&PathBuf::from("/videos/a.mp4"));
    let b = guard.try_acquire(&PathBuf::from("/videos/b.mp4"));
    let c = guard.try_acquire(&PathBuf::from("/videos/a.mp4"));

    assert!(a.is_some());
    assert!(b.is_some());
    assert!(c.is_none());
    assert_eq!(guard.in_flight(), 2);
}
