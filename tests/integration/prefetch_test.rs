use std::fs;
use std::sync::mpsc;
use std::time::Duration;

use slidecache::prefetch::{PrefetchQueue, PrefetchRequest};
use slidecache::{Prefetcher, Size};
use tempfile::TempDir;

use crate::helpers::{write_png, TIMEOUT};

#[test]
fn decodes_image_fitted_to_target() {
    let temp = TempDir::new().unwrap();
    let source = write_png(temp.path(), "wide.png", 400, 200);
    let (tx, rx) = mpsc::channel();
    let prefetcher = Prefetcher::spawn(5, tx).unwrap();

    prefetcher.submit(&source, Size::new(100, 100));
    let result = rx.recv_timeout(TIMEOUT).unwrap();

    assert_eq!(result.path, source);
    assert_eq!(result.target, Size::new(100, 100));
    assert_eq!((result.image.width(), result.image.height()), (100, 50));
}

#[test]
fn small_image_is_scaled_up_to_fit() {
    let temp = TempDir::new().unwrap();
    let source = write_png(temp.path(), "small.png", 50, 100);
    let (tx, rx) = mpsc::channel();
    let prefetcher = Prefetcher::spawn(5, tx).unwrap();

    prefetcher.submit(&source, Size::new(300, 300));
    let result = rx.recv_timeout(TIMEOUT).unwrap();

    assert_eq!((result.image.width(), result.image.height()), (150, 300));
}

#[test]
fn failed_decode_is_not_delivered() {
    let temp = TempDir::new().unwrap();
    let bad = temp.path().join("bad.jpg");
    fs::write(&bad, b"garbage").unwrap();
    let good = write_png(temp.path(), "good.png", 20, 20);
    let (tx, rx) = mpsc::channel();
    let prefetcher = Prefetcher::spawn(5, tx).unwrap();

    prefetcher.submit(&bad, Size::new(10, 10));
    prefetcher.submit(temp.path().join("missing.png"), Size::new(10, 10));
    prefetcher.submit(&good, Size::new(10, 10));

    let result = rx.recv_timeout(TIMEOUT).unwrap();
    assert_eq!(result.path, good);
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
}

#[test]
fn results_arrive_in_request_order() {
    let temp = TempDir::new().unwrap();
    let sources: Vec<_> = (0..4)
        .map(|i| write_png(temp.path(), &format!("{}.png", i), 30, 30))
        .collect();
    let (tx, rx) = mpsc::channel();
    let prefetcher = Prefetcher::spawn(5, tx).unwrap();

    for source in &sources {
        prefetcher.submit(source, Size::new(60, 60));
    }
    let received: Vec<_> = (0..4)
        .map(|_| rx.recv_timeout(TIMEOUT).unwrap().path)
        .collect();

    assert_eq!(received, sources);
}

#[test]
fn stop_abandons_pending_requests() {
    let (tx, rx) = mpsc::channel();
    let mut prefetcher = Prefetcher::spawn(5, tx).unwrap();

    prefetcher.stop();
    assert!(prefetcher.submit("/nowhere.png", Size::new(1, 1)).is_none());

    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    assert_eq!(prefetcher.pending().len(), 1);
}

#[test]
fn queue_of_one_keeps_only_latest_intent() {
    let mut queue = PrefetchQueue::new(1);
    let first = PrefetchRequest {
        path: "first.png".into(),
        target: Size::new(10, 10),
    };
    let second = PrefetchRequest {
        path: "second.png".into(),
        target: Size::new(10, 10),
    };

    assert!(queue.push(first.clone()).is_none());
    assert_eq!(queue.push(second.clone()), Some(first));
    assert_eq!(queue.pop(), Some(second));
    assert!(queue.is_empty());
}

#[test]
fn zero_capacity_is_treated_as_one() {
    assert_eq!(PrefetchQueue::new(0).capacity(), 1);
}
