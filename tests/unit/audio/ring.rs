use std::thread;

use super::*;

#[test]
fn latest_returns_newest_samples_oldest_first() {
    let ring = SampleRing::new(8);
    ring.write(&[1.0, 2.0, 3.0]);
    assert_eq!(ring.latest(2), vec![2.0, 3.0]);
    assert_eq!(ring.latest(10), vec![1.0, 2.0, 3.0]);
}

#[test]
fn overwrite_keeps_the_tail_when_wrapping() {
    let ring = SampleRing::new(4);
    ring.write(&[1.0, 2.0, 3.0]);
    ring.write(&[4.0, 5.0, 6.0]);
    assert_eq!(ring.len(), 4);
    assert_eq!(ring.latest(4), vec![3.0, 4.0, 5.0, 6.0]);

    let big: Vec<f32> = (0..10).map(|i| i as f32).collect();
    ring.write(&big);
    assert_eq!(ring.latest(4), vec![6.0, 7.0, 8.0, 9.0]);
}

#[test]
fn clear_empties_the_ring() {
    let ring = SampleRing::new(4);
    ring.write(&[1.0]);
    ring.clear();
    assert!(ring.is_empty());
    assert!(ring.latest(4).is_empty());
}

#[test]
fn feed_capacity_is_two_seconds() {
    let feed = AudioFeed::new(1000);
    assert_eq!(feed.ring().capacity(), 2000);
    assert_eq!(feed.sample_rate(), 1000);
}

#[test]
fn concurrent_writes_never_tear_blocks() {
    let feed = AudioFeed::new(512);
    let producer = feed.clone();
    let writer = thread::spawn(move || {
        for block in 0..500u32 {
            producer.push(&[block as f32; 16]);
        }
    });
    for _ in 0..500 {
        let got = feed.get_latest(16);
        if got.len() == 16 {
            // Any 16 newest samples span at most two consecutive blocks.
            let first = got[0];
            let last = got[15];
            assert!(last == first || last == first + 1.0, "{got:?}");
            assert!(got.windows(2).all(|w| w[1] >= w[0]));
        }
    }
    writer.join().unwrap();
    assert_eq!(feed.get_latest(1), vec![499.0]);
}
