mod support;

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use futures::future::join_all;
use imgtier_core::CachePolicy;
use support::{TestCache, gradient, key};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_writers_and_reclaimer_interleave_safely() {
    let t = Arc::new(TestCache::new());
    let keys: Vec<_> = (0..8).map(|i| key(&format!("img{i}"))).collect();
    for k in &keys {
        t.cache
            .set(k, gradient(16, 16), CachePolicy::MemoryAndDisk)
            .await;
    }

    let stop = Arc::new(AtomicBool::new(false));
    let reclaimer = {
        let t = Arc::clone(&t);
        let stop = Arc::clone(&stop);
        tokio::spawn(async move {
            while !stop.load(Ordering::Relaxed) {
                t.cache.handle_memory_pressure();
                tokio::task::yield_now().await;
            }
        })
    };

    let tasks = (0..16).map(|worker| {
        let t = Arc::clone(&t);
        let keys = keys.clone();
        tokio::spawn(async move {
            for round in 0..25 {
                let k = &keys[(worker + round) % keys.len()];
                match round % 5 {
                    0 => {
                        t.cache
                            .set(k, gradient(16, 16), CachePolicy::MemoryAndDisk)
                            .await
                    }
                    1 => t.cache.remove(k, CachePolicy::Memory).await,
                    _ => {
                        if let Some(img) = t.cache.get(k, CachePolicy::MemoryAndDisk).await {
                            assert_eq!(img.dimensions(), (16, 16));
                        }
                    }
                }
            }
        })
    });

    for result in join_all(tasks).await {
        result.expect("worker panicked");
    }
    stop.store(true, Ordering::Relaxed);
    reclaimer.await.unwrap();

    // Every outstanding access was released.
    for k in &keys {
        if let Some(content) = t.cache.memory().get(k) {
            assert_eq!(content.access_count(), 0);
        }
        assert!(t.cache.get(k, CachePolicy::MemoryAndDisk).await.is_some());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sets_on_one_key_leave_a_readable_file() {
    let t = Arc::new(TestCache::new());
    let writes = (0..12u32).map(|i| {
        let t = Arc::clone(&t);
        tokio::spawn(async move {
            t.cache
                .set(&key("race"), gradient(8 + i, 8), CachePolicy::Disk)
                .await;
        })
    });
    for result in join_all(writes).await {
        result.unwrap();
    }

    let img = t
        .cache
        .get(&key("race"), CachePolicy::Disk)
        .await
        .expect("last write wins, file intact");
    assert_eq!(img.height(), 8);
    assert!((8..20).contains(&img.width()));

    let leftovers: Vec<_> = std::fs::read_dir(t.cache.disk().root().as_path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name != "race")
        .collect();
    assert!(leftovers.is_empty(), "stray temp files: {leftovers:?}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn set_during_disk_lookup_is_not_undone_by_promotion() {
    let t = Arc::new(TestCache::new());
    // Large enough that reading and decoding it takes a while.
    t.cache
        .set(&key("k"), gradient(2000, 2000), CachePolicy::Disk)
        .await;

    let reader = {
        let t = Arc::clone(&t);
        tokio::spawn(async move { t.cache.get(&key("k"), CachePolicy::MemoryAndDisk).await })
    };
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let newer = gradient(2, 2);
    t.cache
        .set(&key("k"), newer.clone(), CachePolicy::Memory)
        .await;

    let read = reader.await.unwrap().expect("hit in one of the tiers");
    assert!(read.ptr_eq(&newer) || read.dimensions() == (2000, 2000));

    let current = t.cache.get_from_memory(&key("k")).expect("memory entry");
    assert!(current.ptr_eq(&newer), "later set was overwritten by a read");
}
