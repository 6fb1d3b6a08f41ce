//! Concurrent callers hammering one shared manager
//!
//! Every operation serializes on the manager's single exclusive lock; these
//! tests check that the table invariants survive arbitrary interleavings.

use membank_rs::{BlockHandle, MemoryManager};
use std::sync::Arc;

fn assert_table_consistent(manager: &MemoryManager) {
    let infos = manager.blocks();

    for info in &infos {
        assert!(info.start + info.size <= manager.capacity());
    }

    for (i, a) in infos.iter().enumerate() {
        for b in &infos[i + 1..] {
            let disjoint = a.start + a.size <= b.start || b.start + b.size <= a.start;
            assert!(disjoint, "blocks {} and {} overlap", a.handle, b.handle);
        }
    }

    let stats = manager.stats();
    let used: usize = infos.iter().map(|i| i.size).sum();
    assert_eq!(stats.used_cells, used);
    assert_eq!(stats.free_cells, manager.capacity() - used);
}

#[test]
fn test_concurrent_alloc_free_cycles() {
    let manager = Arc::new(MemoryManager::new(256).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|thread_id| {
            let manager = manager.clone();
            std::thread::spawn(move || {
                for round in 0..200 {
                    let size = 1 + (thread_id + round) % 7;
                    if let Ok(block) = manager.alloc(size) {
                        let payload = vec![thread_id as u8 + 1; size];
                        manager.write(block, 0, &payload).unwrap();
                        assert_eq!(manager.read(block, 0, size).unwrap(), payload);
                        manager.free(block).unwrap();
                    }
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    // Every thread freed what it allocated
    assert_eq!(manager.stats().live_blocks, 0);
    assert_eq!(manager.snapshot(), "-".repeat(256));
}

#[test]
fn test_concurrent_writers_with_defragmenting_thread() {
    let manager = Arc::new(MemoryManager::new(128).unwrap());

    let handles: Vec<_> = (0..6)
        .map(|thread_id| {
            let manager = manager.clone();
            std::thread::spawn(move || {
                if thread_id == 0 {
                    // Compaction runs concurrently with everything else
                    for _ in 0..100 {
                        manager.defragment();
                    }
                    return;
                }

                let mut held: Vec<(BlockHandle, usize)> = Vec::new();
                for round in 0..150 {
                    let size = 1 + rand::random::<usize>() % 5;
                    if round % 3 == 2 && !held.is_empty() {
                        let (block, _) = held.remove(rand::random::<usize>() % held.len());
                        manager.free(block).unwrap();
                    } else if let Ok(block) = manager.alloc(size) {
                        manager
                            .write(block, 0, &vec![b'a' + thread_id as u8; size])
                            .unwrap();
                        held.push((block, size));
                    }

                    // Relocation must never disturb payload contents
                    for &(block, size) in &held {
                        let data = manager.read(block, 0, size).unwrap();
                        assert!(data.iter().all(|&b| b == b'a' + thread_id as u8));
                    }
                }

                for (block, _) in held {
                    manager.free(block).unwrap();
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    assert_table_consistent(&manager);
    assert_eq!(manager.stats().live_blocks, 0);
}

#[test]
fn test_concurrent_readers_see_consistent_snapshots() {
    let manager = Arc::new(MemoryManager::new(64).unwrap());

    // Pre-populate
    for _ in 0..8 {
        let block = manager.alloc(4).unwrap();
        manager.write(block, 0, b"wxyz").unwrap();
    }

    let handles: Vec<_> = (0..6)
        .map(|thread_id| {
            let manager = manager.clone();
            std::thread::spawn(move || {
                for _ in 0..300 {
                    if thread_id < 2 {
                        manager.defragment();
                    } else {
                        let snapshot = manager.snapshot();
                        assert_eq!(snapshot.chars().count(), 64);
                        // 32 cells stay occupied throughout
                        let free = snapshot.chars().filter(|&c| c == '-').count();
                        assert_eq!(free, 32);
                    }
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    assert_table_consistent(&manager);
    assert_eq!(manager.stats().used_cells, 32);
}
