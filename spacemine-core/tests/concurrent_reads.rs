use rand::SeedableRng;
use rand::rngs::SmallRng;
use spacemine_core::{AsteroidIndex, Recipe, TierMask};
use std::sync::{Arc, RwLock, mpsc};
use std::thread;

const THREADS: u64 = 8;
const DRAWS_PER_THREAD: usize = 5_000;

fn fixture() -> AsteroidIndex<&'static str> {
    AsteroidIndex::build(vec![
        Recipe::new(0, 100, 0, 4, 200, "iron"),
        Recipe::new(20, 80, 1, 2, 100, "copper"),
        Recipe::new(50, 150, 2, 1, 400, "nickel"),
    ])
    .unwrap()
}

#[test]
fn shared_index_serves_many_readers() {
    let index = fixture();
    let expected: Vec<_> = (0..160)
        .map(|distance| index.lookup(distance, TierMask::ALL).total_weight())
        .collect();

    thread::scope(|scope| {
        for seed in 0..THREADS {
            let index = &index;
            let expected = &expected;
            scope.spawn(move || {
                let mut rng = SmallRng::seed_from_u64(seed);
                for (distance, &weight) in (0..160).zip(expected) {
                    assert_eq!(index.lookup(distance, TierMask::ALL).total_weight(), weight);
                }
                let result = index.lookup(60, TierMask::ALL);
                for _ in 0..DRAWS_PER_THREAD {
                    let recipe = result.sample(&mut rng);
                    assert!(recipe.contains(60));
                }
            });
        }
    });
}

#[test]
fn replacement_swaps_the_shared_slot_under_a_live_reader() {
    let slot = RwLock::new(Arc::new(fixture()));
    let held = Arc::clone(&*slot.read().unwrap());
    let (ready_tx, ready_rx) = mpsc::channel();
    let (swapped_tx, swapped_rx) = mpsc::channel::<()>();

    let handle = thread::spawn(move || {
        ready_tx.send(()).unwrap();
        swapped_rx.recv().unwrap();
        held.lookup(60, TierMask::ALL).total_weight()
    });

    ready_rx.recv().unwrap();
    let replacement =
        Arc::new(AsteroidIndex::build(vec![Recipe::new(0, 10, 0, 1, 1, "salt")]).unwrap());
    let previous = std::mem::replace(&mut *slot.write().unwrap(), replacement);
    swapped_tx.send(()).unwrap();

    assert_eq!(handle.join().unwrap(), 7);
    assert_eq!(previous.recipe_count(), 3);
    let current = Arc::clone(&*slot.read().unwrap());
    assert_eq!(current.recipe_count(), 1);
    assert_eq!(current.lookup(60, TierMask::ALL).total_weight(), 0);
    assert_eq!(current.lookup(5, TierMask::ALL).total_weight(), 1);
}
