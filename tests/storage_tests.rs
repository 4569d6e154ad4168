#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use evodrive::simulation::brain::Network;
use evodrive::simulation::trainer::TrainingContext;
use evodrive::storage::{JsonFileStore, MemoryStore, NetworkStore, RunMetadata, StoreError};
use rand::SeedableRng;
use rand::rngs::SmallRng;

fn test_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("evodrive_{}_{}", name, std::process::id()));
    fs::remove_dir_all(&dir).ok();
    dir
}

fn create_test_network(seed: u64) -> Network {
    Network::for_controls(24, 16, &mut SmallRng::seed_from_u64(seed))
}

fn metadata(generation: u32, fitness: f32) -> RunMetadata {
    RunMetadata {
        generation,
        fitness,
        distance: fitness / 2.0,
        saved_at: Utc::now(),
    }
}

#[test]
fn test_memory_store_round_trip() {
    let mut store = MemoryStore::new();
    assert!(store.load_network().is_none());

    let network = create_test_network(1);
    store
        .save_network(&network, &metadata(3, 120.0))
        .expect("Failed to save");

    assert_eq!(store.load_network(), Some(network));
    assert_eq!(store.history().count(), 1);
}

#[test]
fn test_memory_store_rejects_corrupt_data() {
    let mut store = MemoryStore::new();

    store.put_raw("{ this is not valid json }");
    assert!(store.load_network().is_none());

    store.put_raw(r#"{"version":99,"levels":[]}"#);
    assert!(store.load_network().is_none());
}

#[test]
fn test_file_store_save_and_load() {
    let dir = test_dir("save_and_load");
    let mut store = JsonFileStore::open(&dir).expect("Failed to open store");
    assert!(store.load_network().is_none());

    let network = create_test_network(2);
    store
        .save_network(&network, &metadata(4, 80.0))
        .expect("Failed to save");

    let reopened = JsonFileStore::open(&dir).expect("Failed to reopen store");
    assert_eq!(reopened.load_network(), Some(network));

    let archive = reopened.archive().expect("Failed to list archive");
    assert_eq!(archive.len(), 1);
    assert_eq!(archive[0].metadata.generation, 4);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_archive_is_sorted_by_fitness() {
    let dir = test_dir("archive_sorted");
    let mut store = JsonFileStore::open(&dir).expect("Failed to open store");

    for (i, fitness) in [60.0, 300.0, 150.0].into_iter().enumerate() {
        store
            .save_network(&create_test_network(i as u64), &metadata(i as u32 + 1, fitness))
            .expect("Failed to save");
    }

    let fitnesses: Vec<f32> = store
        .archive()
        .expect("Failed to list archive")
        .iter()
        .map(|s| s.metadata.fitness)
        .collect();
    assert_eq!(fitnesses, vec![300.0, 150.0, 60.0]);

    // The latest save is the seed, not the fittest.
    assert_eq!(store.load_network(), Some(create_test_network(2)));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_promote_makes_entry_the_seed() {
    let dir = test_dir("promote");
    let mut store = JsonFileStore::open(&dir).expect("Failed to open store");
    store
        .save_network(&create_test_network(10), &metadata(7, 400.0))
        .expect("Failed to save");
    store
        .save_network(&create_test_network(11), &metadata(9, 90.0))
        .expect("Failed to save");

    let best = store.archive().expect("Failed to list archive")[0].clone();
    let generation = store.promote(&best.id).expect("Failed to promote");

    assert_eq!(generation, 7);
    assert_eq!(store.load_network(), Some(best.network));
    assert_eq!(store.load_context().generation, 7);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_delete_last_entry_clears_seed() {
    let dir = test_dir("delete");
    let mut store = JsonFileStore::open(&dir).expect("Failed to open store");
    store
        .save_network(&create_test_network(20), &metadata(1, 100.0))
        .expect("Failed to save");
    store
        .save_network(&create_test_network(21), &metadata(2, 110.0))
        .expect("Failed to save");

    let ids: Vec<String> = store
        .archive()
        .expect("Failed to list archive")
        .into_iter()
        .map(|s| s.id)
        .collect();

    store.delete(&ids[0]).expect("Failed to delete");
    assert!(store.load_network().is_some());

    store.delete(&ids[1]).expect("Failed to delete");
    assert!(store.load_network().is_none());

    assert!(matches!(
        store.delete(&ids[1]),
        Err(StoreError::UnknownEntry(_))
    ));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_discard_resets_seed_and_context() {
    let dir = test_dir("discard");
    let mut store = JsonFileStore::open(&dir).expect("Failed to open store");
    store
        .save_network(&create_test_network(30), &metadata(5, 200.0))
        .expect("Failed to save");
    let context = TrainingContext {
        generation: 5,
        best_ever_fitness: 200.0,
        best_ever_distance: 100.0,
        best_network: None,
    };
    store.save_context(&context).expect("Failed to save context");

    store.discard().expect("Failed to discard");

    assert!(store.load_network().is_none());
    assert_eq!(store.load_context(), TrainingContext::default());
    assert_eq!(store.archive().expect("Failed to list archive").len(), 1);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_context_round_trip_skips_network() {
    let dir = test_dir("context");
    let store = JsonFileStore::open(&dir).expect("Failed to open store");
    let context = TrainingContext {
        generation: 12,
        best_ever_fitness: 512.5,
        best_ever_distance: 300.0,
        best_network: Some(create_test_network(40)),
    };

    store.save_context(&context).expect("Failed to save context");
    let loaded = store.load_context();

    assert_eq!(loaded.generation, 12);
    assert_eq!(loaded.best_ever_fitness, 512.5);
    assert_eq!(loaded.best_ever_distance, 300.0);
    assert!(loaded.best_network.is_none());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_corrupt_files_fall_back_to_defaults() {
    let dir = test_dir("corrupt");
    let store = JsonFileStore::open(&dir).expect("Failed to open store");
    fs::write(dir.join("best_network.json"), "{ this is not valid json }")
        .expect("Failed to write test file");
    fs::write(dir.join("context.json"), "{ generation: ").expect("Failed to write test file");
    fs::write(dir.join("archive").join("brain_1.json"), "garbage")
        .expect("Failed to write test file");

    assert!(store.load_network().is_none());
    assert_eq!(store.load_context(), TrainingContext::default());
    assert!(store.archive().expect("Failed to list archive").is_empty());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_mismatched_shape_loads_but_trainer_rejects() {
    let dir = test_dir("mismatched");
    let mut store = JsonFileStore::open(&dir).expect("Failed to open store");
    let small = Network::for_controls(6, 4, &mut SmallRng::seed_from_u64(50));
    store
        .save_network(&small, &metadata(1, 60.0))
        .expect("Failed to save");

    let context = TrainingContext {
        best_network: store.load_network(),
        ..TrainingContext::default()
    };
    assert!(context.best_network.is_some());

    let mut params = evodrive::simulation::params::Params::default();
    params.training.seed = Some(1);
    params.training.population_size = 2;
    let trainer = evodrive::simulation::trainer::Trainer::new(params, context);
    assert!(trainer.context().best_network.is_none());

    fs::remove_dir_all(&dir).ok();
}
