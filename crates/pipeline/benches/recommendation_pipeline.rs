//! Benchmarks for the recommendation stages
//!
//! Run with: cargo bench --package pipeline
//!
//! Uses a synthetic rating store (600 users, 2000 movies) and a latent-factor
//! model so no dataset download is needed.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use data_loader::{DataIndex, Movie, Rating};
use pipeline::{Aggregator, NeighborFinder, Scorer, SeededAnchor, SimilaritySelector};
use predictor::{LatentFactorModel, RatingPredictor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

const USERS: u32 = 600;
const MOVIES: u32 = 2000;
const RATINGS_PER_USER: usize = 80;
const FACTORS: usize = 16;

fn build_synthetic_data() -> (Arc<DataIndex>, Arc<dyn RatingPredictor>) {
    let mut rng = StdRng::seed_from_u64(7);
    let mut index = DataIndex::new();
    let mut model = LatentFactorModel::new(3.5);

    for movie_id in 1..=MOVIES {
        index.insert_movie(Movie {
            id: movie_id,
            title: format!("Synthetic Movie {} (2001)", movie_id),
            year: Some(2001),
            genres: vec![],
        });
        let factors = (0..FACTORS).map(|_| rng.random_range(-0.3..0.3)).collect();
        model = model
            .with_item_bias(movie_id, rng.random_range(-0.5..0.5))
            .with_item_factors(movie_id, factors);
    }

    for user_id in 1..=USERS {
        for _ in 0..RATINGS_PER_USER {
            let movie_id = rng.random_range(1..=MOVIES);
            let rating = rng.random_range(1..=10) as f32 * 0.5;
            index.insert_rating(Rating {
                user_id,
                movie_id,
                rating,
            });
        }
        let factors = (0..FACTORS).map(|_| rng.random_range(-0.3..0.3)).collect();
        model = model
            .with_user_bias(user_id, rng.random_range(-0.5..0.5))
            .with_user_factors(user_id, factors);
    }

    index.build_secondary_indices();
    index.compute_movie_stats();
    (Arc::new(index), Arc::new(model))
}

fn favorites() -> Vec<String> {
    [3, 141, 592, 1200, 1999]
        .iter()
        .map(|id| format!("Synthetic Movie {} (2001)", id))
        .collect()
}

fn bench_find_neighbors(c: &mut Criterion) {
    let (data_index, predictor) = build_synthetic_data();
    let finder = NeighborFinder::new(data_index, predictor);
    let titles = favorites();

    c.bench_function("find_neighbors_5_titles", |b| {
        b.iter(|| {
            let neighbors = finder.find_neighbors(black_box(titles.as_slice())).unwrap();
            black_box(neighbors)
        })
    });
}

fn bench_score_and_select(c: &mut Criterion) {
    let (data_index, predictor) = build_synthetic_data();
    let neighbors = NeighborFinder::new(data_index.clone(), predictor)
        .find_neighbors(favorites().as_slice())
        .unwrap();
    let aggregator = Aggregator::new(data_index);
    let scorer = Scorer::new();
    let selector = SimilaritySelector::new();
    let anchor = SeededAnchor::new(42);

    c.bench_function("aggregate_score_select", |b| {
        b.iter(|| {
            let stats = aggregator.aggregate(black_box(&neighbors));
            let scores = scorer.score(stats);
            black_box(selector.select(&scores, 10, &anchor))
        })
    });
}

fn bench_full_pipeline(c: &mut Criterion) {
    let (data_index, predictor) = build_synthetic_data();
    let finder = NeighborFinder::new(data_index.clone(), predictor);
    let aggregator = Aggregator::new(data_index);
    let scorer = Scorer::new();
    let selector = SimilaritySelector::new();
    let anchor = SeededAnchor::new(42);
    let titles = favorites();

    c.bench_function("full_pipeline", |b| {
        b.iter(|| {
            let neighbors = finder.find_neighbors(black_box(titles.as_slice())).unwrap();
            let scores = scorer.score(aggregator.aggregate(&neighbors));
            black_box(selector.select(&scores, 10, &anchor))
        })
    });
}

criterion_group!(
    benches,
    bench_find_neighbors,
    bench_score_and_select,
    bench_full_pipeline
);
criterion_main!(benches);
