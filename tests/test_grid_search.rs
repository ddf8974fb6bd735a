//! Integration test: Hyperparameter grid search

use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use startype::optimizer::{candidates, GridSearch, GridSearchConfig};
use startype::training::{cross_val_score, Classifier, Penalty, Solver};

fn blobs(n_rows: usize) -> (Array2<f64>, Array1<usize>) {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let x = Array2::from_shape_fn((n_rows, 3), |(i, j)| {
        let class = (i % 3) as f64;
        class * 2.0 + j as f64 * 0.5 + rng.gen_range(-1.0..1.0)
    });
    let y = Array1::from_iter((0..n_rows).map(|i| i % 3));
    (x, y)
}

#[test]
fn test_default_grid_records_every_candidate() {
    let (x, y) = blobs(45);
    let mut search = GridSearch::new(GridSearchConfig::default());
    search.fit(&x, &y).unwrap();

    assert_eq!(search.results().len(), 400);
    for result in search.results() {
        let compatible = result.params.solver.supports(result.params.penalty);
        if !compatible || result.params.penalty == Penalty::ElasticNet {
            assert!(result.mean_score.is_none(), "{} should have failed", result.params);
            assert!(result.error.is_some());
        }
        if let Some(score) = result.mean_score {
            assert!((0.0..=1.0).contains(&score));
        }
    }

    let best = search.best_params().unwrap();
    assert!(best.solver.supports(best.penalty));
    let best_score = search.best_score().unwrap();
    assert!(search
        .results()
        .iter()
        .filter_map(|r| r.mean_score)
        .all(|s| s <= best_score));
}

#[test]
fn test_candidate_order_matches_grid_layout() {
    let config = GridSearchConfig::default();
    let grid = candidates(&config);
    assert_eq!(grid.len(), 400);
    // C varies slowest, solver fastest
    assert_eq!(grid[0].solver, Solver::Lbfgs);
    assert_eq!(grid[1].solver, Solver::NewtonCg);
    assert_eq!(grid[5].penalty, Penalty::L2);
    assert_eq!(grid[0].c, grid[19].c);
    assert!(grid[20].c > grid[19].c);
}

#[test]
fn test_elasticnet_with_ratio() {
    let (x, y) = blobs(30);
    let config = GridSearchConfig::default()
        .with_c_values(vec![1.0])
        .with_penalties(vec![Penalty::ElasticNet])
        .with_solvers(vec![Solver::Saga])
        .with_l1_ratio(Some(0.5));
    let mut search = GridSearch::new(config);
    search.fit(&x, &y).unwrap();
    assert!(search.results()[0].mean_score.is_some());
}

#[test]
fn test_best_estimator_predicts() {
    let (x, y) = blobs(60);
    let config = GridSearchConfig::default().with_c_values(vec![0.1, 1.0, 10.0]);
    let mut search = GridSearch::new(config);
    search.fit(&x, &y).unwrap();

    let predictions = Classifier::predict(&search, &x).unwrap();
    assert_eq!(predictions.len(), 60);
    assert!(Classifier::score(&search, &x, &y).unwrap() > 0.6);
    assert!(search.best_estimator().unwrap().is_fitted);
}

#[test]
fn test_search_can_be_cross_validated() {
    let (x, y) = blobs(40);
    let config = GridSearchConfig::default()
        .with_c_values(vec![0.1, 10.0])
        .with_penalties(vec![Penalty::L2, Penalty::None])
        .with_solvers(vec![Solver::Lbfgs, Solver::NewtonCg]);
    let cv = cross_val_score(&GridSearch::new(config), &x, &y, 10).unwrap();
    assert_eq!(cv.n_folds, 10);
    assert!((0.0..=1.0).contains(&cv.mean_score));
}

#[test]
fn test_worker_count_does_not_change_results() {
    let (x, y) = blobs(45);
    let base = GridSearchConfig::default().with_c_values(vec![0.01, 1.0, 100.0]);

    let mut sequential = GridSearch::new(base.clone().with_n_jobs(1));
    sequential.fit(&x, &y).unwrap();
    let mut pooled = GridSearch::new(base.clone().with_n_jobs(3));
    pooled.fit(&x, &y).unwrap();
    let mut global = GridSearch::new(base.with_n_jobs(0));
    global.fit(&x, &y).unwrap();

    let scores = |s: &GridSearch| s.results().iter().map(|r| r.mean_score).collect::<Vec<_>>();
    assert_eq!(scores(&sequential), scores(&pooled));
    assert_eq!(scores(&sequential), scores(&global));
    assert_eq!(sequential.best_params(), global.best_params());
}
