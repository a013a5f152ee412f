//! Tests for classification module.

use super::*;

fn clusters() -> (Vec<Vec<f32>>, Vec<u8>) {
    let mut x = Vec::new();
    let mut y = Vec::new();
    for i in 0..40 {
        let jitter = (i as f32 * 0.618).fract();
        x.push(vec![jitter, 1.0 - jitter]);
        y.push(0);
        x.push(vec![20.0 + jitter, 20.0 - jitter]);
        y.push(1);
    }
    (x, y)
}

fn fitted() -> ForestClassifier<u8> {
    let (x, y) = clusters();
    let mut clf = ForestClassifier::new()
        .with_n_trees(6)
        .with_leaf_size(4)
        .with_metric(Metric::Euclidean)
        .with_seed(10);
    clf.fit(x, y).expect("valid training data");
    clf
}

#[test]
fn test_new_is_unfitted() {
    let clf: ForestClassifier<u8> = ForestClassifier::new();
    assert!(!clf.is_fitted());
    assert!(clf.forest().is_none());
    assert!(clf.labels().is_empty());
}

#[test]
fn test_builder_sets_config() {
    let clf: ForestClassifier<u8> = ForestClassifier::new()
        .with_n_trees(3)
        .with_leaf_size(2)
        .with_metric(Metric::Euclidean)
        .with_seed(1);
    assert_eq!(clf.config.n_trees, 3);
    assert_eq!(clf.config.leaf_size, 2);
    assert_eq!(clf.config.metric, Metric::Euclidean);
    assert_eq!(clf.config.seed, Some(1));
}

#[test]
fn test_fit_label_count_mismatch() {
    let mut clf = ForestClassifier::new();
    let err = clf
        .fit(vec![vec![1.0], vec![2.0]], vec!["a"])
        .unwrap_err();
    assert!(matches!(
        err,
        BosqueError::DimensionMismatch {
            expected: 2,
            actual: 1
        }
    ));
    assert!(!clf.is_fitted());
}

#[test]
fn test_fit_empty_fails() {
    let mut clf: ForestClassifier<u8> = ForestClassifier::new();
    let err = clf.fit(Vec::new(), Vec::new()).unwrap_err();
    assert!(matches!(err, BosqueError::EmptyStore));
}

#[test]
fn test_closest_before_fit() {
    let clf: ForestClassifier<u8> = ForestClassifier::new();
    let err = clf.closest(&[0.0, 0.0]).unwrap_err();
    assert!(matches!(err, BosqueError::NotFitted));
}

#[test]
fn test_closest_returns_training_label() {
    let clf = fitted();
    let (label, distance) = clf.closest(&[20.0, 20.0]).expect("fitted");
    assert_eq!(label, 1);
    assert!(distance < 1.5);

    let (label, _) = clf.closest(&[0.5, 0.5]).expect("fitted");
    assert_eq!(label, 0);
}

#[test]
fn test_closest_wrong_dimension() {
    let err = fitted().closest(&[1.0]).unwrap_err();
    assert!(matches!(err, BosqueError::DimensionMismatch { .. }));
}

#[test]
fn test_closest_with_exhausted_budget() {
    let clf = fitted().with_budget(SearchBudget::new().with_max_nodes(0));
    let err = clf.closest(&[0.0, 0.0]).unwrap_err();
    assert!(matches!(err, BosqueError::InvalidHyperparameter { .. }));
}

#[test]
fn test_predict_batch() {
    let clf = fitted();
    let labels = clf
        .predict(&[vec![0.2, 0.8], vec![19.5, 20.5], vec![0.9, 0.1]])
        .expect("fitted");
    assert_eq!(labels, vec![0, 1, 0]);
}

#[test]
fn test_evaluate_perfect_on_training_data() {
    let (x, y) = clusters();
    let eval = fitted().evaluate(&x, &y).expect("fitted");
    assert_eq!(eval.total, 80);
    assert_eq!(eval.mislabeled, 0);
    assert_eq!(eval.accuracy, 1.0);
    assert_eq!(eval.accuracy_percent(), 100.0);
}

#[test]
fn test_evaluate_counts_mislabeled() {
    let clf = fitted();
    let x = vec![vec![0.0, 1.0], vec![20.0, 20.0], vec![0.5, 0.5], vec![20.5, 19.5]];
    // Two of the four expectations are wrong on purpose.
    let y = vec![0, 0, 1, 1];
    let eval = clf.evaluate(&x, &y).expect("fitted");
    assert_eq!(eval.mislabeled, 2);
    assert_eq!(eval.total, 4);
    assert!((eval.accuracy - 0.5).abs() < 1e-6);
    assert!((eval.accuracy_percent() - 50.0).abs() < 1e-4);
}

#[test]
fn test_evaluate_empty_test_set() {
    let err = fitted().evaluate(&[], &[]).unwrap_err();
    assert!(matches!(err, BosqueError::InvalidHyperparameter { .. }));
}

#[test]
fn test_evaluate_count_mismatch() {
    let err = fitted().evaluate(&[vec![0.0, 0.0]], &[0, 1]).unwrap_err();
    assert!(matches!(err, BosqueError::DimensionMismatch { .. }));
}

#[test]
fn test_accuracy_formula() {
    let eval = Evaluation::from_counts(3, 12, Duration::ZERO);
    assert!((eval.accuracy - 0.75).abs() < 1e-6);
}
