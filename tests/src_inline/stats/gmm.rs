use super::*;

#[test]
fn test_separates_two_clusters() {
    let values = [0.0, 0.1, -0.1, 0.05, -0.05, 10.0, 10.1, 9.9, 10.05, 9.95];
    let model = fit_two_components(&values, 200, 1e-8).unwrap();
    assert!(model.means[0] < 1.0);
    assert!(model.means[1] > 9.0);
    assert!((model.weights[0] - 0.5).abs() < 1e-6);
    for &v in &values[..5] {
        assert!(model.upper_posterior(v) < 0.5);
    }
    for &v in &values[5..] {
        assert!(model.upper_posterior(v) > 0.5);
    }
}

#[test]
fn test_unbalanced_clusters() {
    let mut values = vec![0.0; 0];
    for i in 0..16 {
        values.push(1.0 + (i % 4) as f64 * 0.05);
    }
    for i in 0..4 {
        values.push(8.0 + i as f64 * 0.05);
    }
    let model = fit_two_components(&values, 500, 1e-10).unwrap();
    assert!(model.weights[1] < 0.3);
    assert!(model.upper_posterior(8.1) > 0.99);
    assert!(model.upper_posterior(1.1) < 0.01);
}

#[test]
fn test_constant_and_short_inputs() {
    assert!(fit_two_components(&[1.0, 1.0, 1.0], 100, 1e-6).is_none());
    assert!(fit_two_components(&[1.0], 100, 1e-6).is_none());
}

#[test]
fn test_deterministic() {
    let values = [0.3, 2.2, 0.1, 2.5, 0.2, 2.4, 0.4, 2.1];
    let a = fit_two_components(&values, 100, 1e-9).unwrap();
    let b = fit_two_components(&values, 100, 1e-9).unwrap();
    assert_eq!(a, b);
}
