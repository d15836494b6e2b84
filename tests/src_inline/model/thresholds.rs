use super::*;

// Test-only size helpers; removed from the production API as dead code.
impl ThresholdTable {
    pub(crate) fn len(&self) -> usize {
        self.sizes.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}

#[test]
fn test_nearest_lookup() {
    let f = ThresholdFunction::from_points(vec![5.0, 10.0, 15.0], vec![3.0, 2.0, 1.5]);
    assert_eq!(f.min_snr(5.0), 3.0);
    assert_eq!(f.min_snr(7.4), 3.0);
    assert_eq!(f.min_snr(7.6), 2.0);
    assert_eq!(f.min_snr(14.0), 1.5);
}

#[test]
fn test_midpoint_resolves_to_lower_knot() {
    let f = ThresholdFunction::from_points(vec![0.0, 2.0], vec![10.0, 20.0]);
    assert_eq!(f.min_snr(1.0), 10.0);
}

#[test]
fn test_extrapolates_with_endpoints() {
    let f = ThresholdFunction::from_points(vec![5.0, 10.0, 15.0], vec![3.0, 2.0, 1.5]);
    assert_eq!(f.min_snr(-100.0), 3.0);
    assert_eq!(f.min_snr(1e9), 1.5);
}

#[test]
fn test_unsorted_input() {
    let f = ThresholdFunction::from_points(vec![15.0, 5.0, 10.0], vec![1.5, 3.0, 2.0]);
    assert_eq!(f.min_snr(5.0), 3.0);
    assert_eq!(f.min_snr(15.0), 1.5);
    assert_eq!(f.min_snr(9.0), 2.0);
}

#[test]
fn test_empty_function_rejects_everything() {
    let f = ThresholdFunction::from_points(Vec::new(), Vec::new());
    assert!(f.min_snr(10.0).is_infinite());
}

#[test]
fn test_table_helpers() {
    let table = ThresholdTable {
        n_samples: 10,
        min_n_samples: 3,
        n_perm: 100,
        sizes: vec![3, 4, 5],
        thresholds: vec![2.0, 1.8, 1.7],
    };
    assert_eq!(table.len(), 3);
    assert!(!table.is_empty());
    assert_eq!(table.sizes_f64(), vec![3.0, 4.0, 5.0]);
}
