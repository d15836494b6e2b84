use super::*;

#[test]
fn test_bimodal_break() {
    let values = [1.0, 1.1, 0.9, 1.05, 0.95, 5.0, 5.1, 4.9, 5.05, 4.95];
    assert_eq!(jenks_break(&values), Some(1.1));
}

#[test]
fn test_break_on_counts_with_ties() {
    let counts = [4.0, 0.0, 4.0, 0.0, 4.0, 0.0, 4.0, 0.0, 4.0, 0.0, 4.0, 0.0];
    assert_eq!(jenks_break(&counts), Some(0.0));
}

#[test]
fn test_outlier_gets_own_class() {
    let values = [0.0, 0.1, 0.2, 0.3, 0.4, 100.0];
    assert_eq!(jenks_break(&values), Some(0.4));
}

#[test]
fn test_constant_input_breaks_at_minimum() {
    assert_eq!(jenks_break(&[2.0, 2.0, 2.0]), Some(2.0));
}

#[test]
fn test_too_short() {
    assert_eq!(jenks_break(&[]), None);
    assert_eq!(jenks_break(&[1.0]), None);
    assert_eq!(jenks_break(&[3.0, 1.0]), Some(1.0));
}

#[test]
fn test_order_independent() {
    let a = [9.0, 1.0, 8.5, 0.5, 1.5, 9.5];
    let b = [0.5, 1.0, 1.5, 8.5, 9.0, 9.5];
    assert_eq!(jenks_break(&a), jenks_break(&b));
    assert_eq!(jenks_break(&a), Some(1.5));
}
