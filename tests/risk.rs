use rockview::risk::{self, RiskLevel};
use rockview::terrain::{self, RiskGrid};

fn uniform(n: usize, v: f32) -> RiskGrid {
    RiskGrid::new(n, vec![v; n * n]).unwrap().0
}

#[test]
fn levels_for_uniform_grids() {
    assert_eq!(risk::summarize(&uniform(4, 0.9)).level, RiskLevel::Extreme);
    assert_eq!(risk::summarize(&uniform(4, 0.7)).level, RiskLevel::High);
    assert_eq!(risk::summarize(&uniform(4, 0.5)).level, RiskLevel::Moderate);
    assert_eq!(risk::summarize(&uniform(4, 0.1)).level, RiskLevel::Low);
}

#[test]
fn thresholds_are_strict() {
    assert_eq!(RiskLevel::from_mean(0.8), RiskLevel::High);
    assert_eq!(RiskLevel::from_mean(0.6), RiskLevel::Moderate);
    assert_eq!(RiskLevel::from_mean(0.4), RiskLevel::Low);
    // The 0.2..0.4 range is still Low; there is no fifth band.
    assert_eq!(RiskLevel::from_mean(0.3), RiskLevel::Low);
    assert_eq!(RiskLevel::from_mean(0.0), RiskLevel::Low);
}

#[test]
fn min_max_mean() {
    let g = RiskGrid::new(2, vec![0.0, 0.25, 0.75, 1.0]).unwrap().0;
    let s = risk::summarize(&g);
    assert_eq!(s.min, 0.0);
    assert_eq!(s.max, 1.0);
    assert_eq!(s.mean, 0.5);
    assert_eq!(s.level, RiskLevel::Moderate);
    assert_eq!(s.level.label(), "Moderate");
}

#[test]
fn absent_grid_has_no_summary() {
    assert!(risk::summarize_opt(None).is_none());
}

#[test]
fn summarizing_twice_is_identical() {
    let dem = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
    let r = vec![vec![0.15, 0.95], vec![0.42, 0.61]];
    let t = terrain::load(&dem, Some(&r)).unwrap();
    let a = risk::summarize_opt(t.risk.as_ref()).unwrap();
    let b = risk::summarize_opt(t.risk.as_ref()).unwrap();
    assert_eq!(a, b);
    assert_eq!(t.risk.as_ref().unwrap().values(), &[0.15, 0.95, 0.42, 0.61]);
}

#[test]
fn undersized_grid_is_rejected() {
    assert!(RiskGrid::new(0, vec![]).is_none());
    assert!(RiskGrid::new(1, vec![0.5]).is_none());
    let s = risk::summarize(&uniform(2, 0.3));
    assert!(s.min.is_finite() && s.max.is_finite() && s.mean.is_finite());
}
