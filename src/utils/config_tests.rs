use crate::utils::{BarnesHutConfig, SpTreeError, DEFAULT_BARNES_HUT_CONFIG, validate_theta};

#[test]
fn test_default_matches_constant() {
    let config = BarnesHutConfig::default();
    assert_eq!(config, DEFAULT_BARNES_HUT_CONFIG);
    assert_eq!(config.theta, 0.5);
    assert!(config.validate().is_ok());
}

#[test]
fn test_new_fills_missing_values() {
    let config = BarnesHutConfig::new(Some(0.8), None, Some(1e-9));
    assert_eq!(config.theta, 0.8);
    assert_eq!(config.boundary_epsilon, DEFAULT_BARNES_HUT_CONFIG.boundary_epsilon);
    assert_eq!(config.min_distance_sq, 1e-9);
}

#[test]
fn test_with_theta() {
    let config = BarnesHutConfig::default().with_theta(0.0);
    assert_eq!(config.theta, 0.0);
    assert_eq!(config.boundary_epsilon, DEFAULT_BARNES_HUT_CONFIG.boundary_epsilon);
}

#[test]
fn test_validate_rejects_bad_values() {
    assert_eq!(
        BarnesHutConfig::default().with_theta(-0.1).validate(),
        Err(SpTreeError::InvalidTheta(-0.1))
    );
    assert!(BarnesHutConfig::default().with_theta(f64::NAN).validate().is_err());
    assert!(BarnesHutConfig::new(None, Some(-1.0), None).validate().is_err());
    assert!(BarnesHutConfig::new(None, None, Some(f64::INFINITY)).validate().is_err());
}

#[test]
fn test_validate_theta_accepts_infinity() {
    assert!(validate_theta(0.0).is_ok());
    assert!(validate_theta(f64::INFINITY).is_ok());
}
