//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::PlacerConfig;
use std::path::Path;

/// Loads and validates a `tessera.toml` configuration from a directory.
///
/// Reads `<dir>/tessera.toml`, parses it, and validates every value.
pub fn load_config(dir: &Path) -> Result<PlacerConfig, ConfigError> {
    let config_path = dir.join("tessera.toml");
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `tessera.toml` configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<PlacerConfig, ConfigError> {
    let config: PlacerConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError(message.to_string())
}

/// Checks that every configuration value lies in its usable range.
pub fn validate_config(config: &PlacerConfig) -> Result<(), ConfigError> {
    let analytic = &config.analytic;
    if analytic.alpha.is_nan() || analytic.alpha < 0.0 {
        return Err(invalid("analytic.alpha must be non-negative"));
    }
    if analytic.solver_tolerance.is_nan() || analytic.solver_tolerance <= 0.0 {
        return Err(invalid("analytic.solver_tolerance must be positive"));
    }
    if analytic.build_solve_iter == 0 {
        return Err(invalid("analytic.build_solve_iter must be at least 1"));
    }
    if analytic.stall_iterations == 0 {
        return Err(invalid("analytic.stall_iterations must be at least 1"));
    }
    if analytic.max_net_fanout.is_some_and(|f| f < 2) {
        return Err(invalid("analytic.max_net_fanout must be at least 2"));
    }

    let spreader = &config.spreader;
    if spreader.beta.is_nan() || spreader.beta <= 0.0 {
        return Err(invalid("spreader.beta must be positive"));
    }
    if spreader.spread_scale_x == 0 || spreader.spread_scale_y == 0 {
        return Err(invalid("spreader spread scales must be at least 1"));
    }
    if spreader.interpolation_bins == 0 {
        return Err(invalid("spreader.interpolation_bins must be at least 1"));
    }

    let legalizer = &config.legalizer;
    if legalizer.initial_ripup_radius < 0 {
        return Err(invalid("legalizer.initial_ripup_radius must be non-negative"));
    }
    if !(0.0..=1.0).contains(&legalizer.ripup_probability) {
        return Err(invalid("legalizer.ripup_probability must lie in [0, 1]"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config, PlacerConfig::default());
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[analytic]
alpha = 0.2
solver_tolerance = 1e-6
build_solve_iter = 3
stall_iterations = 4
max_iterations = 40
max_net_fanout = 64
timing_weight = 5.0
criticality_exponent = 2.0

[spreader]
beta = 0.9
spread_scale_x = 2
spread_scale_y = 1
interpolation_bins = 6
skip_types = ["io", "pad"]

[legalizer]
seed = 42
initial_ripup_radius = 3
ripup_probability = 0.01
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.analytic.alpha, 0.2);
        assert_eq!(config.analytic.max_iterations, Some(40));
        assert_eq!(config.analytic.max_net_fanout, Some(64));
        assert_eq!(config.spreader.spread_scale_x, 2);
        assert_eq!(config.spreader.skip_types, vec!["io", "pad"]);
        assert_eq!(config.legalizer.seed, 42);
        assert_eq!(config.legalizer.initial_ripup_radius, 3);
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn wrong_field_type_errors() {
        let err = load_config_from_str("[analytic]\nalpha = \"high\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn zero_beta_rejected() {
        let err = load_config_from_str("[spreader]\nbeta = 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn negative_alpha_rejected() {
        let err = load_config_from_str("[analytic]\nalpha = -1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn ripup_probability_out_of_range_rejected() {
        let err = load_config_from_str("[legalizer]\nripup_probability = 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn zero_bins_rejected() {
        let err = load_config_from_str("[spreader]\ninterpolation_bins = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tessera.toml"), "[legalizer]\nseed = 9\n").unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.legalizer.seed, 9);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/tessera")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
