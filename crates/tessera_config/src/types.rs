//! Strongly-typed configuration structures deserialized from `tessera.toml`.

use serde::{Deserialize, Serialize};

/// Root of the placer configuration.
///
/// ```toml
/// [analytic]
/// alpha = 0.1
///
/// [spreader]
/// beta = 0.9
///
/// [legalizer]
/// seed = 7
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacerConfig {
    /// Quadratic solver and outer loop settings.
    #[serde(default)]
    pub analytic: AnalyticConfig,
    /// Cut-spreading settings.
    #[serde(default)]
    pub spreader: SpreaderConfig,
    /// Strict legalization settings.
    #[serde(default)]
    pub legalizer: LegalizerConfig,
}

/// Settings of the quadratic solver and the solve/spread/legalize loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticConfig {
    /// Anchor strength pulling solved positions toward the last legal placement.
    pub alpha: f64,
    /// Relative residual tolerance of the conjugate gradient solver.
    pub solver_tolerance: f64,
    /// Number of solves per block type in every outer iteration.
    pub build_solve_iter: usize,
    /// Consecutive non-improving outer iterations before the loop stops.
    pub stall_iterations: usize,
    /// Hard cap on outer iterations, if any.
    pub max_iterations: Option<usize>,
    /// Nets with more pins than this are left out of the net model.
    pub max_net_fanout: Option<usize>,
    /// Multiplier of pin criticality in connection weights.
    pub timing_weight: f64,
    /// Exponent applied to pin criticality before weighting.
    pub criticality_exponent: f64,
}

impl Default for AnalyticConfig {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            solver_tolerance: 1e-5,
            build_solve_iter: 5,
            stall_iterations: 15,
            max_iterations: None,
            max_net_fanout: None,
            timing_weight: 10.0,
            criticality_exponent: 1.0,
        }
    }
}

/// Settings of the recursive cut spreader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpreaderConfig {
    /// Target utilization: a region is overused when `blocks > beta * slots`.
    pub beta: f64,
    /// Columns added on each side per horizontal expansion step.
    pub spread_scale_x: usize,
    /// Rows added on each side per vertical expansion step.
    pub spread_scale_y: usize,
    /// Upper bound on interpolation bins per side of a cut.
    pub interpolation_bins: usize,
    /// Block type names that skip cut-spreading entirely.
    pub skip_types: Vec<String>,
}

impl Default for SpreaderConfig {
    fn default() -> Self {
        Self {
            beta: 1.0,
            spread_scale_x: 1,
            spread_scale_y: 1,
            interpolation_bins: 10,
            skip_types: vec!["io".to_string()],
        }
    }
}

/// Settings of the strict legalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegalizerConfig {
    /// Seed of the random number generator shared by the randomized phases.
    pub seed: u64,
    /// Search radius beyond which occupied slots may always be ripped up.
    pub initial_ripup_radius: i32,
    /// Probability of considering an occupied slot inside the rip-up radius.
    pub ripup_probability: f64,
}

impl Default for LegalizerConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            initial_ripup_radius: 2,
            ripup_probability: 10.0 / 20000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tuned_values() {
        let config = PlacerConfig::default();
        assert_eq!(config.analytic.alpha, 0.1);
        assert_eq!(config.analytic.build_solve_iter, 5);
        assert_eq!(config.analytic.stall_iterations, 15);
        assert_eq!(config.spreader.beta, 1.0);
        assert_eq!(config.spreader.interpolation_bins, 10);
        assert_eq!(config.spreader.skip_types, vec!["io"]);
        assert_eq!(config.legalizer.initial_ripup_radius, 2);
        assert!((config.legalizer.ripup_probability - 0.0005).abs() < 1e-12);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: PlacerConfig = toml::from_str("[spreader]\nbeta = 0.8\n").unwrap();
        assert_eq!(config.spreader.beta, 0.8);
        assert_eq!(config.spreader.spread_scale_x, 1);
        assert_eq!(config.analytic, AnalyticConfig::default());
    }
}
