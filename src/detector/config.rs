use crate::utils::fixed::Fixed;

/// Row scan granularity
///
/// Quick skips rows between scans, trading recall for latency; Exhaustive
/// visits every row. A caller that gets no result from a quick pass retries
/// with an exhaustive one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    /// Coarse row stride derived from the grid height
    #[default]
    Quick,
    /// Row stride of 1
    Exhaustive,
}

/// Detector tuning knobs
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Row scan granularity
    pub scan: ScanMode,
    /// Per-run deviation tolerance, as a ratio of the unit width
    pub max_individual_variance: Fixed,
    /// Average deviation threshold for accepting a run-length match
    pub max_total_variance: Fixed,
    /// How many reference structures the format requires (3 for the
    /// triangular layout)
    pub required_centers: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            scan: ScanMode::Quick,
            max_individual_variance: Fixed::from_f32(0.625),
            max_total_variance: Fixed::from_f32(0.45),
            required_centers: 3,
        }
    }
}

impl DetectorConfig {
    /// Config with an exhaustive row scan
    pub fn exhaustive() -> Self {
        Self {
            scan: ScanMode::Exhaustive,
            ..Self::default()
        }
    }
}
