/// Run-length pattern matching, the comparison primitive behind every
/// pattern search in this crate
///
/// A scan produces alternating black/white run lengths; a target describes
/// the expected ratio between them (a finder structure is 1:1:3:1:1). The
/// matcher scores how far the observed runs deviate from the target once
/// both are reduced to a common unit width. All arithmetic is 24.8 fixed
/// point so the same inputs score identically everywhere.
use crate::utils::fixed::Fixed;

/// Center-style finder structure: black-white-black-white-black, 1:1:3:1:1
pub const FINDER_PATTERN: [u32; 5] = [1, 1, 3, 1, 1];

/// Sentinel score meaning "cannot be a match"
pub const NO_MATCH: Fixed = Fixed::MAX;

/// Score observed run lengths against a target ratio pattern.
///
/// Returns the total deviation divided by total observed width as a 24.8
/// ratio; lower is better, zero is a perfect match. Returns [`NO_MATCH`]
/// when:
/// - any observed run is zero (a run that never transitioned cannot be real),
/// - the total observed width is smaller than the pattern's unit count
///   (fewer pixels than one per unit),
/// - any single element deviates from its expected width by more than
///   `max_individual_variance` (a ratio of the unit width).
///
/// Pure function, no side effects.
///
/// # Panics
/// Panics if `counters` and `pattern` differ in length; that is a caller
/// bug, not a scan outcome.
pub fn match_variance(counters: &[u32], pattern: &[u32], max_individual_variance: Fixed) -> Fixed {
    assert_eq!(
        counters.len(),
        pattern.len(),
        "counter and pattern lengths must match"
    );

    if counters.iter().any(|&c| c == 0) {
        return NO_MATCH;
    }

    let total: u64 = counters.iter().map(|&c| c as u64).sum();
    let pattern_units: u64 = pattern.iter().map(|&p| p as u64).sum();
    if total < pattern_units {
        return NO_MATCH;
    }

    // Unit width in 24.8; everything below stays in the scaled domain.
    let shift = Fixed::FRACTIONAL_BITS;
    let unit = (total << shift) / pattern_units;
    let max_individual = (max_individual_variance.raw() as u64 * unit) >> shift;

    let mut total_variance: u64 = 0;
    for (&counter, &expected) in counters.iter().zip(pattern) {
        let scaled = (counter as u64) << shift;
        let target = expected as u64 * unit;
        let variance = scaled.abs_diff(target);
        if variance > max_individual {
            return NO_MATCH;
        }
        total_variance += variance;
    }

    Fixed::from_raw((total_variance / total) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tol(f: f32) -> Fixed {
        Fixed::from_f32(f)
    }

    #[test]
    fn test_exact_match_scores_zero() {
        let score = match_variance(&[3, 3, 9, 3, 3], &FINDER_PATTERN, tol(0.5));
        assert_eq!(score, Fixed::from_raw(0));
    }

    #[test]
    fn test_zero_run_rejected() {
        assert_eq!(
            match_variance(&[3, 0, 9, 3, 3], &FINDER_PATTERN, tol(0.5)),
            NO_MATCH
        );
    }

    #[test]
    fn test_too_narrow_rejected() {
        // Total width 5 < 7 pattern units
        assert_eq!(
            match_variance(&[1, 1, 1, 1, 1], &FINDER_PATTERN, tol(0.5)),
            NO_MATCH
        );
    }

    #[test]
    fn test_individual_deviation_rejected() {
        // Center run barely wider than an outer run: not a 1:1:3:1:1
        assert_eq!(
            match_variance(&[3, 3, 4, 3, 3], &FINDER_PATTERN, tol(0.5)),
            NO_MATCH
        );
    }

    #[test]
    fn test_score_monotonic_in_perturbation() {
        // Perturbing one run further from target must never lower the score
        let mut last = Fixed::from_raw(0);
        for delta in 0..4u32 {
            let score = match_variance(&[9 + delta, 9, 27, 9, 9], &FINDER_PATTERN, tol(0.75));
            assert!(
                score >= last,
                "score decreased from {:?} to {:?} at delta {}",
                last,
                score,
                delta
            );
            last = score;
        }
    }

    #[test]
    #[should_panic(expected = "lengths must match")]
    fn test_length_mismatch_panics() {
        match_variance(&[1, 1, 3], &FINDER_PATTERN, tol(0.5));
    }
}
