//! Symbol geometry detection
//!
//! This module locates a symbol's reference structures inside a bit grid:
//! - Run-length pattern matching (the shared scoring primitive)
//! - Finder pattern detection with orthogonal and diagonal cross-checks
//! - Candidate clustering and best-triple selection

use crate::models::{BitGrid, SymbolGeometry};

/// Detector tuning (scan mode, tolerances)
pub mod config;
/// Finder pattern detection using 1:1:3:1:1 ratio scanning
pub mod finder;
/// Run-length pattern matching primitive
pub mod pattern;

/// The format-dispatch seam: each symbol family resolves its own reference
/// geometry from a bit grid.
///
/// Takes `&mut self` because implementations own scratch buffers; one
/// instance serves one scan at a time.
pub trait GeometryFinder {
    /// Locate the symbol's reference geometry, or report not-found as `None`
    fn find_geometry(&mut self, grid: &BitGrid) -> Option<SymbolGeometry>;
}
