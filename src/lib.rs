//! gridcode - geometry and error-correction core for 2D symbol readers
//!
//! A pure Rust library for the format-agnostic heart of optical symbol
//! recovery: locating finder structures in a binarized pixel grid,
//! perspective-resampling the symbol into an idealized module matrix, and
//! correcting codeword errors with Reed-Solomon over GF(256). Format
//! specific concerns (binarization, codeword placement, bitstream decoding)
//! live in the collaborators that consume this crate.

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Symbol geometry detection (pattern matching, finder detection)
pub mod detector;
/// GF(256) Reed-Solomon error correction
pub mod ecc;
/// Core data structures (BitGrid, Point, SymbolGeometry)
pub mod models;
/// Perspective grid sampling
pub mod sampler;
/// Shared numeric utilities (fixed-point arithmetic)
pub mod utils;

pub use detector::GeometryFinder;
pub use detector::config::{DetectorConfig, ScanMode};
pub use detector::finder::{FinderCandidate, FinderDetector};
pub use ecc::{DATA_MATRIX_FIELD, EccError, Gf256Field, QR_FIELD, RsDecoder, RsEncoder};
pub use models::{BitGrid, Point, SymbolGeometry};
pub use sampler::{GridSampler, OutOfBoundsPolicy, SampleError, SamplePoint};

use rayon::prelude::*;

/// Detect symbol geometry in a bit grid.
///
/// Runs a quick pass first and rescans exhaustively only when nothing is
/// found, which is the retry strategy most callers want.
pub fn detect_geometry(grid: &BitGrid) -> Option<SymbolGeometry> {
    let found = FinderDetector::new(DetectorConfig::default()).detect(grid);
    if found.is_some() {
        return found;
    }
    FinderDetector::new(DetectorConfig::exhaustive()).detect(grid)
}

/// Detect symbol geometry with an explicit configuration (no fallback pass)
pub fn detect_geometry_with(grid: &BitGrid, config: DetectorConfig) -> Option<SymbolGeometry> {
    FinderDetector::new(config).detect(grid)
}

/// Detect geometry across many independent grids in parallel.
///
/// Each worker constructs its own detector: detector instances own scratch
/// buffers and serve one scan at a time, so throughput comes from one
/// instance per grid rather than sharing one.
pub fn detect_geometry_batch(
    grids: &[BitGrid],
    config: &DetectorConfig,
) -> Vec<Option<SymbolGeometry>> {
    grids
        .par_iter()
        .map(|grid| FinderDetector::new(config.clone()).detect(grid))
        .collect()
}

/// Detector with configuration options and a sampling stage
///
/// Bundles a [`FinderDetector`] and a [`GridSampler`] behind one handle;
/// one instance serves one scan at a time.
pub struct Detector {
    finder: FinderDetector,
    sampler: GridSampler,
}

impl Detector {
    /// Create a detector with default settings
    pub fn new() -> Self {
        Self::with_config(DetectorConfig::default())
    }

    /// Create a detector with a specific scan configuration
    pub fn with_config(config: DetectorConfig) -> Self {
        Self {
            finder: FinderDetector::new(config),
            sampler: GridSampler::new(),
        }
    }

    /// Replace the sampling policy
    pub fn with_sampler(mut self, sampler: GridSampler) -> Self {
        self.sampler = sampler;
        self
    }

    /// Detect the symbol's reference geometry
    pub fn detect(&mut self, grid: &BitGrid) -> Option<SymbolGeometry> {
        self.finder.detect(grid)
    }

    /// Resample the grid into a `dim_x` x `dim_y` module matrix under a
    /// detected geometry; the dimensions come from the format collaborator
    pub fn sample(
        &self,
        grid: &BitGrid,
        geometry: &SymbolGeometry,
        dim_x: usize,
        dim_y: usize,
    ) -> Result<BitGrid, SampleError> {
        self.sampler.sample(grid, geometry, dim_x, dim_y)
    }
}

impl Default for Detector {
    fn default() -> Self {
        Self::new()
    }
}
