//! Perspective grid sampling
//!
//! Resolves a detected geometry into a perspective transform and resamples
//! the source grid at every module position, producing the clean module
//! matrix that codeword extraction consumes.

use log::trace;
use thiserror::Error;

use crate::models::{BitGrid, Point, SymbolGeometry};

/// Projective transforms between module space and image space
pub mod perspective;

pub use perspective::PerspectiveTransform;

/// What to do when a mapped sample point lands outside the source grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutOfBoundsPolicy {
    /// Fail the whole sample with [`SampleError::PointOutOfBounds`]; the
    /// geometry was bad and the caller may retry detection differently
    #[default]
    Fail,
    /// Clamp to the nearest valid pixel
    Clamp,
}

/// Where inside each module cell the sample point lies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplePoint {
    /// Cell centers: a 0.5 module offset (the geometry references module
    /// centers, the common case)
    #[default]
    Center,
    /// Cell corners: no offset (for formats whose geometric reference is
    /// the module corner lattice)
    Corner,
}

/// Sampling failure
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleError {
    /// The transform mapped a module outside the pixel grid
    #[error("sample point ({x:.1}, {y:.1}) is outside the {width}x{height} grid")]
    PointOutOfBounds {
        /// Mapped x in image space
        x: f32,
        /// Mapped y in image space
        y: f32,
        /// Source grid width
        width: usize,
        /// Source grid height
        height: usize,
    },
    /// The reference geometry admits no perspective transform
    #[error("reference geometry is degenerate, no perspective transform exists")]
    DegenerateGeometry,
}

/// Resamples a bit grid into an idealized module matrix
#[derive(Debug, Clone, Copy, Default)]
pub struct GridSampler {
    /// Out-of-bounds handling
    pub policy: OutOfBoundsPolicy,
    /// Module sample point convention
    pub sample_point: SamplePoint,
}

impl GridSampler {
    /// Sampler with the default policy (fail on out-of-bounds, sample cell
    /// centers)
    pub fn new() -> Self {
        Self::default()
    }

    /// Sampler with an explicit out-of-bounds policy
    pub fn with_policy(policy: OutOfBoundsPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Sample a `dim_x` x `dim_y` module matrix from `grid` under the
    /// detected geometry.
    ///
    /// The geometry's quadrilateral corners are taken as the symbol's outer
    /// corners in image space; module (0, 0) maps to the first corner and
    /// module (dim_x, dim_y) to the opposite one.
    pub fn sample(
        &self,
        grid: &BitGrid,
        geometry: &SymbolGeometry,
        dim_x: usize,
        dim_y: usize,
    ) -> Result<BitGrid, SampleError> {
        let quad = geometry.quad().ok_or(SampleError::DegenerateGeometry)?;
        let module_corners = [
            Point::new(0.0, 0.0),
            Point::new(dim_x as f32, 0.0),
            Point::new(dim_x as f32, dim_y as f32),
            Point::new(0.0, dim_y as f32),
        ];
        let transform = PerspectiveTransform::from_points(&module_corners, &quad)
            .ok_or(SampleError::DegenerateGeometry)?;
        self.sample_transformed(grid, &transform, dim_x, dim_y)
    }

    /// Sample through an explicit module-space to image-space transform
    pub fn sample_transformed(
        &self,
        grid: &BitGrid,
        transform: &PerspectiveTransform,
        dim_x: usize,
        dim_y: usize,
    ) -> Result<BitGrid, SampleError> {
        let offset = match self.sample_point {
            SamplePoint::Center => 0.5,
            SamplePoint::Corner => 0.0,
        };

        let mut modules = BitGrid::new(dim_x, dim_y);
        for row in 0..dim_y {
            for col in 0..dim_x {
                let mapped =
                    transform.transform(&Point::new(col as f32 + offset, row as f32 + offset));
                let (px, py) = self.resolve_pixel(grid, &mapped)?;
                modules.set(col, row, grid.get(px, py));
            }
        }
        Ok(modules)
    }

    /// Map an image-space point to a pixel index, nudging one pixel of
    /// rounding slack back inside before the out-of-bounds policy applies
    fn resolve_pixel(&self, grid: &BitGrid, p: &Point) -> Result<(usize, usize), SampleError> {
        let width = grid.width() as isize;
        let height = grid.height() as isize;
        let mut x = p.x.floor() as isize;
        let mut y = p.y.floor() as isize;

        if x == -1 {
            x = 0;
        } else if x == width {
            x = width - 1;
        }
        if y == -1 {
            y = 0;
        } else if y == height {
            y = height - 1;
        }

        if x < 0 || x >= width || y < 0 || y >= height {
            match self.policy {
                OutOfBoundsPolicy::Clamp => {
                    x = x.clamp(0, width - 1);
                    y = y.clamp(0, height - 1);
                }
                OutOfBoundsPolicy::Fail => {
                    trace!("sample point ({:.1}, {:.1}) out of bounds", p.x, p.y);
                    return Err(SampleError::PointOutOfBounds {
                        x: p.x,
                        y: p.y,
                        width: grid.width(),
                        height: grid.height(),
                    });
                }
            }
        }

        Ok((x as usize, y as usize))
    }
}
