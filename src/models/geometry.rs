use super::Point;

/// Resolved reference geometry of a detected symbol
///
/// `points` is ordered consistently so downstream sampling is
/// orientation-correct. For the triangular finder layout produced by
/// [`FinderDetector`](crate::detector::finder::FinderDetector) the order is
/// `[top_left, top_right, bottom_left]`. Quadrilateral formats return four
/// or more points in clockwise order starting at the top-left.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolGeometry {
    /// Ordered reference points in image coordinates
    pub points: Vec<Point>,
    /// Estimated module size in pixels
    pub module_size: f32,
}

impl SymbolGeometry {
    /// Geometry from an ordered finder triple
    pub fn from_triple(top_left: Point, top_right: Point, bottom_left: Point, module_size: f32) -> Self {
        Self {
            points: vec![top_left, top_right, bottom_left],
            module_size,
        }
    }

    /// Expand finder-center geometry into the symbol's outer-corner
    /// geometry.
    ///
    /// `span` is the center-to-center distance in modules along each edge
    /// and `margin` the center-to-outer-corner offset in modules; both come
    /// from the format collaborator (a 21-module symbol with centers 3.5
    /// modules inside its corners has `span` 14 and `margin` 3.5). The
    /// centers define the module axes; the corners are extrapolated along
    /// them, so the result follows the symbol's perspective.
    pub fn to_corner_geometry(&self, span: f32, margin: f32) -> Option<SymbolGeometry> {
        if self.points.len() != 3 || span <= 0.0 {
            return None;
        }
        let (tl, tr, bl) = (self.points[0], self.points[1], self.points[2]);
        let ux = Point::new((tr.x - tl.x) / span, (tr.y - tl.y) / span);
        let uy = Point::new((bl.x - tl.x) / span, (bl.y - tl.y) / span);

        let at = |a: f32, b: f32| Point::new(tl.x + a * ux.x + b * uy.x, tl.y + a * ux.y + b * uy.y);
        let far = span + margin;
        Some(SymbolGeometry {
            points: vec![
                at(-margin, -margin),
                at(far, -margin),
                at(far, far),
                at(-margin, far),
            ],
            module_size: self.module_size,
        })
    }

    /// The four corners of the symbol quadrilateral as
    /// `[top_left, top_right, bottom_right, bottom_left]`.
    ///
    /// For a triple, the missing bottom-right corner is completed as
    /// `top_right + bottom_left - top_left`.
    pub fn quad(&self) -> Option<[Point; 4]> {
        match self.points.len() {
            3 => {
                let tl = self.points[0];
                let tr = self.points[1];
                let bl = self.points[2];
                let br = Point::new(tr.x + bl.x - tl.x, tr.y + bl.y - tl.y);
                Some([tl, tr, br, bl])
            }
            4 => Some([self.points[0], self.points[1], self.points[2], self.points[3]]),
            _ => None,
        }
    }
}
