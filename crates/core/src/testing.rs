//! Axis-aligned rectangle kernel used by the unit tests of the generic
//! algorithms.
//!
//! Rectangles are closed under the operations the reoptimizer needs when
//! cuts are axis-parallel: union of two rectangles sharing a full edge,
//! erosion, and splitting along a full-span horizontal or vertical chord.

use crate::geometry::{GeometryKernel, Site};

const EPS: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    fn height(&self) -> f64 {
        self.y1 - self.y0
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPS
}

#[derive(Debug, Clone, Default)]
pub struct RectKernel;

impl GeometryKernel for RectKernel {
    type Polygon = Rect;

    fn is_valid_simple(&self, r: &Rect) -> bool {
        [r.x0, r.y0, r.x1, r.y1].iter().all(|v| v.is_finite())
            && r.width() > EPS
            && r.height() > EPS
    }

    fn union(&self, a: &Rect, b: &Rect) -> Option<Rect> {
        let same_rows = close(a.y0, b.y0) && close(a.y1, b.y1);
        let same_cols = close(a.x0, b.x0) && close(a.x1, b.x1);

        if same_rows && (close(a.x1, b.x0) || close(b.x1, a.x0)) {
            return Some(Rect::new(a.x0.min(b.x0), a.y0, a.x1.max(b.x1), a.y1));
        }
        if same_cols && (close(a.y1, b.y0) || close(b.y1, a.y0)) {
            return Some(Rect::new(a.x0, a.y0.min(b.y0), a.x1, a.y1.max(b.y1)));
        }
        None
    }

    fn split_along_line(&self, r: &Rect, from: Site, to: Site) -> Option<(Rect, Rect)> {
        let (lo_y, hi_y) = (from.1.min(to.1), from.1.max(to.1));
        let (lo_x, hi_x) = (from.0.min(to.0), from.0.max(to.0));

        if close(from.0, to.0) && close(lo_y, r.y0) && close(hi_y, r.y1) {
            let x = from.0;
            if x > r.x0 + EPS && x < r.x1 - EPS {
                return Some((
                    Rect::new(r.x0, r.y0, x, r.y1),
                    Rect::new(x, r.y0, r.x1, r.y1),
                ));
            }
        }
        if close(from.1, to.1) && close(lo_x, r.x0) && close(hi_x, r.x1) {
            let y = from.1;
            if y > r.y0 + EPS && y < r.y1 - EPS {
                return Some((
                    Rect::new(r.x0, r.y0, r.x1, y),
                    Rect::new(r.x0, y, r.x1, r.y1),
                ));
            }
        }
        None
    }

    fn erode(&self, region: &[Rect], distance: f64) -> Vec<Rect> {
        region
            .iter()
            .map(|r| {
                Rect::new(
                    r.x0 + distance,
                    r.y0 + distance,
                    r.x1 - distance,
                    r.y1 - distance,
                )
            })
            .filter(|r| self.is_valid_simple(r))
            .collect()
    }

    fn hole_count(&self, _r: &Rect) -> usize {
        0
    }

    fn area(&self, r: &Rect) -> f64 {
        r.width() * r.height()
    }

    fn distance_to(&self, r: &Rect, site: Site) -> f64 {
        let dx = (r.x0 - site.0).max(0.0).max(site.0 - r.x1);
        let dy = (r.y0 - site.1).max(0.0).max(site.1 - r.y1);
        dx.hypot(dy)
    }

    fn boundary_length(&self, r: &Rect) -> f64 {
        2.0 * (r.width() + r.height())
    }

    fn interpolate_along_boundary(&self, r: &Rect, arc_length: f64) -> Site {
        let (w, h) = (r.width(), r.height());
        let s = arc_length.clamp(0.0, 2.0 * (w + h));
        if s <= w {
            (r.x0 + s, r.y0)
        } else if s <= w + h {
            (r.x1, r.y0 + (s - w))
        } else if s <= 2.0 * w + h {
            (r.x1 - (s - w - h), r.y1)
        } else {
            (r.x0, r.y1 - (s - 2.0 * w - h))
        }
    }

    fn nearest_boundary_point(&self, r: &Rect, site: Site) -> Site {
        let x = site.0.clamp(r.x0, r.x1);
        let y = site.1.clamp(r.y0, r.y1);
        let candidates = [(r.x0, y), (r.x1, y), (x, r.y0), (x, r.y1)];
        candidates
            .into_iter()
            .min_by(|a, b| {
                let da = (a.0 - site.0).hypot(a.1 - site.1);
                let db = (b.0 - site.0).hypot(b.1 - site.1);
                da.total_cmp(&db)
            })
            .unwrap_or((r.x0, r.y0))
    }

    fn snap_nearby(&self, polygon: &Rect, _reference: &Rect, _tolerance: f64) -> Rect {
        *polygon
    }
}
