use gm_core::Point2i;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvexityDefect {
    /// Contour index where the hull edge starts.
    pub start: usize,
    /// Contour index where the hull edge ends.
    pub end: usize,
    /// Contour index of the point farthest from the hull edge.
    pub farthest: usize,
    pub depth: f64,
}

impl ConvexityDefect {
    /// Depth in 8.8 fixed point.
    pub fn fixed_depth(&self) -> i64 {
        (self.depth * 256.0).round() as i64
    }
}

/// Indices of the contour points on the convex hull, sorted ascending.
///
/// Collinear points on hull edges are excluded. Repeated points report the
/// first occurrence.
pub fn convex_hull_indices(points: &[Point2i]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by_key(|&i| (points[i], i));
    order.dedup_by_key(|i| points[*i]);

    if order.len() < 3 {
        order.sort_unstable();
        return order;
    }

    let cross = |o: usize, a: usize, b: usize| {
        let (o, a, b) = (points[o], points[a], points[b]);
        i64::from(a.x - o.x) * i64::from(b.y - o.y) - i64::from(a.y - o.y) * i64::from(b.x - o.x)
    };
    let chain = |ids: &mut dyn Iterator<Item = usize>| {
        let mut out: Vec<usize> = Vec::new();
        for i in ids {
            while out.len() >= 2 && cross(out[out.len() - 2], out[out.len() - 1], i) <= 0 {
                out.pop();
            }
            out.push(i);
        }
        out.pop();
        out
    };

    let mut hull = chain(&mut order.iter().copied());
    hull.extend(chain(&mut order.iter().rev().copied()));
    hull.sort_unstable();
    hull
}

/// Deepest contour point between each pair of consecutive hull points.
///
/// `hull` must be ascending contour indices as produced by
/// [`convex_hull_indices`]. Hull edges with no interior point farther than
/// zero produce no defect.
pub fn convexity_defects(points: &[Point2i], hull: &[usize]) -> Vec<ConvexityDefect> {
    let n = points.len();
    if hull.len() < 3 || n < 4 {
        return Vec::new();
    }

    let mut defects = Vec::new();
    for (k, &start) in hull.iter().enumerate() {
        let end = hull[(k + 1) % hull.len()];
        let p0 = points[start];
        let p1 = points[end];
        let dx0 = f64::from(p1.x - p0.x);
        let dy0 = f64::from(p1.y - p0.y);
        let scale = if dx0 == 0.0 && dy0 == 0.0 {
            0.0
        } else {
            1.0 / dx0.hypot(dy0)
        };

        let mut depth = 0.0;
        let mut farthest = None;
        let mut j = (start + 1) % n;
        while j != end {
            let dx = f64::from(points[j].x - p0.x);
            let dy = f64::from(points[j].y - p0.y);
            let dist = (-dy0 * dx + dx0 * dy).abs() * scale;
            if dist > depth {
                depth = dist;
                farthest = Some(j);
            }
            j = (j + 1) % n;
        }

        if let Some(farthest) = farthest {
            defects.push(ConvexityDefect {
                start,
                end,
                farthest,
                depth,
            });
        }
    }
    defects
}
