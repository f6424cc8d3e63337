use gm_core::{Point2d, Point2i};

use crate::Moments;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Circle {
    pub center: Point2d,
    pub radius: f64,
}

impl Circle {
    fn contains(&self, p: Point2d) -> bool {
        self.center.distance(p) <= self.radius * (1.0 + 1e-9) + 1e-9
    }

    pub fn circumference(&self) -> f64 {
        2.0 * core::f64::consts::PI * self.radius
    }
}

/// Smallest circle containing every point (incremental Welzl).
pub fn min_enclosing_circle(points: &[Point2i]) -> Circle {
    let mut seen = std::collections::HashSet::with_capacity(points.len());
    let pts: Vec<Point2d> = points
        .iter()
        .filter(|p| seen.insert(**p))
        .map(|&p| Point2d::from(p))
        .collect();

    match pts.as_slice() {
        [] => return Circle::default(),
        [p] => {
            return Circle {
                center: *p,
                radius: 0.0,
            };
        }
        _ => {}
    }

    let mut c = circle_from_two(pts[0], pts[1]);
    for i in 2..pts.len() {
        if c.contains(pts[i]) {
            continue;
        }
        c = Circle {
            center: pts[i],
            radius: 0.0,
        };
        for j in 0..i {
            if c.contains(pts[j]) {
                continue;
            }
            c = circle_from_two(pts[i], pts[j]);
            for k in 0..j {
                if !c.contains(pts[k]) {
                    c = circle_from_three(pts[i], pts[j], pts[k]);
                }
            }
        }
    }
    c
}

fn circle_from_two(a: Point2d, b: Point2d) -> Circle {
    let center = Point2d::new((a.x + b.x) * 0.5, (a.y + b.y) * 0.5);
    Circle {
        center,
        radius: center.distance(a),
    }
}

fn circle_from_three(a: Point2d, b: Point2d, c: Point2d) -> Circle {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    if d.abs() < 1e-12 {
        // Collinear: the widest pair spans the others.
        return [
            circle_from_two(a, b),
            circle_from_two(a, c),
            circle_from_two(b, c),
        ]
        .into_iter()
        .fold(Circle::default(), |best, c| {
            if c.radius > best.radius { c } else { best }
        });
    }

    let a2 = a.x * a.x + a.y * a.y;
    let b2 = b.x * b.x + b.y * b.y;
    let c2 = c.x * c.x + c.y * c.y;
    let ux = (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d;
    let uy = (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d;
    let center = Point2d::new(ux, uy);
    Circle {
        center,
        radius: center.distance(a),
    }
}

/// I1 distance between two contours' Hu invariants.
///
/// `sum_i |1/m_a[i] - 1/m_b[i]|` with `m = sign(h) * log10(|h|)`; invariants
/// with magnitude `<= 1e-5` on either side are skipped. `0.0` means identical
/// shapes up to translation, scale and rotation.
pub fn match_shapes(a: &[Point2i], b: &[Point2i]) -> f64 {
    match_shapes_hu(
        &Moments::from_polygon(a).hu(),
        &Moments::from_polygon(b).hu(),
    )
}

pub fn match_shapes_hu(ha: &[f64; 7], hb: &[f64; 7]) -> f64 {
    const EPS: f64 = 1e-5;
    let mut result = 0.0;
    for (&a, &b) in ha.iter().zip(hb) {
        let (ama, amb) = (a.abs(), b.abs());
        if ama > EPS && amb > EPS {
            let ma = 1.0 / (sign(a) * ama.log10());
            let mb = 1.0 / (sign(b) * amb.log10());
            result += (mb - ma).abs();
        }
    }
    result
}

fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}
