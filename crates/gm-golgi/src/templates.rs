use gm_core::Point2i;

/// Digitized circle of radius 10 centered at (25, 25), counterclockwise on
/// screen from the top.
pub const CIRCLE_TEMPLATE: [Point2i; 56] = points([
    (25, 15), (24, 16), (23, 16), (22, 16), (21, 16), (20, 17), (19, 17), (18, 18), (17, 19),
    (17, 20), (16, 21), (16, 22), (16, 23), (16, 24), (15, 25), (16, 26), (16, 27), (16, 28),
    (16, 29), (17, 30), (17, 31), (18, 32), (19, 33), (20, 33), (21, 34), (22, 34), (23, 34),
    (24, 34), (25, 35), (26, 34), (27, 34), (28, 34), (29, 34), (30, 33), (31, 33), (32, 32),
    (33, 31), (33, 30), (34, 29), (34, 28), (34, 27), (34, 26), (35, 25), (34, 24), (34, 23),
    (34, 22), (34, 21), (33, 20), (33, 19), (32, 18), (31, 17), (30, 17), (29, 16), (28, 16),
    (27, 16), (26, 16),
]);

/// Digitized upright ellipse (semi-axes 6 x 11) centered at (25, 25).
pub const ELLIPSE_TEMPLATE: [Point2i; 52] = points([
    (23, 14), (22, 15), (21, 16), (21, 17), (20, 18), (20, 19), (20, 20), (19, 21), (19, 22),
    (19, 23), (19, 24), (19, 25), (19, 26), (19, 27), (19, 28), (20, 29), (20, 30), (20, 31),
    (20, 32), (21, 33), (21, 34), (22, 35), (23, 36), (24, 36), (25, 36), (26, 36), (27, 36),
    (28, 35), (29, 34), (29, 33), (30, 32), (30, 31), (30, 30), (30, 29), (31, 28), (31, 27),
    (31, 26), (31, 25), (31, 24), (31, 23), (31, 22), (31, 21), (30, 20), (30, 19), (30, 18),
    (29, 17), (29, 16), (28, 15), (27, 14), (26, 14), (25, 14), (24, 14),
]);

const fn points<const N: usize>(xy: [(i32, i32); N]) -> [Point2i; N] {
    let mut out = [Point2i::new(0, 0); N];
    let mut i = 0;
    while i < N {
        out[i] = Point2i::new(xy[i].0, xy[i].1);
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use gm_contour::{Contour, match_shapes, min_enclosing_circle};

    use super::{CIRCLE_TEMPLATE, ELLIPSE_TEMPLATE};

    #[test]
    fn templates_are_closed_eight_connected_chains() {
        for t in [&CIRCLE_TEMPLATE[..], &ELLIPSE_TEMPLATE[..]] {
            let mut prev = t[t.len() - 1];
            for &p in t {
                let d = p - prev;
                assert!(d.x.abs() <= 1 && d.y.abs() <= 1 && d != Default::default());
                prev = p;
            }
        }
    }

    #[test]
    fn circle_template_is_round() {
        let c = min_enclosing_circle(&CIRCLE_TEMPLATE);
        assert_abs_diff_eq!(c.center.x, 25.0, epsilon = 1e-9);
        assert_abs_diff_eq!(c.center.y, 25.0, epsilon = 1e-9);
        assert_abs_diff_eq!(c.radius, 10.0, epsilon = 1e-9);
        assert!(Contour::from(CIRCLE_TEMPLATE.to_vec()).area() > 280.0);
    }

    #[test]
    fn templates_differ_but_not_by_much() {
        let d = match_shapes(&CIRCLE_TEMPLATE, &ELLIPSE_TEMPLATE);
        assert_abs_diff_eq!(d, 0.144, epsilon = 5e-3);
        assert_eq!(match_shapes(&CIRCLE_TEMPLATE, &CIRCLE_TEMPLATE), 0.0);
    }
}
