use gm_core::{Image, Point2i};

use crate::Contour;

/// Paints the region enclosed by `contour`, boundary included.
///
/// Interior pixels are those whose centers lie inside the polygon under the
/// even-odd rule; each edge covers the half-open row range `[y_lo, y_hi)`.
/// Polygon edges are drawn as 8-connected segments on top. Pixels outside the
/// image are ignored.
pub fn fill_contour<T: Copy>(img: &mut Image<T>, contour: &Contour, value: T) {
    let (w, h) = img.shape();
    let pts = &contour.points;
    if pts.is_empty() || w == 0 || h == 0 {
        return;
    }

    let (mut y_min, mut y_max) = (i64::MAX, i64::MIN);
    for p in pts {
        y_min = y_min.min(i64::from(p.y));
        y_max = y_max.max(i64::from(p.y));
    }

    let mut crossings: Vec<f64> = Vec::new();
    for y in y_min.max(0)..=y_max.min(h as i64 - 1) {
        crossings.clear();
        let mut prev = pts[pts.len() - 1];
        for &p in pts {
            let (y0, y1) = (i64::from(prev.y), i64::from(p.y));
            if y0 != y1 && y0.min(y1) <= y && y < y0.max(y1) {
                let t = (y - y0) as f64 / (y1 - y0) as f64;
                crossings.push(f64::from(prev.x) + t * f64::from(p.x - prev.x));
            }
            prev = p;
        }
        crossings.sort_by(f64::total_cmp);

        let row = img.row_mut(y as usize);
        for span in crossings.chunks_exact(2) {
            let x0 = span[0].ceil().max(0.0) as i64;
            let x1 = span[1].floor().min(w as f64 - 1.0) as i64;
            for x in x0..=x1 {
                row[x as usize] = value;
            }
        }
    }

    let mut prev = pts[pts.len() - 1];
    for &p in pts {
        draw_segment(img, prev, p, value);
        prev = p;
    }
}

fn draw_segment<T: Copy>(img: &mut Image<T>, a: Point2i, b: Point2i, value: T) {
    let dx = i64::from(b.x - a.x);
    let dy = i64::from(b.y - a.y);
    let steps = dx.abs().max(dy.abs()).max(1);
    for i in 0..=steps {
        let x = f64::from(a.x) + (dx * i) as f64 / steps as f64;
        let y = f64::from(a.y) + (dy * i) as f64 / steps as f64;
        let (x, y) = (x.round(), y.round());
        if x >= 0.0
            && y >= 0.0
            && let Some(px) = img.get_mut(x as usize, y as usize)
        {
            *px = value;
        }
    }
}

/// Binary `{0, 1}` mask of the filled contour.
pub fn contour_mask(contour: &Contour, width: usize, height: usize) -> Image<u8> {
    let mut mask = Image::new_fill(width, height, 0u8);
    fill_contour(&mut mask, contour, 1);
    mask
}
