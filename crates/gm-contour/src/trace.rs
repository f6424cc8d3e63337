use gm_core::{ImageView, Point2i};

use crate::Contour;

// Counterclockwise on screen starting east; decreasing index turns clockwise.
const DX: [isize; 8] = [1, 1, 0, -1, -1, -1, 0, 1];
const DY: [isize; 8] = [0, -1, -1, -1, 0, 1, 1, 1];

/// Label of the virtual frame around the image. It behaves as a hole border.
const FRAME: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalMode {
    External,
    Tree,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hierarchy {
    /// Index of the enclosing contour within the same [`ContourSet`].
    pub parent: Option<usize>,
    pub is_hole: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContourSet {
    pub contours: Vec<Contour>,
    pub hierarchy: Vec<Hierarchy>,
}

impl ContourSet {
    pub fn len(&self) -> usize {
        self.contours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    pub fn into_contours(self) -> Vec<Contour> {
        self.contours
    }
}

struct Border {
    label: i32,
    points: Vec<Point2i>,
    is_hole: bool,
    parent: i32,
}

/// Traces every border of the foreground in `src`.
pub fn find_contours(src: &ImageView<'_, u8>, mode: RetrievalMode) -> ContourSet {
    let (w, h) = (src.width(), src.height());
    if w == 0 || h == 0 {
        return ContourSet::default();
    }

    // One pixel of zero padding keeps every neighbor lookup in bounds.
    let pw = w + 2;
    let ph = h + 2;
    let mut f = vec![0i32; pw * ph];
    for y in 0..h {
        for (x, &v) in src.row(y).iter().enumerate() {
            if v != 0 {
                f[(y + 1) * pw + x + 1] = 1;
            }
        }
    }

    let offsets: [isize; 8] = core::array::from_fn(|d| DY[d] * pw as isize + DX[d]);
    // Indexed by label: (is_hole, parent label). Labels 0 is unused.
    let mut kinds: Vec<(bool, i32)> = vec![(true, 0), (true, 0)];
    let mut borders = Vec::new();
    let mut nbd = FRAME;

    for y in 1..ph - 1 {
        let mut lnbd = FRAME;
        for x in 1..pw - 1 {
            let p = y * pw + x;
            let v = f[p];
            if v == 0 {
                continue;
            }

            let start = if v == 1 && f[p - 1] == 0 {
                Some((false, p - 1))
            } else if v >= 1 && f[p + 1] == 0 {
                if v > 1 {
                    lnbd = v;
                }
                Some((true, p + 1))
            } else {
                None
            };

            if let Some((is_hole, from)) = start {
                nbd += 1;
                let (prev_hole, prev_parent) = kinds[lnbd as usize];
                let parent = if is_hole == prev_hole {
                    prev_parent
                } else {
                    lnbd
                };
                kinds.push((is_hole, parent));

                let points = follow_border(&mut f, &offsets, pw, p, from, nbd);
                borders.push(Border {
                    label: nbd,
                    points,
                    is_hole,
                    parent,
                });
            }

            if f[p] != 1 {
                lnbd = f[p].abs();
            }
        }
    }

    collect(borders, mode)
}

fn follow_border(
    f: &mut [i32],
    offsets: &[isize; 8],
    pw: usize,
    start: usize,
    from: usize,
    nbd: i32,
) -> Vec<Point2i> {
    let to_point = |p: usize| Point2i::new((p % pw) as i32 - 1, (p / pw) as i32 - 1);
    let step = |p: usize, d: usize| p.wrapping_add_signed(offsets[d]);
    let dir_between = |a: usize, b: usize| {
        offsets
            .iter()
            .position(|&o| a.wrapping_add_signed(o) == b)
            .expect("border tracing visits 8-neighbors only")
    };

    let d0 = dir_between(start, from);
    let first = (0..8)
        .map(|k| step(start, (d0 + 8 - k) % 8))
        .find(|&q| f[q] != 0);

    let Some(p1) = first else {
        f[start] = -nbd;
        return vec![to_point(start)];
    };

    let mut points = Vec::new();
    let (mut p2, mut p3) = (p1, start);
    loop {
        points.push(to_point(p3));

        let d = dir_between(p3, p2);
        let mut east_zero = false;
        let mut p4 = p2;
        for k in 1..=8 {
            let dd = (d + k) % 8;
            let q = step(p3, dd);
            if f[q] != 0 {
                p4 = q;
                break;
            }
            if dd == 0 {
                east_zero = true;
            }
        }

        if east_zero {
            f[p3] = -nbd;
        } else if f[p3] == 1 {
            f[p3] = nbd;
        }

        if p4 == start && p3 == p1 {
            break;
        }
        p2 = p3;
        p3 = p4;
    }

    points
}

fn collect(borders: Vec<Border>, mode: RetrievalMode) -> ContourSet {
    let keep = |b: &Border| match mode {
        RetrievalMode::External => !b.is_hole && b.parent == FRAME,
        RetrievalMode::Tree => true,
    };

    let mut index_of = std::collections::HashMap::new();
    let mut out = ContourSet::default();
    for b in borders.into_iter().filter(|b| keep(b)) {
        let parent = match mode {
            RetrievalMode::External => None,
            RetrievalMode::Tree => index_of.get(&b.parent).copied(),
        };
        index_of.insert(b.label, out.contours.len());
        out.contours.push(Contour::new(b.points));
        out.hierarchy.push(Hierarchy {
            parent,
            is_hole: b.is_hole,
        });
    }
    out
}
