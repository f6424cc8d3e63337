use gm_contour::{RetrievalMode, fill_contour, find_contours};
use gm_core::{Image, ImageView};

use crate::TileError;

/// Square tiles on a regular grid, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchGrid<T> {
    pub rows: usize,
    pub cols: usize,
    pub patch_size: usize,
    pub step: usize,
    pub patches: Vec<Image<T>>,
}

impl<T> PatchGrid<T> {
    /// Rebuilds a square grid from a flat, row-major sequence of tiles, as
    /// returned by a model run over [`extract_patches`] output.
    pub fn from_flat(
        patches: Vec<Image<T>>,
        patch_size: usize,
        step: usize,
    ) -> Result<Self, TileError> {
        if patch_size == 0 || step == 0 {
            return Err(TileError::InvalidGeometry {
                patch: patch_size,
                step,
            });
        }

        let count = patches.len();
        let side = count.isqrt();
        if side * side != count || count == 0 {
            return Err(TileError::NotSquare { count });
        }

        let expected = (patch_size, patch_size);
        if let Some((index, p)) = patches.iter().enumerate().find(|(_, p)| p.shape() != expected) {
            return Err(TileError::PatchShape {
                index,
                expected,
                actual: p.shape(),
            });
        }

        Ok(Self {
            rows: side,
            cols: side,
            patch_size,
            step,
            patches,
        })
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Image<T>> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.patches.get(row * self.cols + col)
    }

    /// Side of the square the grid spans.
    pub fn covered_size(&self) -> (usize, usize) {
        (
            self.patch_size + self.cols.saturating_sub(1) * self.step,
            self.patch_size + self.rows.saturating_sub(1) * self.step,
        )
    }
}

/// Cuts `src` into `patch x patch` tiles every `step` pixels.
///
/// With `clear_edge` every foreground component touching its own tile's
/// border is erased (see [`clear_edge_rois`]).
pub fn extract_patches<T: Copy + Default + PartialEq>(
    src: &ImageView<'_, T>,
    patch: usize,
    step: usize,
    clear_edge: bool,
) -> Result<PatchGrid<T>, TileError> {
    if patch == 0 || step == 0 {
        return Err(TileError::InvalidGeometry { patch, step });
    }
    let (w, h) = (src.width(), src.height());
    if patch > w || patch > h {
        return Err(TileError::PatchLargerThanImage {
            patch,
            width: w,
            height: h,
        });
    }

    let rows = (h - patch) / step + 1;
    let cols = (w - patch) / step + 1;
    let mut patches = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            let mut tile = src
                .subview(col * step, row * step, patch, patch)?
                .to_image();
            if clear_edge {
                clear_edge_rois(&mut tile);
            }
            patches.push(tile);
        }
    }

    Ok(PatchGrid {
        rows,
        cols,
        patch_size: patch,
        step,
        patches,
    })
}

/// Erases every 8-connected foreground component (non-default pixels) whose
/// outer border touches the tile border. Holes inside an erased component are
/// erased with it.
pub fn clear_edge_rois<T: Copy + Default + PartialEq>(tile: &mut Image<T>) {
    let background = T::default();
    if tile.data().iter().all(|&v| v == background) {
        return;
    }

    let binary = tile.map(|&v| u8::from(v != background));
    let (w, h) = tile.shape();
    for contour in find_contours(&binary.as_view(), RetrievalMode::External).into_contours() {
        if contour.touches_border(w, h) {
            fill_contour(tile, &contour, background);
        }
    }
}

/// Places every tile back on the grid. Pixels covered by more than one tile
/// take the maximum; pixels no tile covers stay at `T::default()`. Tiles are
/// clipped to `output_size = (width, height)`.
pub fn stitch<T: Copy + Default + PartialOrd>(
    grid: &PatchGrid<T>,
    output_size: (usize, usize),
) -> Image<T> {
    let (out_w, out_h) = output_size;
    let mut out = Image::new_fill(out_w, out_h, T::default());
    let mut written = Image::new_fill(out_w, out_h, false);

    for row in 0..grid.rows {
        for col in 0..grid.cols {
            let Some(tile) = grid.get(row, col) else {
                continue;
            };
            let (x0, y0) = (col * grid.step, row * grid.step);
            for ty in 0..tile.height() {
                let y = y0 + ty;
                if y >= out_h {
                    break;
                }
                let src = tile.row(ty);
                let seen = written.row_mut(y);
                let dst = out.row_mut(y);
                for (tx, &v) in src.iter().enumerate() {
                    let x = x0 + tx;
                    if x >= out_w {
                        break;
                    }
                    if !seen[x] || v > dst[x] {
                        dst[x] = v;
                    }
                    seen[x] = true;
                }
            }
        }
    }

    out
}

/// Reassembles a flat sequence of per-tile predictions into the padded mask.
pub fn predictions_to_mask(
    predictions: Vec<Image<f32>>,
    patch: usize,
    step: usize,
) -> Result<Image<f32>, TileError> {
    let grid = PatchGrid::from_flat(predictions, patch, step)?;
    Ok(stitch(&grid, grid.covered_size()))
}

#[cfg(test)]
mod tests {
    use gm_core::Image;

    use super::{PatchGrid, clear_edge_rois, extract_patches, predictions_to_mask, stitch};
    use crate::{TileError, pad};

    fn ramp(w: usize, h: usize) -> Image<u16> {
        Image::from_vec(w, h, (1..=(w * h) as u16).collect()).expect("valid image")
    }

    #[test]
    fn grid_dimensions_follow_step() {
        let img = ramp(40, 40);
        let grid = extract_patches(&img.as_view(), 16, 12, false).expect("valid geometry");
        assert_eq!((grid.rows, grid.cols), (3, 3));
        assert_eq!(grid.patches.len(), 9);
        let tile = grid.get(1, 2).expect("inside grid");
        assert_eq!(tile.get(0, 0), img.get(24, 12));
        assert!(grid.get(3, 0).is_none());
    }

    #[test]
    fn stitch_of_extracted_patches_restores_padded_image() {
        let img = ramp(30, 23);
        let padded = pad(&img.as_view(), 16, 12).expect("valid geometry");
        let grid = extract_patches(&padded.image.as_view(), 16, 12, false).expect("valid grid");
        let restored = stitch(&grid, padded.image.shape());
        assert_eq!(restored, padded.image);
    }

    #[test]
    fn overlaps_merge_by_maximum() {
        let a = Image::new_fill(4, 4, 0.2f32);
        let mut b = Image::new_fill(4, 4, 0.1f32);
        *b.get_mut(0, 0).expect("in bounds") = 0.9;
        let c = Image::new_fill(4, 4, 0.0f32);
        let d = Image::new_fill(4, 4, 0.0f32);

        let mask = predictions_to_mask(vec![a, b, c, d], 4, 2).expect("square grid");
        assert_eq!(mask.shape(), (6, 6));
        // Column 2 row 0 is covered by tiles 0 and 1.
        assert_eq!(mask.get(2, 0), Some(&0.9));
        assert_eq!(mask.get(3, 0), Some(&0.2));
        assert_eq!(mask.get(4, 0), Some(&0.1));
        assert_eq!(mask.get(5, 5), Some(&0.0));
    }

    #[test]
    fn single_patch_grid_is_identity() {
        let tile = Image::new_fill(8, 8, 0.5f32);
        let mask = predictions_to_mask(vec![tile.clone()], 8, 6).expect("one tile");
        assert_eq!(mask, tile);
    }

    #[test]
    fn from_flat_validates_count_and_shape() {
        let tiles = vec![Image::new_fill(4, 4, 0u8); 8];
        assert_eq!(
            PatchGrid::from_flat(tiles, 4, 2),
            Err(TileError::NotSquare { count: 8 })
        );

        let mut tiles = vec![Image::new_fill(4, 4, 0u8); 3];
        tiles.push(Image::new_fill(4, 3, 0u8));
        assert_eq!(
            PatchGrid::from_flat(tiles, 4, 2),
            Err(TileError::PatchShape {
                index: 3,
                expected: (4, 4),
                actual: (4, 3)
            })
        );
    }

    #[test]
    fn edge_rois_are_cleared_interior_kept() {
        let mut tile = Image::new_fill(12, 12, 0u8);
        // Touches the left border.
        for y in 3..6 {
            for x in 0..3 {
                *tile.get_mut(x, y).expect("in bounds") = 255;
            }
        }
        // Interior blob.
        for y in 6..9 {
            for x in 6..9 {
                *tile.get_mut(x, y).expect("in bounds") = 255;
            }
        }

        clear_edge_rois(&mut tile);
        assert_eq!(tile.get(1, 4), Some(&0));
        assert_eq!(tile.data().iter().filter(|&&v| v == 255).count(), 9);
    }

    #[test]
    fn extraction_can_clear_edge_rois() {
        let mut img = Image::new_fill(8, 8, 0u8);
        // Straddles the boundary between the two left tiles.
        for y in 3..5 {
            for x in 1..3 {
                *img.get_mut(x, y).expect("in bounds") = 1;
            }
        }
        let grid = extract_patches(&img.as_view(), 4, 4, true).expect("valid grid");
        assert!(grid.patches.iter().all(|t| t.data().iter().all(|&v| v == 0)));

        let kept = extract_patches(&img.as_view(), 4, 4, false).expect("valid grid");
        assert_eq!(kept.patches[0].get(1, 3), Some(&1));
    }
}
