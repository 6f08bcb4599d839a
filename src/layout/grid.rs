//! # Two-Column Image Gallery Grid
//!
//! Geometry for the "before"/"after" galleries:
//! - two equal columns of width `(pageWidth − 3 × margin) / 2`
//! - a fixed gap between the columns and between rows
//! - images fill the column width, but never grow taller than a cap; a
//!   capped image shrinks in width so it is never cropped or stretched

use crate::model::PageGeometry;

/// Gap between columns and between rows.
pub const GALLERY_GAP: f64 = 5.0;

/// Tallest a gallery image may be drawn.
pub const GALLERY_MAX_IMAGE_HEIGHT: f64 = 80.0;

/// Column geometry for one gallery.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GalleryGrid {
    pub left_x: f64,
    pub column_width: f64,
    pub gap: f64,
    pub max_height: f64,
}

impl GalleryGrid {
    pub fn for_geometry(geometry: &PageGeometry) -> Self {
        Self {
            left_x: geometry.margin,
            column_width: (geometry.width() - 3.0 * geometry.margin) / 2.0,
            gap: GALLERY_GAP,
            max_height: GALLERY_MAX_IMAGE_HEIGHT,
        }
    }

    /// Display size for an image with the given intrinsic pixel size.
    ///
    /// Height comes from the column width; when it exceeds the cap the
    /// height is clamped and the width recomputed from the clamped height.
    pub fn image_size(&self, width_px: u32, height_px: u32) -> (f64, f64) {
        let ratio = width_px as f64 / height_px as f64;
        let mut height = self.column_width / ratio;
        if height > self.max_height {
            height = self.max_height;
        }
        (height * ratio, height)
    }

    /// X of the n-th image of the gallery (even → left, odd → right).
    pub fn column_x(&self, relative_index: usize) -> f64 {
        if relative_index % 2 == 0 {
            self.left_x
        } else {
            self.left_x + self.column_width + self.gap
        }
    }
}

/// Number of grid rows needed for `count` images.
pub fn row_count(count: usize) -> usize {
    count.div_ceil(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a4_grid() -> GalleryGrid {
        GalleryGrid::for_geometry(&PageGeometry::default())
    }

    #[test]
    fn a4_column_width() {
        let grid = a4_grid();
        assert_eq!(grid.column_width, 82.5);
        assert_eq!(grid.column_x(0), 15.0);
        assert_eq!(grid.column_x(1), 15.0 + 82.5 + 5.0);
        assert_eq!(grid.column_x(2), 15.0);
    }

    #[test]
    fn landscape_image_fills_column() {
        let (w, h) = a4_grid().image_size(1600, 1200);
        assert!((w - 82.5).abs() < 1e-9);
        assert!((h - 61.875).abs() < 1e-9);
    }

    #[test]
    fn tall_image_is_capped_and_narrowed() {
        let (w, h) = a4_grid().image_size(600, 1200);
        assert_eq!(h, GALLERY_MAX_IMAGE_HEIGHT);
        assert!((w - 40.0).abs() < 1e-9);
        assert!((w / h - 0.5).abs() < 1e-9);
    }

    #[test]
    fn aspect_ratio_preserved_across_shapes() {
        let grid = a4_grid();
        for (wp, hp) in [(1, 1), (3, 1), (1, 3), (1920, 1080), (1080, 1920), (7, 5)] {
            let (w, h) = grid.image_size(wp, hp);
            let r = wp as f64 / hp as f64;
            assert!((w / h - r).abs() < 1e-9, "{wp}x{hp}");
            assert!(h <= GALLERY_MAX_IMAGE_HEIGHT + 1e-9);
            assert!(w <= grid.column_width + 1e-9);
        }
    }

    #[test]
    fn rows_round_up() {
        assert_eq!(row_count(0), 0);
        assert_eq!(row_count(1), 1);
        assert_eq!(row_count(2), 1);
        assert_eq!(row_count(7), 4);
        assert_eq!(row_count(10), 5);
    }
}
