//! Selection rectangle and preview coordinate remapping
//!
//! The GUI draws a scaled-down preview with the origin at the top-left and
//! y growing downward; PDF page space has the origin at the bottom-left and
//! y growing upward. `PreviewMap` converts between the two, and `Rect` is a
//! normalized selection in page space.

/// An axis-aligned rectangle in PDF page coordinates
///
/// Always normalized: `x0 <= x1` and `y0 <= y1` (y0 is the bottom edge).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    /// Build a normalized rectangle from any two opposite corners
    pub fn from_corners(ax: f32, ay: f32, bx: f32, by: f32) -> Self {
        Rect {
            x0: ax.min(bx),
            y0: ay.min(by),
            x1: ax.max(bx),
            y1: ay.max(by),
        }
    }

    /// Whether a point lies inside the rectangle (edges inclusive)
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }
}

/// Uniform-scale mapping between preview pixels and page points
///
/// Preview coordinates are top-left origin, y down; page coordinates are
/// bottom-left origin, y up.
#[derive(Debug, Clone, Copy)]
pub struct PreviewMap {
    scale: f32,
    page_width: f32,
    page_height: f32,
}

impl PreviewMap {
    /// Fit a page into an available viewport, preserving aspect ratio
    pub fn fit(page_width: f32, page_height: f32, max_width: f32, max_height: f32) -> Self {
        let scale = (max_width / page_width).min(max_height / page_height);
        PreviewMap {
            scale,
            page_width,
            page_height,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Size of the preview in pixels
    pub fn preview_size(&self) -> (f32, f32) {
        (self.page_width * self.scale, self.page_height * self.scale)
    }

    /// Preview pixel -> page point
    pub fn to_page(&self, px: f32, py: f32) -> (f32, f32) {
        (px / self.scale, self.page_height - py / self.scale)
    }

    /// Page point -> preview pixel
    pub fn to_preview(&self, x: f32, y: f32) -> (f32, f32) {
        (x * self.scale, (self.page_height - y) * self.scale)
    }

    /// Remap a dragged preview rectangle (any corner order) into page space
    pub fn rect_to_page(&self, ax: f32, ay: f32, bx: f32, by: f32) -> Rect {
        let (pax, pay) = self.to_page(ax, ay);
        let (pbx, pby) = self.to_page(bx, by);
        Rect::from_corners(pax, pay, pbx, pby)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_normalizes_any_corner_order() {
        let a = Rect::from_corners(10.0, 20.0, 50.0, 80.0);
        let b = Rect::from_corners(50.0, 80.0, 10.0, 20.0);
        let c = Rect::from_corners(10.0, 80.0, 50.0, 20.0);
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.x0, 10.0);
        assert_eq!(a.y1, 80.0);
    }

    #[test]
    fn test_rect_contains_edges() {
        let r = Rect::from_corners(10.0, 10.0, 20.0, 20.0);
        assert!(r.contains(10.0, 10.0));
        assert!(r.contains(20.0, 20.0));
        assert!(r.contains(15.0, 15.0));
        assert!(!r.contains(9.9, 15.0));
        assert!(!r.contains(15.0, 20.1));
    }

    #[test]
    fn test_fit_scale_limited_by_narrow_axis() {
        // Page 612x792 into a 306x792 viewport: width limits the scale
        let map = PreviewMap::fit(612.0, 792.0, 306.0, 792.0);
        assert!((map.scale() - 0.5).abs() < 1e-6);
        let (w, h) = map.preview_size();
        assert!((w - 306.0).abs() < 1e-3);
        assert!((h - 396.0).abs() < 1e-3);
    }

    #[test]
    fn test_roundtrip_and_y_flip() {
        let map = PreviewMap::fit(612.0, 792.0, 306.0, 396.0);

        // Page origin (bottom-left) maps to the preview's bottom-left pixel
        let (px, py) = map.to_preview(0.0, 0.0);
        assert!((px - 0.0).abs() < 1e-3);
        assert!((py - 396.0).abs() < 1e-3);

        // Top of the page maps to preview y = 0
        let (_, py_top) = map.to_preview(0.0, 792.0);
        assert!(py_top.abs() < 1e-3);

        let (x, y) = map.to_page(100.0, 50.0);
        let (px2, py2) = map.to_preview(x, y);
        assert!((px2 - 100.0).abs() < 1e-3);
        assert!((py2 - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_rect_to_page_flips_vertical_order() {
        let map = PreviewMap::fit(612.0, 792.0, 612.0, 792.0);
        // A drag near the top of the preview selects the top of the page
        let r = map.rect_to_page(100.0, 10.0, 200.0, 110.0);
        assert!((r.x0 - 100.0).abs() < 1e-3);
        assert!((r.x1 - 200.0).abs() < 1e-3);
        assert!((r.y1 - 782.0).abs() < 1e-3);
        assert!((r.y0 - 682.0).abs() < 1e-3);
        assert!(r.y0 < r.y1);
    }
}
