// Output sizes, sub-viewport rectangles and camera aspect fitting.

use crate::camera::Camera;

/// Pixel size of the output surface.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A zero-sized surface has no meaningful aspect and must not be rendered.
    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn aspect(self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Full-surface rectangle in top-left coordinates.
    pub fn bounds(self) -> Rect {
        Rect::new(0.0, 0.0, self.width as f32, self.height as f32)
    }
}

impl From<winit::dpi::PhysicalSize<u32>> for SurfaceSize {
    fn from(size: winit::dpi::PhysicalSize<u32>) -> Self {
        Self::new(size.width, size.height)
    }
}

/// Axis-aligned box in top-left-origin pixels, like a layout bounding box.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

/// Clip rectangle with a bottom-left origin.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ScissorRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ScissorRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Same rectangle with its origin moved to the top-left corner, as GPU
    /// APIs expect. Clamped to the surface.
    pub fn to_top_left(&self, surface: SurfaceSize) -> ScissorRect {
        let x = self.x.min(surface.width);
        let width = self.width.min(surface.width - x);
        let top = surface.height.saturating_sub(self.y.saturating_add(self.height));
        let height = self.height.min(surface.height - top);
        ScissorRect::new(x, top, width, height)
    }
}

/// Clips `element` against `surface` and returns the region to draw into
/// together with its aspect ratio.
///
/// Both rectangles are in the same top-left coordinate space. Returns `None`
/// when the intersection is empty.
pub fn scissor_for_element(surface: Rect, element: Rect) -> Option<(ScissorRect, f32)> {
    let right = element.right.min(surface.right) - surface.left;
    let left = (element.left - surface.left).max(0.0);
    let bottom = element.bottom.min(surface.bottom) - surface.top;
    let top = (element.top - surface.top).max(0.0);

    let width = surface.width().min(right - left);
    let height = surface.height().min(bottom - top);
    if width <= 0.0 || height <= 0.0 {
        return None;
    }

    // Round edges rather than sizes so the rectangle never leaves the surface.
    let surface_w = surface.width().round();
    let surface_h = surface.height().round();
    let x0 = left.round().min(surface_w);
    let x1 = right.round().min(surface_w);
    let y0 = (surface.height() - bottom).max(0.0).round().min(surface_h);
    let y1 = (surface.height() - top).round().min(surface_h);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }

    let rect = ScissorRect::new(x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32);
    Some((rect, width / height))
}

/// Sets every camera's aspect to the surface's. Returns `false` and leaves
/// the cameras untouched for a zero-sized surface.
pub fn fit_cameras<'a>(size: SurfaceSize, cameras: impl IntoIterator<Item = &'a mut Camera>) -> bool {
    if !size.is_valid() {
        log::debug!("skipping aspect update for {}x{}", size.width, size.height);
        return false;
    }
    let aspect = size.aspect();
    for camera in cameras {
        camera.set_aspect(aspect);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SURFACE: Rect = Rect::new(0.0, 0.0, 800.0, 600.0);

    #[test]
    fn inside_element_is_unchanged() {
        let (rect, aspect) = scissor_for_element(SURFACE, Rect::new(0.0, 0.0, 400.0, 600.0)).unwrap();
        assert_eq!(rect, ScissorRect::new(0, 0, 400, 600));
        assert_relative_eq!(aspect, 400.0 / 600.0);
    }

    #[test]
    fn element_past_right_edge_is_clipped() {
        let (rect, aspect) = scissor_for_element(SURFACE, Rect::new(700.0, 0.0, 900.0, 600.0)).unwrap();
        assert_eq!(rect, ScissorRect::new(700, 0, 100, 600));
        assert_relative_eq!(aspect, 100.0 / 600.0);
    }

    #[test]
    fn y_flips_to_bottom_left() {
        let (rect, _) = scissor_for_element(SURFACE, Rect::new(0.0, 0.0, 800.0, 200.0)).unwrap();
        assert_eq!(rect, ScissorRect::new(0, 400, 800, 200));
        assert_eq!(
            rect.to_top_left(SurfaceSize::new(800, 600)),
            ScissorRect::new(0, 0, 800, 200)
        );
    }

    #[test]
    fn offset_surface_is_relative() {
        let surface = Rect::new(100.0, 50.0, 900.0, 650.0);
        let (rect, _) = scissor_for_element(surface, Rect::new(500.0, 50.0, 900.0, 650.0)).unwrap();
        assert_eq!(rect, ScissorRect::new(400, 0, 400, 600));
    }

    #[test]
    fn odd_surface_halves_stay_inside_and_meet() {
        let surface = Rect::new(0.0, 0.0, 801.0, 601.0);
        let (left, _) = scissor_for_element(surface, Rect::new(0.0, 0.0, 400.5, 601.0)).unwrap();
        let (right, _) = scissor_for_element(surface, Rect::new(400.5, 0.0, 801.0, 601.0)).unwrap();
        for rect in [left, right] {
            assert!(rect.x + rect.width <= 801, "{rect:?}");
            assert!(rect.y + rect.height <= 601, "{rect:?}");
        }
        assert_eq!(left.x + left.width, right.x);
        assert_eq!(left.width + right.width, 801);
    }

    #[test]
    fn disjoint_element_yields_nothing() {
        assert!(scissor_for_element(SURFACE, Rect::new(900.0, 0.0, 1000.0, 600.0)).is_none());
        assert!(scissor_for_element(SURFACE, Rect::new(0.0, 0.0, 400.0, 0.0)).is_none());
    }

    #[test]
    fn fit_sets_exact_aspect() {
        let mut a = Camera::perspective(75.0, 1.0, 0.1, 100.0);
        let mut b = Camera::perspective(45.0, 1.0, 5.0, 40.0);
        assert!(fit_cameras(SurfaceSize::new(1280, 720), [&mut a, &mut b]));
        assert_eq!(a.aspect, 1280.0 / 720.0);
        assert_eq!(b.aspect, 1280.0 / 720.0);

        assert!(!fit_cameras(SurfaceSize::new(1280, 0), [&mut a]));
        assert_eq!(a.aspect, 1280.0 / 720.0);
    }
}
