// Render-surface geometry: aspect fit against the window, and resize coalescing.
use crate::model::{OverlayConfig, Size, TransformState};

/// Largest rectangle with the video's aspect ratio that fits inside `window`.
/// Falls back to `cfg.fallback_aspect` while the video size is unknown.
pub fn fit_surface(window: Size, video: Option<Size>, cfg: &OverlayConfig) -> Size {
    let aspect = match video.filter(Size::is_drawable) {
        Some(v) => v.width / v.height,
        None => cfg.fallback_aspect,
    };
    let ww = if window.width.is_finite() { window.width.max(0.0) } else { 0.0 };
    let wh = if window.height.is_finite() { window.height.max(0.0) } else { 0.0 };
    let (w, h) = if ww / wh > aspect {
        (wh * aspect, wh)
    } else {
        (ww, ww / aspect)
    };
    let w = w.floor();
    let h = h.floor();
    Size::new(
        if w.is_finite() { w } else { 0.0 },
        if h.is_finite() { h } else { 0.0 },
    )
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    pub surface: Size,
    /// Last drawable surface; the overlay centre is kept relative to it
    /// while the surface is collapsed.
    anchor: Size,
}

impl Viewport {
    #[cfg(test)]
    pub fn new(surface: Size) -> Self {
        Self {
            surface,
            anchor: surface,
        }
    }

    /// Adopt a new surface size, carrying the overlay centre proportionally.
    /// Returns true when the size actually changed.
    pub fn resize(&mut self, new: Size, transform: Option<&mut TransformState>) -> bool {
        let old = self.surface;
        if old == new {
            return false;
        }
        self.surface = new;
        // A collapsed surface leaves the transform alone until it comes back.
        if new.is_drawable() {
            if let Some(t) = transform {
                t.rescale_translation(self.anchor, new);
            }
            self.anchor = new;
        }
        log::debug!(
            "surface {}x{} -> {}x{}",
            old.width,
            old.height,
            new.width,
            new.height
        );
        true
    }
}

/// Coalesces a burst of resize events into the last one.
/// Each event takes a token; only the newest token is allowed to fire.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResizeDebouncer {
    generation: u64,
}

impl ResizeDebouncer {
    pub fn bump(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    pub fn is_current(&self, token: u64) -> bool {
        token == self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Point;

    #[test]
    fn wide_window_letterboxes_width() {
        let cfg = OverlayConfig::default();
        let s = fit_surface(Size::new(2000.0, 600.0), Some(Size::new(640.0, 480.0)), &cfg);
        assert_eq!(s, Size::new(800.0, 600.0));
    }

    #[test]
    fn tall_window_letterboxes_height() {
        let cfg = OverlayConfig::default();
        let s = fit_surface(Size::new(400.0, 1000.0), Some(Size::new(1280.0, 720.0)), &cfg);
        assert_eq!(s, Size::new(400.0, 225.0));
    }

    #[test]
    fn unknown_video_size_uses_sixteen_by_nine() {
        let cfg = OverlayConfig::default();
        for video in [None, Some(Size::new(0.0, 0.0)), Some(Size::new(640.0, 0.0))] {
            let s = fit_surface(Size::new(1600.0, 1600.0), video, &cfg);
            assert_eq!(s, Size::new(1600.0, 900.0));
        }
    }

    #[test]
    fn zero_window_gives_empty_surface() {
        let cfg = OverlayConfig::default();
        let s = fit_surface(Size::new(0.0, 0.0), None, &cfg);
        assert_eq!(s, Size::new(0.0, 0.0));
    }

    #[test]
    fn resize_round_trip_restores_translation() {
        let base = Size::new(640.0, 480.0);
        let mut vp = Viewport::new(base);
        let mut t = TransformState {
            translation: Point::new(100.0, 333.0),
            scale: 2.0,
            rotation: 0.4,
            skew: Point::new(0.1, -0.1),
        };
        assert!(vp.resize(Size::new(1280.0, 960.0), Some(&mut t)));
        assert_eq!(t.translation, Point::new(200.0, 666.0));
        vp.resize(base, Some(&mut t));
        assert!((t.translation.x - 100.0).abs() < 1e-9);
        assert!((t.translation.y - 333.0).abs() < 1e-9);
        assert_eq!(t.scale, 2.0);
        assert_eq!(t.rotation, 0.4);
        assert_eq!(t.skew, Point::new(0.1, -0.1));
    }

    #[test]
    fn resize_from_empty_surface_only_clamps() {
        let mut vp = Viewport::new(Size::default());
        let mut t = TransformState {
            translation: Point::new(900.0, 50.0),
            ..Default::default()
        };
        vp.resize(Size::new(640.0, 480.0), Some(&mut t));
        assert_eq!(t.translation, Point::new(640.0, 50.0));
    }

    #[test]
    fn collapsed_surface_keeps_relative_position() {
        let full = Size::new(1000.0, 800.0);
        let mut vp = Viewport::new(full);
        let mut t = TransformState {
            translation: Point::new(750.0, 600.0),
            ..Default::default()
        };
        assert!(vp.resize(Size::new(1000.0, 0.0), Some(&mut t)));
        assert_eq!(vp.surface, Size::new(1000.0, 0.0));
        assert_eq!(t.translation, Point::new(750.0, 600.0));
        assert!(vp.resize(full, Some(&mut t)));
        assert_eq!(t.translation, Point::new(750.0, 600.0));
    }

    #[test]
    fn collapse_then_different_size_rescales_from_last_drawable() {
        let mut vp = Viewport::new(Size::new(1000.0, 800.0));
        let mut t = TransformState {
            translation: Point::new(500.0, 200.0),
            ..Default::default()
        };
        vp.resize(Size::new(0.0, 0.0), Some(&mut t));
        vp.resize(Size::new(500.0, 400.0), Some(&mut t));
        assert_eq!(t.translation, Point::new(250.0, 100.0));
    }

    #[test]
    fn same_size_is_not_a_change() {
        let mut vp = Viewport::new(Size::new(10.0, 10.0));
        assert!(!vp.resize(Size::new(10.0, 10.0), None));
    }

    #[test]
    fn only_latest_resize_token_fires() {
        let mut d = ResizeDebouncer::default();
        let first = d.bump();
        let second = d.bump();
        let third = d.bump();
        assert!(!d.is_current(first));
        assert!(!d.is_current(second));
        assert!(d.is_current(third));
    }
}
