//! Core data models for the camera overlay.
//! Geometry primitives, the gesture deltas, and the affine transform that
//! places the overlay image on the render surface.

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }

    /// Angle of the vector from `self` to `other`, in radians.
    pub fn angle_to(self, other: Point) -> f64 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when both sides are finite and strictly positive.
    pub fn is_drawable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Tunables shared by the gesture engine, viewport and compositor.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayConfig {
    pub min_scale: f64,
    pub max_scale: f64,
    /// Symmetric bound on each shear coefficient.
    pub max_skew: f64,
    /// Fraction of the surface a freshly loaded image is fitted into.
    pub fit_fraction: f64,
    pub default_opacity: f64,
    pub resize_debounce_ms: i32,
    /// Aspect ratio used while the video has not reported its size.
    pub fallback_aspect: f64,
    pub wheel_sensitivity: f64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.1,
            max_scale: 3.0,
            max_skew: 0.5,
            fit_fraction: 0.8,
            default_opacity: 0.5,
            resize_debounce_ms: 250,
            fallback_aspect: 16.0 / 9.0,
            wheel_sensitivity: 0.001,
        }
    }
}

/// Incremental change produced by the gesture tracker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Delta {
    Pan { dx: f64, dy: f64 },
    ScaleBy(f64),
    RotateBy(f64),
    /// Shear change, already normalised by the surface size.
    SkewBy { dx: f64, dy: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformState {
    /// Surface coordinates of the image centre.
    pub translation: Point,
    pub scale: f64,
    /// Radians. Only ever fed to trig functions, so it is left unbounded.
    pub rotation: f64,
    pub skew: Point,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            translation: Point::default(),
            scale: 1.0,
            rotation: 0.0,
            skew: Point::default(),
        }
    }
}

impl TransformState {
    /// The single mutation path for gesture output.
    pub fn apply(&mut self, delta: Delta, surface: Size, cfg: &OverlayConfig) {
        match delta {
            Delta::Pan { dx, dy } => {
                if !(dx.is_finite() && dy.is_finite()) {
                    return;
                }
                self.translation.x += dx;
                self.translation.y += dy;
                self.clamp_translation(surface);
            }
            Delta::ScaleBy(ratio) => {
                if !ratio.is_finite() {
                    return;
                }
                self.scale = (self.scale * ratio).clamp(cfg.min_scale, cfg.max_scale);
            }
            Delta::RotateBy(d) => {
                if d.is_finite() {
                    self.rotation += d;
                }
            }
            Delta::SkewBy { dx, dy } => {
                if !(dx.is_finite() && dy.is_finite()) {
                    return;
                }
                self.skew.x = (self.skew.x + dx).clamp(-cfg.max_skew, cfg.max_skew);
                self.skew.y = (self.skew.y + dy).clamp(-cfg.max_skew, cfg.max_skew);
            }
        }
    }

    /// Centre the image and fit it into `fit_fraction` of the surface.
    pub fn fit(&mut self, surface: Size, image: Size, cfg: &OverlayConfig) {
        self.translation = surface.center();
        self.scale = if image.is_drawable() {
            (cfg.fit_fraction * surface.width / image.width)
                .min(cfg.fit_fraction * surface.height / image.height)
        } else {
            1.0
        };
        if !self.scale.is_finite() || self.scale <= 0.0 {
            self.scale = 1.0;
        }
        self.rotation = 0.0;
        self.skew = Point::default();
    }

    pub fn clamp_translation(&mut self, surface: Size) {
        let w = surface.width.max(0.0);
        let h = surface.height.max(0.0);
        self.translation.x = finite_or_zero(self.translation.x).clamp(0.0, w);
        self.translation.y = finite_or_zero(self.translation.y).clamp(0.0, h);
    }

    /// Move the centre proportionally from `old` surface bounds into `new` ones.
    pub fn rescale_translation(&mut self, old: Size, new: Size) {
        if old.is_drawable() {
            self.translation.x *= new.width / old.width;
            self.translation.y *= new.height / old.height;
        }
        self.clamp_translation(new);
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}
