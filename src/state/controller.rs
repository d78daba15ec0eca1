// Owner of all overlay state. Every host event funnels through one of these
// entry points, each a single synchronous mutation.
use crate::error::OverlayError;
use crate::model::{Delta, OverlayConfig, Point, Size, TransformState};
use crate::render::{Overlay, Surface, VideoSource, composite, normalize_opacity};

use super::gesture::GestureTracker;
use super::scheduler::RenderScheduler;
use super::viewport::{Viewport, fit_surface};

/// What the host should do after a render tick.
#[derive(Clone, Debug, PartialEq)]
pub enum TickOutcome {
    /// Request the next animation frame.
    Continue,
    /// Nothing to request (suspended, or a stale callback).
    Idle,
    /// The loop is dead; release the camera.
    Stopped(OverlayError),
}

pub struct OverlayController<I> {
    pub config: OverlayConfig,
    transform: TransformState,
    gestures: GestureTracker,
    viewport: Viewport,
    scheduler: RenderScheduler,
    overlay: Option<Overlay<I>>,
}

impl<I> OverlayController<I> {
    pub fn new(config: OverlayConfig, visible: bool) -> Self {
        Self {
            config,
            transform: TransformState::default(),
            gestures: GestureTracker::new(),
            viewport: Viewport::default(),
            scheduler: RenderScheduler::new(visible),
            overlay: None,
        }
    }

    #[cfg(test)]
    pub fn transform(&self) -> &TransformState {
        &self.transform
    }

    #[cfg(test)]
    pub fn surface(&self) -> Size {
        self.viewport.surface
    }

    #[cfg(test)]
    pub fn scheduler(&self) -> &RenderScheduler {
        &self.scheduler
    }

    #[cfg(test)]
    pub fn has_overlay(&self) -> bool {
        self.overlay.is_some()
    }

    pub fn handle_pointer_down(&mut self, pointers: &[Point]) {
        self.gestures.pointer_down(pointers, self.overlay.is_some());
    }

    pub fn handle_pointer_move(&mut self, pointers: &[Point]) {
        let deltas = self.gestures.pointer_move(pointers, self.viewport.surface);
        self.apply_all(&deltas);
    }

    pub fn handle_pointer_up(&mut self, remaining: &[Point]) {
        self.gestures.pointer_up(remaining);
    }

    /// Wheel zoom routed through the same mutation path as pinch.
    pub fn handle_wheel(&mut self, delta_y: f64) {
        let ratio = (-delta_y * self.config.wheel_sensitivity).exp();
        self.apply_all(&[Delta::ScaleBy(ratio)]);
    }

    /// Recompute the surface for the current window and video size.
    /// Returns the new surface so the host can size its canvas.
    pub fn handle_resize(&mut self, window: Size, video: Option<Size>) -> Size {
        if !video.is_some_and(|v| v.is_drawable()) {
            log::warn!("{}", OverlayError::ViewportDegenerate);
        }
        let next = fit_surface(window, video, &self.config);
        let transform = self.overlay.as_ref().map(|_| &mut self.transform);
        self.viewport.resize(next, transform);
        next
    }

    /// Returns true when the host should request an animation frame.
    pub fn handle_visibility_change(&mut self, visible: bool) -> bool {
        self.scheduler.on_visibility(visible)
    }

    /// Returns true when the host should request an animation frame.
    pub fn handle_playing(&mut self) -> bool {
        self.scheduler.on_playing()
    }

    /// Install a freshly decoded image and fit it to the surface.
    pub fn load_overlay_image(&mut self, image: I, width: f64, height: f64) {
        let size = Size::new(width, height);
        self.gestures.cancel();
        self.transform.fit(self.viewport.surface, size, &self.config);
        self.overlay = Some(Overlay { image, size });
        log::info!(
            "overlay {}x{} loaded, scale {:.3}",
            width,
            height,
            self.transform.scale
        );
    }

    /// Keep whatever was there before; the transform is untouched.
    pub fn overlay_load_failed(&mut self, err: &OverlayError) {
        log::warn!("{}", err);
    }

    /// Re-fit the current overlay. No-op without one.
    pub fn reset_transform(&mut self) {
        if let Some(o) = &self.overlay {
            self.transform.fit(self.viewport.surface, o.size, &self.config);
        }
    }

    pub fn clear_overlay(&mut self) {
        self.overlay = None;
        self.gestures.cancel();
        self.transform = TransformState::default();
    }

    /// Returns true on the transition into stopped, i.e. when the host
    /// should release the camera.
    pub fn teardown(&mut self) -> bool {
        self.scheduler.stop()
    }

    /// Body of one animation-frame callback. Only reads overlay state.
    pub fn render_tick<S, V>(&mut self, surface: &mut S, video: &V, opacity: f64) -> TickOutcome
    where
        S: Surface<Image = I>,
        V: VideoSource<Frame = S::Frame>,
    {
        if !self.scheduler.begin_tick() {
            return TickOutcome::Idle;
        }
        let opacity = normalize_opacity(opacity, self.config.default_opacity);
        let drawn = composite(
            surface,
            self.viewport.surface,
            video,
            self.overlay.as_ref(),
            &self.transform,
            opacity,
        );
        if let Err(e) = drawn {
            log::error!("{}", e);
            self.scheduler.stop();
            return TickOutcome::Stopped(e);
        }
        if self.scheduler.end_tick() {
            TickOutcome::Continue
        } else {
            TickOutcome::Idle
        }
    }

    fn apply_all(&mut self, deltas: &[Delta]) {
        if self.overlay.is_none() {
            return;
        }
        let surface = self.viewport.surface;
        for d in deltas {
            self.transform.apply(*d, surface, &self.config);
        }
    }
}
