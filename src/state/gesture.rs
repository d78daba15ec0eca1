// Touch/pinch gesture tracking: pointer samples in, transform deltas out.
use crate::error::OverlayError;
use crate::model::{Delta, Point, Size};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum GestureMode {
    #[default]
    Idle,
    Dragging,
    Pinching,
}

/// Previous pinch sample. Absent until the first move after the pinch began.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinchBaseline {
    pub distance: Option<f64>,
    pub angle: f64,
    pub midpoint: Point,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GestureSession {
    pub mode: GestureMode,
    /// Last seen position of each active pointer.
    pub anchor: Vec<Point>,
    pub baseline: Option<PinchBaseline>,
}

/// Returns (midpoint, distance, angle) for the first two pointers.
pub fn two_finger_geometry(pointers: &[Point]) -> Option<(Point, f64, f64)> {
    let (&a, &b) = (pointers.first()?, pointers.get(1)?);
    Some((a.midpoint(b), a.distance_to(b), a.angle_to(b)))
}

#[derive(Clone, Debug, Default)]
pub struct GestureTracker {
    session: Option<GestureSession>,
}

impl GestureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn mode(&self) -> GestureMode {
        self.session.as_ref().map(|s| s.mode).unwrap_or_default()
    }

    #[cfg(test)]
    pub fn session(&self) -> Option<&GestureSession> {
        self.session.as_ref()
    }

    /// `pointers` is every pointer currently down, including the new one.
    pub fn pointer_down(&mut self, pointers: &[Point], has_overlay: bool) {
        match pointers.len() {
            0 => self.session = None,
            1 if has_overlay => self.start_drag(pointers[0]),
            1 => self.session = None,
            _ => self.start_pinch(pointers),
        }
    }

    pub fn pointer_move(&mut self, pointers: &[Point], surface: Size) -> Vec<Delta> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        let expected = match session.mode {
            GestureMode::Idle => return Vec::new(),
            GestureMode::Dragging => 1,
            GestureMode::Pinching => 2,
        };
        // Count changed without a down/up reaching us; re-seed instead of jumping.
        // A live session implies the overlay gate already passed.
        if pointers.len().min(2) != expected {
            self.pointer_down(pointers, true);
            return Vec::new();
        }
        match session.mode {
            GestureMode::Dragging => {
                let cur = pointers[0];
                let prev = session.anchor[0];
                session.anchor[0] = cur;
                vec![Delta::Pan {
                    dx: cur.x - prev.x,
                    dy: cur.y - prev.y,
                }]
            }
            GestureMode::Pinching => pinch_deltas(session, pointers, surface),
            GestureMode::Idle => Vec::new(),
        }
    }

    /// `remaining` is every pointer still down after the release.
    pub fn pointer_up(&mut self, remaining: &[Point]) {
        match remaining.len() {
            0 => self.session = None,
            1 => {
                if self.session.is_some() {
                    self.start_drag(remaining[0]);
                }
            }
            _ => self.start_pinch(remaining),
        }
    }

    pub fn cancel(&mut self) {
        self.session = None;
    }

    fn start_drag(&mut self, at: Point) {
        self.session = Some(GestureSession {
            mode: GestureMode::Dragging,
            anchor: vec![at],
            baseline: None,
        });
    }

    fn start_pinch(&mut self, pointers: &[Point]) {
        self.session = Some(GestureSession {
            mode: GestureMode::Pinching,
            anchor: pointers.iter().take(2).copied().collect(),
            baseline: None,
        });
    }
}

fn pinch_deltas(session: &mut GestureSession, pointers: &[Point], surface: Size) -> Vec<Delta> {
    let Some((mid, dist, angle)) = two_finger_geometry(pointers) else {
        return Vec::new();
    };
    session.anchor = pointers.iter().take(2).copied().collect();
    if dist <= 0.0 {
        log::debug!("{}", OverlayError::InputGeometry("pinch fingers coincide".into()));
    }
    let mut out = Vec::with_capacity(3);
    if let Some(base) = session.baseline {
        if let Some(last) = base.distance.filter(|d| *d > 0.0) {
            if dist > 0.0 {
                out.push(Delta::ScaleBy(dist / last));
            }
        }
        // Angle is meaningless when the fingers coincide.
        if dist > 0.0 && base.distance.is_some_and(|d| d > 0.0) {
            out.push(Delta::RotateBy(angle - base.angle));
        }
        if surface.is_drawable() {
            out.push(Delta::SkewBy {
                dx: (mid.x - base.midpoint.x) / surface.width,
                dy: (mid.y - base.midpoint.y) / surface.height,
            });
        }
    }
    session.baseline = Some(PinchBaseline {
        distance: (dist > 0.0 && dist.is_finite()).then_some(dist),
        angle,
        midpoint: mid,
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SURFACE: Size = Size { width: 1000.0, height: 800.0 };

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn single_pointer_without_overlay_stays_idle() {
        let mut g = GestureTracker::new();
        g.pointer_down(&[p(10.0, 10.0)], false);
        assert_eq!(g.mode(), GestureMode::Idle);
        assert!(g.pointer_move(&[p(20.0, 20.0)], SURFACE).is_empty());
    }

    #[test]
    fn drag_emits_frame_to_frame_pans() {
        let mut g = GestureTracker::new();
        g.pointer_down(&[p(10.0, 10.0)], true);
        assert_eq!(g.mode(), GestureMode::Dragging);
        assert_eq!(
            g.pointer_move(&[p(15.0, 8.0)], SURFACE),
            vec![Delta::Pan { dx: 5.0, dy: -2.0 }]
        );
        assert_eq!(
            g.pointer_move(&[p(25.0, 8.0)], SURFACE),
            vec![Delta::Pan { dx: 10.0, dy: 0.0 }]
        );
    }

    #[test]
    fn first_pinch_sample_is_suppressed() {
        let mut g = GestureTracker::new();
        g.pointer_down(&[p(0.0, 0.0), p(100.0, 0.0)], true);
        assert_eq!(g.mode(), GestureMode::Pinching);
        assert!(g.pointer_move(&[p(0.0, 0.0), p(120.0, 0.0)], SURFACE).is_empty());
        assert!(!g.pointer_move(&[p(0.0, 0.0), p(130.0, 0.0)], SURFACE).is_empty());
    }

    #[test]
    fn pinch_from_100_to_150_scales_by_one_and_a_half() {
        let mut g = GestureTracker::new();
        g.pointer_down(&[p(450.0, 400.0), p(550.0, 400.0)], true);
        g.pointer_move(&[p(450.0, 400.0), p(550.0, 400.0)], SURFACE);
        let deltas = g.pointer_move(&[p(425.0, 400.0), p(575.0, 400.0)], SURFACE);
        assert_eq!(deltas[0], Delta::ScaleBy(1.5));
        assert_eq!(deltas[1], Delta::RotateBy(0.0));
        assert_eq!(deltas[2], Delta::SkewBy { dx: 0.0, dy: 0.0 });
    }

    #[test]
    fn pinch_baseline_rolls_forward() {
        let mut g = GestureTracker::new();
        g.pointer_down(&[p(0.0, 0.0), p(100.0, 0.0)], true);
        g.pointer_move(&[p(0.0, 0.0), p(100.0, 0.0)], SURFACE);
        g.pointer_move(&[p(0.0, 0.0), p(200.0, 0.0)], SURFACE);
        let deltas = g.pointer_move(&[p(0.0, 0.0), p(400.0, 0.0)], SURFACE);
        // Relative to the previous sample, not the session start.
        assert_eq!(deltas[0], Delta::ScaleBy(2.0));
    }

    #[test]
    fn pinch_rotation_and_midpoint_skew() {
        let mut g = GestureTracker::new();
        g.pointer_down(&[p(0.0, 0.0), p(100.0, 0.0)], true);
        g.pointer_move(&[p(0.0, 0.0), p(100.0, 0.0)], SURFACE);
        let deltas = g.pointer_move(&[p(100.0, 80.0), p(100.0, 180.0)], SURFACE);
        assert_eq!(deltas.len(), 3);
        match deltas[1] {
            Delta::RotateBy(d) => assert!((d - std::f64::consts::FRAC_PI_2).abs() < 1e-12),
            other => panic!("unexpected {:?}", other),
        }
        match deltas[2] {
            Delta::SkewBy { dx, dy } => {
                assert!((dx - 50.0 / 1000.0).abs() < 1e-12);
                assert!((dy - 130.0 / 800.0).abs() < 1e-12);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn zero_distance_baseline_skips_scale() {
        let mut g = GestureTracker::new();
        g.pointer_down(&[p(5.0, 5.0), p(5.0, 5.0)], true);
        g.pointer_move(&[p(5.0, 5.0), p(5.0, 5.0)], SURFACE);
        let deltas = g.pointer_move(&[p(0.0, 5.0), p(10.0, 5.0)], SURFACE);
        assert!(deltas.iter().all(|d| !matches!(d, Delta::ScaleBy(_) | Delta::RotateBy(_))));
        let deltas = g.pointer_move(&[p(0.0, 5.0), p(20.0, 5.0)], SURFACE);
        assert_eq!(deltas[0], Delta::ScaleBy(2.0));
    }

    #[test]
    fn lifting_one_of_two_fingers_switches_to_drag_without_delta() {
        let mut g = GestureTracker::new();
        g.pointer_down(&[p(0.0, 0.0), p(100.0, 0.0)], true);
        g.pointer_move(&[p(0.0, 0.0), p(100.0, 0.0)], SURFACE);
        g.pointer_up(&[p(100.0, 0.0)]);
        assert_eq!(g.mode(), GestureMode::Dragging);
        assert_eq!(
            g.pointer_move(&[p(103.0, 4.0)], SURFACE),
            vec![Delta::Pan { dx: 3.0, dy: 4.0 }]
        );
    }

    #[test]
    fn lifting_all_fingers_destroys_session() {
        let mut g = GestureTracker::new();
        g.pointer_down(&[p(0.0, 0.0)], true);
        g.pointer_up(&[]);
        assert_eq!(g.mode(), GestureMode::Idle);
        assert!(g.session().is_none());
        assert!(g.pointer_move(&[p(1.0, 1.0)], SURFACE).is_empty());
    }

    #[test]
    fn second_finger_mid_drag_starts_fresh_pinch() {
        let mut g = GestureTracker::new();
        g.pointer_down(&[p(0.0, 0.0)], true);
        g.pointer_move(&[p(5.0, 0.0)], SURFACE);
        g.pointer_down(&[p(5.0, 0.0), p(105.0, 0.0)], true);
        assert_eq!(g.mode(), GestureMode::Pinching);
        assert!(g.session().is_some_and(|s| s.baseline.is_none()));
        assert!(g.pointer_move(&[p(5.0, 0.0), p(150.0, 0.0)], SURFACE).is_empty());
    }
}
