//! Turns pointer motion on the disc into playback rate.
//!
//! While dragging, every motion sample is converted straight into a rate.
//! While idle, each animation tick eases the rate toward the pitch target
//! (or toward zero when stopped), which gives the disc its spin-up and
//! spin-down feel.

use std::f32::consts::{PI, TAU};
use std::time::Duration;

/// Angle in radians the disc turns per animation frame at rate 1.0.
pub const BASE_SPEED: f32 = 0.05;
/// Fraction of the remaining distance to the target covered per nominal frame.
pub const DECAY_PER_FRAME: f32 = 0.1;
/// Below this distance the rate snaps to its target.
pub const SNAP_THRESHOLD: f32 = 0.01;
/// Reference frame length the decay and rotation are normalized to (60 Hz).
pub const NOMINAL_FRAME: Duration = Duration::from_micros(16_667);

/// Anything that accepts a playback rate.
pub trait RateSink {
    fn set_rate(&mut self, rate: f32);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    Dragging { last_angle: f32 },
}

/// Wrap a raw angle difference into (-PI, PI].
pub fn normalize_delta(delta: f32) -> f32 {
    let mut d = delta;
    if d > PI {
        d -= TAU;
    } else if d <= -PI {
        d += TAU;
    }
    d
}

#[derive(Debug, Clone)]
pub struct GestureMapper {
    center: Point,
    state: DragState,
    rate: f32,
    /// Accumulated visual rotation in degrees.
    rotation: f32,
}

impl GestureMapper {
    pub fn new(center: Point) -> Self {
        Self {
            center,
            state: DragState::Idle,
            rate: 0.0,
            rotation: 0.0,
        }
    }

    /// Move the pivot, e.g. after the disc was laid out again.
    pub fn set_center(&mut self, center: Point) {
        if center.is_finite() {
            self.center = center;
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn rotation_degrees(&self) -> f32 {
        self.rotation
    }

    fn angle_of(&self, point: Point) -> f32 {
        // atan2(0, 0) is 0, so a touch dead on the spindle is harmless.
        (point.y - self.center.y).atan2(point.x - self.center.x)
    }

    pub fn start_drag(&mut self, point: Option<Point>) {
        let Some(point) = point.filter(Point::is_finite) else {
            return;
        };
        self.state = DragState::Dragging {
            last_angle: self.angle_of(point),
        };
    }

    /// Feed one motion sample. Returns the rate written to `sink`, if any.
    pub fn move_drag(&mut self, point: Option<Point>, sink: &mut impl RateSink) -> Option<f32> {
        let DragState::Dragging { last_angle } = self.state else {
            return None;
        };
        let point = point.filter(Point::is_finite)?;

        let angle = self.angle_of(point);
        let delta = normalize_delta(angle - last_angle);

        self.rotation = (self.rotation + delta.to_degrees()) % 360.0;
        self.state = DragState::Dragging { last_angle: angle };

        self.rate = delta / BASE_SPEED;
        sink.set_rate(self.rate);
        Some(self.rate)
    }

    pub fn end_drag(&mut self) {
        self.state = DragState::Idle;
    }

    /// Advance the idle animation by `dt`. Does nothing while dragging.
    pub fn tick(
        &mut self,
        dt: Duration,
        playing: bool,
        pitch: f32,
        sink: &mut impl RateSink,
    ) -> Option<f32> {
        if self.is_dragging() {
            return None;
        }

        let frames = dt.as_secs_f32() / NOMINAL_FRAME.as_secs_f32();
        let target = if playing { pitch } else { 0.0 };
        let diff = target - self.rate;

        if diff.abs() > SNAP_THRESHOLD {
            let step = 1.0 - (1.0 - DECAY_PER_FRAME).powf(frames);
            self.rate += diff * step;
        } else {
            self.rate = target;
        }

        self.rotation += (BASE_SPEED * self.rate * frames).to_degrees();
        self.rotation %= 360.0;

        sink.set_rate(self.rate);
        Some(self.rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<f32>);

    impl RateSink for Recorder {
        fn set_rate(&mut self, rate: f32) {
            self.0.push(rate);
        }
    }

    fn at_angle(angle: f32) -> Option<Point> {
        Some(Point::new(100.0 * angle.cos(), 100.0 * angle.sin()))
    }

    #[test]
    fn delta_across_seam_stays_small() {
        let a1 = PI - 0.01;
        let a2 = -PI + 0.01;
        let d = normalize_delta(a2 - a1);
        assert!(d > 0.0 && (d - 0.02).abs() < 1e-4);
        assert!(normalize_delta(a1 - a2) < 0.0);
    }

    #[test]
    fn normalized_delta_is_in_half_open_range() {
        let mut a1 = -PI + 0.001;
        while a1 <= PI {
            let mut a2 = -PI + 0.001;
            while a2 <= PI {
                let d = normalize_delta(a2 - a1);
                assert!(d > -PI && d <= PI, "{a1} -> {a2} gave {d}");
                a2 += 0.37;
            }
            a1 += 0.41;
        }
        assert_eq!(normalize_delta(-PI), PI);
    }

    #[test]
    fn drag_writes_rate_directly() {
        let mut mapper = GestureMapper::new(Point::new(0.0, 0.0));
        let mut sink = Recorder::default();
        mapper.start_drag(at_angle(0.0));
        let rate = mapper.move_drag(at_angle(0.1), &mut sink).unwrap();
        assert!((rate - 2.0).abs() < 1e-3);
        assert_eq!(sink.0, vec![rate]);
        assert!((mapper.rotation_degrees() - 0.1f32.to_degrees()).abs() < 1e-3);
    }

    #[test]
    fn crossing_the_seam_scratches_forward() {
        let mut mapper = GestureMapper::new(Point::new(0.0, 0.0));
        let mut sink = Recorder::default();
        mapper.start_drag(at_angle(PI - 0.01));
        let rate = mapper.move_drag(at_angle(-PI + 0.01), &mut sink).unwrap();
        assert!(rate > 0.0 && rate < 1.0);
    }

    #[test]
    fn move_without_drag_is_ignored() {
        let mut mapper = GestureMapper::new(Point::new(0.0, 0.0));
        let mut sink = Recorder::default();
        assert_eq!(mapper.move_drag(at_angle(1.0), &mut sink), None);
        assert!(sink.0.is_empty());
    }

    #[test]
    fn degenerate_points_never_panic() {
        let mut mapper = GestureMapper::new(Point::new(5.0, 5.0));
        let mut sink = Recorder::default();
        mapper.start_drag(None);
        assert!(!mapper.is_dragging());
        mapper.start_drag(Some(Point::new(f32::NAN, 1.0)));
        assert!(!mapper.is_dragging());

        mapper.start_drag(Some(Point::new(5.0, 5.0)));
        assert!(mapper.is_dragging());
        assert_eq!(mapper.move_drag(None, &mut sink), None);
        assert_eq!(mapper.move_drag(Some(Point::new(f32::INFINITY, 0.0)), &mut sink), None);
        let rate = mapper.move_drag(Some(Point::new(5.0, 5.0)), &mut sink).unwrap();
        assert_eq!(rate, 0.0);
    }

    #[test]
    fn idle_decay_converges_and_snaps() {
        let mut mapper = GestureMapper::new(Point::new(0.0, 0.0));
        let mut sink = Recorder::default();
        mapper.start_drag(at_angle(0.0));
        mapper.move_drag(at_angle(0.15), &mut sink);
        mapper.end_drag();
        assert!((mapper.rate() - 3.0).abs() < 1e-3);

        let mut prev = (mapper.rate() - 1.0).abs();
        let mut ticks = 0;
        while mapper.rate() != 1.0 {
            mapper.tick(NOMINAL_FRAME, true, 1.0, &mut sink);
            let dist = (mapper.rate() - 1.0).abs();
            assert!(dist < prev || dist == 0.0);
            prev = dist;
            ticks += 1;
            assert!(ticks <= 60, "did not converge");
        }
        assert_eq!(*sink.0.last().unwrap(), 1.0);
    }

    #[test]
    fn decay_is_normalized_to_tick_length() {
        let mut fast = GestureMapper::new(Point::new(0.0, 0.0));
        let mut slow = fast.clone();
        let mut sink = Recorder::default();
        for _ in 0..2 {
            fast.tick(NOMINAL_FRAME, true, 1.0, &mut sink);
        }
        slow.tick(NOMINAL_FRAME * 2, true, 1.0, &mut sink);
        assert!((fast.rate() - slow.rate()).abs() < 1e-4);
    }

    #[test]
    fn stopped_transport_spins_down_to_zero() {
        let mut mapper = GestureMapper::new(Point::new(0.0, 0.0));
        let mut sink = Recorder::default();
        for _ in 0..200 {
            mapper.tick(NOMINAL_FRAME, true, 1.2, &mut sink);
        }
        assert_eq!(mapper.rate(), 1.2);
        for _ in 0..200 {
            mapper.tick(NOMINAL_FRAME, false, 1.2, &mut sink);
        }
        assert_eq!(mapper.rate(), 0.0);
    }

    #[test]
    fn tick_never_writes_while_dragging() {
        let mut mapper = GestureMapper::new(Point::new(0.0, 0.0));
        let mut sink = Recorder::default();
        mapper.start_drag(at_angle(0.0));
        assert_eq!(mapper.tick(NOMINAL_FRAME, true, 1.0, &mut sink), None);
        assert!(sink.0.is_empty());
    }
}
