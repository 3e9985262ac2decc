use crate::calibration::Calibration;
use crate::math::{backward_diff, round_to};
use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

pub const TIME_PLACES: i32 = 3;
pub const VALUE_PLACES: i32 = 4;

/// What happens to the finite differences once tracking resumes after a loss.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapPolicy {
    /// Difference against the last valid sample over a single `dt`.
    Hold,
    /// Forget the previous samples; velocity restarts from scratch.
    Reset,
    /// Difference against the last valid sample over the real elapsed time.
    Elapsed,
}

impl Default for GapPolicy {
    fn default() -> Self {
        GapPolicy::Hold
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackState {
    pub previous_position_m: Option<na::Vector2<f64>>,
    pub previous_velocity_m_s: Option<na::Vector2<f64>>,
}

/// One table row. Fields are already rounded; `None` means "not measurable".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameRecord {
    #[serde(rename = "time")]
    pub time_s: f64,
    #[serde(rename = "x")]
    pub x_m: Option<f64>,
    #[serde(rename = "y")]
    pub y_m: Option<f64>,
    pub vx: Option<f64>,
    pub vy: Option<f64>,
    pub ax: Option<f64>,
    pub ay: Option<f64>,
}

impl FrameRecord {
    pub fn lost(time_s: f64) -> Self {
        Self {
            time_s: round_to(time_s, TIME_PLACES),
            x_m: None,
            y_m: None,
            vx: None,
            vy: None,
            ax: None,
            ay: None,
        }
    }

    pub fn tracked(
        time_s: f64,
        pos: na::Vector2<f64>,
        vel: Option<na::Vector2<f64>>,
        acc: Option<na::Vector2<f64>>,
    ) -> Self {
        let r = |v: f64| round_to(v, VALUE_PLACES);

        Self {
            time_s: round_to(time_s, TIME_PLACES),
            x_m: Some(r(pos.x)),
            y_m: Some(r(pos.y)),
            vx: vel.map(|v| r(v.x)),
            vy: vel.map(|v| r(v.y)),
            ax: acc.map(|a| r(a.x)),
            ay: acc.map(|a| r(a.y)),
        }
    }

    #[inline]
    pub fn is_lost(&self) -> bool {
        self.x_m.is_none()
    }
}

/// Running position/velocity state of a single run.
#[derive(Debug, Clone)]
pub struct Kinematics {
    calibration: Calibration,
    dt: f64,
    policy: GapPolicy,
    state: TrackState,
    // frames lost since the last valid sample
    missed: u32,
}

impl Kinematics {
    pub fn new(calibration: Calibration, dt: f64, policy: GapPolicy) -> Self {
        Self {
            calibration,
            dt,
            policy,
            state: TrackState::default(),
            missed: 0,
        }
    }

    #[inline]
    pub fn state(&self) -> &TrackState {
        &self.state
    }

    /// Advances the state with a tracked centroid given in pixels.
    pub fn observe(&mut self, time_s: f64, centroid_px: na::Point2<f64>) -> FrameRecord {
        if self.missed > 0 && self.policy == GapPolicy::Reset {
            self.state = TrackState::default();
        }

        let step = match self.policy {
            GapPolicy::Elapsed => self.dt * (self.missed + 1) as f64,
            GapPolicy::Hold | GapPolicy::Reset => self.dt,
        };
        self.missed = 0;

        let pos = self.calibration.to_meters(centroid_px).coords;

        let vel = self
            .state
            .previous_position_m
            .map(|prev| backward_diff(pos, prev, step));

        let acc = match (vel, self.state.previous_velocity_m_s) {
            (Some(v), Some(prev)) => Some(backward_diff(v, prev, step)),
            _ => None,
        };

        self.state.previous_position_m = Some(pos);
        if vel.is_some() {
            self.state.previous_velocity_m_s = vel;
        }

        FrameRecord::tracked(time_s, pos, vel, acc)
    }

    /// Records a frame on which the tracker lost the object. State is kept.
    pub fn lost(&mut self, time_s: f64) -> FrameRecord {
        if self.state.previous_position_m.is_some() {
            self.missed = self.missed.saturating_add(1);
        }

        FrameRecord::lost(time_s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::PixelPoint;
    use approx::assert_relative_eq;

    const FPS: f64 = 30.0;

    fn kinematics(policy: GapPolicy) -> Kinematics {
        // 0.005 m/px
        let calibration =
            Calibration::resolve(PixelPoint::new(0.0, 0.0), PixelPoint::new(200.0, 0.0), 100.0)
                .unwrap();

        Kinematics::new(calibration, 1.0 / FPS, policy)
    }

    fn at(i: usize) -> f64 {
        i as f64 / FPS
    }

    #[test]
    fn test_constant_velocity() {
        let mut k = kinematics(GapPolicy::Hold);
        let (dx, dy) = (5.0, -2.0);

        let records: Vec<_> = (0..5)
            .map(|i| {
                let c = na::Point2::new(100.0 + dx * i as f64, 200.0 + dy * i as f64);
                k.observe(at(i), c)
            })
            .collect();

        assert_relative_eq!(records[0].x_m.unwrap(), 0.5);
        assert_relative_eq!(records[0].y_m.unwrap(), 1.0);
        assert_eq!(records[0].vx, None);
        assert_eq!(records[0].ax, None);

        assert_relative_eq!(records[1].vx.unwrap(), 0.75, epsilon = 1e-9);
        assert_relative_eq!(records[1].vy.unwrap(), -0.3, epsilon = 1e-9);
        assert_eq!(records[1].ax, None);
        assert_eq!(records[1].ay, None);

        for r in &records[2..] {
            assert_relative_eq!(r.vx.unwrap(), 0.75, epsilon = 1e-9);
            assert_relative_eq!(r.ax.unwrap(), 0.0, epsilon = 1e-9);
            assert_relative_eq!(r.ay.unwrap(), 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_constant_acceleration() {
        let mut k = kinematics(GapPolicy::Hold);

        // x = 2 * i^2 px -> a = 4 px/frame^2 -> 4 * 0.005 * 30^2 = 18 m/s^2
        let records: Vec<_> = (0..4)
            .map(|i| k.observe(at(i), na::Point2::new(2.0 * (i * i) as f64, 0.0)))
            .collect();

        assert_relative_eq!(records[2].ax.unwrap(), 18.0, epsilon = 1e-9);
        assert_relative_eq!(records[3].ax.unwrap(), 18.0, epsilon = 1e-9);
    }

    #[test]
    fn test_loss_keeps_state() {
        let mut k = kinematics(GapPolicy::Hold);

        k.observe(at(0), na::Point2::new(0.0, 0.0));
        k.observe(at(1), na::Point2::new(5.0, 0.0));
        let before = k.state().clone();

        let lost = k.lost(at(2));
        assert!(lost.is_lost());
        assert_eq!(lost.vx, None);
        assert_eq!(lost.ax, None);
        assert_eq!(k.state(), &before);

        // 10 px over two frames is still divided by a single dt
        let r = k.observe(at(3), na::Point2::new(15.0, 0.0));
        assert_relative_eq!(r.vx.unwrap(), 1.5, epsilon = 1e-9);
        assert_relative_eq!(r.ax.unwrap(), 22.5, epsilon = 1e-9);
    }

    #[test]
    fn test_loss_reset_policy() {
        let mut k = kinematics(GapPolicy::Reset);

        k.observe(at(0), na::Point2::new(0.0, 0.0));
        k.observe(at(1), na::Point2::new(5.0, 0.0));
        k.lost(at(2));

        let r = k.observe(at(3), na::Point2::new(15.0, 0.0));
        assert_eq!(r.vx, None);
        assert_eq!(r.ax, None);

        let r = k.observe(at(4), na::Point2::new(20.0, 0.0));
        assert_relative_eq!(r.vx.unwrap(), 0.75, epsilon = 1e-9);
        assert_eq!(r.ax, None);
    }

    #[test]
    fn test_loss_elapsed_policy() {
        let mut k = kinematics(GapPolicy::Elapsed);

        k.observe(at(0), na::Point2::new(0.0, 0.0));
        k.observe(at(1), na::Point2::new(5.0, 0.0));
        k.lost(at(2));
        k.lost(at(3));

        let r = k.observe(at(4), na::Point2::new(20.0, 0.0));
        assert_relative_eq!(r.vx.unwrap(), 0.75, epsilon = 1e-9);
        assert_relative_eq!(r.ax.unwrap(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_loss_before_first_sample() {
        let mut k = kinematics(GapPolicy::Elapsed);

        k.lost(at(0));
        k.observe(at(1), na::Point2::new(0.0, 0.0));

        let r = k.observe(at(2), na::Point2::new(5.0, 0.0));
        assert_relative_eq!(r.vx.unwrap(), 0.75, epsilon = 1e-9);
    }
}
