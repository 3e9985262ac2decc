use crate::error::Error;
use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

/// Calibration points closer than this are treated as coincident.
pub const MIN_PIXEL_DISTANCE: f64 = 1e-9;

/// A user-marked pixel location.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<PixelPoint> for na::Point2<f64> {
    #[inline]
    fn from(p: PixelPoint) -> Self {
        na::Point2::new(p.x, p.y)
    }
}

/// Pixel to meter scale shared by every frame of a run.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Calibration {
    meters_per_pixel: f64,
}

impl Calibration {
    /// `scale_cm` is the real-world distance between `p1` and `p2`.
    pub fn resolve(p1: PixelPoint, p2: PixelPoint, scale_cm: f64) -> Result<Self, Error> {
        if !scale_cm.is_finite() || scale_cm <= 0.0 {
            return Err(Error::Validation(format!(
                "scale length must be a positive number of centimeters, got {}",
                scale_cm
            )));
        }

        for p in [p1, p2] {
            if !p.x.is_finite() || !p.y.is_finite() {
                return Err(Error::Validation(format!(
                    "calibration point is not finite: {:?}",
                    p
                )));
            }
        }

        let (a, b): (na::Point2<f64>, na::Point2<f64>) = (p1.into(), p2.into());
        let pixel_dist = na::distance(&a, &b);
        if pixel_dist <= MIN_PIXEL_DISTANCE {
            return Err(Error::Calibration(format!(
                "calibration points {:?} and {:?} coincide",
                p1, p2
            )));
        }

        Ok(Self {
            meters_per_pixel: (scale_cm / 100.0) / pixel_dist,
        })
    }

    #[inline]
    pub fn meters_per_pixel(&self) -> f64 {
        self.meters_per_pixel
    }

    #[inline]
    pub fn to_meters(&self, px: na::Point2<f64>) -> na::Point2<f64> {
        px * self.meters_per_pixel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_scale() {
        let c = Calibration::resolve(PixelPoint::new(0.0, 0.0), PixelPoint::new(100.0, 0.0), 50.0)
            .unwrap();
        assert_relative_eq!(c.meters_per_pixel(), 0.005);

        let c = Calibration::resolve(PixelPoint::new(3.0, 4.0), PixelPoint::new(0.0, 0.0), 500.0)
            .unwrap();
        assert_relative_eq!(c.meters_per_pixel(), 1.0);

        let m = c.to_meters(na::Point2::new(2.0, 8.0));
        assert_relative_eq!(m.x, 2.0);
        assert_relative_eq!(m.y, 8.0);
    }

    #[test]
    fn test_coincident_points() {
        let p = PixelPoint::new(12.5, 7.0);

        assert!(matches!(
            Calibration::resolve(p, p, 10.0),
            Err(Error::Calibration(_))
        ));
    }

    #[test]
    fn test_invalid_inputs() {
        let (a, b) = (PixelPoint::new(0.0, 0.0), PixelPoint::new(1.0, 0.0));

        assert!(matches!(Calibration::resolve(a, b, 0.0), Err(Error::Validation(_))));
        assert!(matches!(Calibration::resolve(a, b, -2.0), Err(Error::Validation(_))));
        assert!(matches!(
            Calibration::resolve(PixelPoint::new(f64::NAN, 0.0), b, 2.0),
            Err(Error::Validation(_))
        ));
    }
}
