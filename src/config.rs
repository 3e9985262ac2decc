use crate::bbox::{BoundingBox, RawBBox};
use crate::calibration::{Calibration, PixelPoint};
use crate::error::Error;
use crate::kinematics::GapPolicy;
use crate::tracker::Algorithm;
use serde_derive::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub algorithm: Algorithm,
    /// Used when the source reports no usable frame rate.
    pub fallback_fps: f64,
    pub gap_policy: GapPolicy,
    pub output: OutputConfig,
    pub annotation: AnnotationStyle,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Csrt,
            fallback_fps: 30.0,
            gap_policy: GapPolicy::Hold,
            output: OutputConfig::default(),
            annotation: AnnotationStyle::default(),
        }
    }
}

impl TrackingConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let file = std::fs::File::open(path)?;
        let config: Self = serde_json::from_reader(std::io::BufReader::new(file))?;

        if !config.fallback_fps.is_finite() || config.fallback_fps <= 0.0 {
            return Err(Error::Validation(format!(
                "fallback_fps must be positive, got {}",
                config.fallback_fps
            )));
        }

        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub video_stem: String,
    pub video_ext: String,
    pub fourcc: String,
    pub table_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            video_stem: "tracked".into(),
            video_ext: "mp4".into(),
            fourcc: "mp4v".into(),
            table_name: "track.csv".into(),
        }
    }
}

impl OutputConfig {
    #[inline]
    pub fn video_name(&self) -> String {
        format!("{}.{}", self.video_stem, self.video_ext)
    }

    pub fn fourcc_chars(&self) -> Result<[char; 4], Error> {
        let chars: Vec<char> = self.fourcc.chars().collect();

        match chars.as_slice() {
            &[a, b, c, d] => Ok([a, b, c, d]),
            _ => Err(Error::Validation(format!(
                "fourcc must be 4 characters, got {:?}",
                self.fourcc
            ))),
        }
    }
}

/// Colors are BGR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationStyle {
    pub box_color: [f64; 3],
    pub cross_color: [f64; 3],
    pub thickness: i32,
    pub cross_half_size: f64,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            box_color: [0.0, 255.0, 0.0],
            cross_color: [0.0, 0.0, 255.0],
            thickness: 2,
            cross_half_size: 10.0,
        }
    }
}

/// Inputs of a single run as handed over by the annotation layer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobParams {
    pub scale_cm: f64,
    pub p1: PixelPoint,
    pub p2: PixelPoint,
    pub bbox: RawBBox,
}

impl JobParams {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let file = std::fs::File::open(path)?;

        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }

    /// Checks everything that can be checked without the video.
    pub fn validate(&self) -> Result<(Calibration, BoundingBox), Error> {
        let calibration = Calibration::resolve(self.p1, self.p2, self.scale_cm)?;
        let bbox = self.bbox.resolve()?;

        Ok((calibration, bbox))
    }
}
