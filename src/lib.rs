pub mod bbox;
pub mod calibration;
pub mod config;
pub mod error;
pub mod frame;
pub mod kinematics;
pub mod math;
pub mod output;
pub mod pipeline;
pub mod tracker;

#[cfg(feature = "video")]
pub mod video;

pub use bbox::{BoundingBox, RawBBox};
pub use calibration::{Calibration, PixelPoint};
pub use config::{JobParams, TrackingConfig};
pub use error::Error;
pub use kinematics::{FrameRecord, GapPolicy, Kinematics, TrackState};
pub use pipeline::{Pipeline, TrackingRun};
pub use tracker::{Algorithm, Namespace, TrackingEngine};
