use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation Error: {0}")]
    Validation(String),

    #[error("Calibration Error: {0}")]
    Calibration(String),

    #[error("Video Open Error: {0}")]
    VideoOpen(String),

    #[error("Tracker Unavailable: no algorithm could be constructed (tried {tried})")]
    TrackerUnavailable { tried: String },

    #[error("Tracker Init Error: initial box {0:?} rejected")]
    TrackerInit([f64; 4]),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "video")]
    #[error("OpenCV Error: {0}")]
    OpenCv(#[from] opencv::Error),
}
