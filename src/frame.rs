use crate::bbox::BoundingBox;
use crate::config::AnnotationStyle;
use crate::error::Error;

/// Stream properties read once when a source is opened.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VideoMeta {
    pub fps: f64,
    pub width: i32,
    pub height: i32,
}

impl VideoMeta {
    #[inline]
    pub fn dims(&self) -> (u32, u32) {
        (self.width.max(0) as u32, self.height.max(0) as u32)
    }

    #[inline]
    pub fn dt(&self) -> f64 {
        1.0 / self.fps
    }
}

/// Sequential frame decoder.
pub trait FrameSource {
    type Frame: Canvas;

    fn meta(&self) -> VideoMeta;

    /// `Ok(None)` at end of stream.
    fn read(&mut self) -> Result<Option<Self::Frame>, Error>;

    /// Media position of the last decoded frame, in milliseconds.
    fn position_ms(&self) -> Result<f64, Error>;

    /// Moves the decode cursor back to the first frame.
    fn rewind(&mut self) -> Result<(), Error>;
}

/// Sequential frame encoder.
pub trait FrameSink<F> {
    fn write(&mut self, frame: &F) -> Result<(), Error>;

    /// Flushes and releases the underlying encoder.
    fn finish(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

/// A decoded frame that can be drawn on.
pub trait Canvas {
    /// (width, height) in pixels
    fn dims(&self) -> (u32, u32);

    /// Draws the tracked box and a cross on its centroid.
    fn draw_track(&mut self, bbox: &BoundingBox, style: &AnnotationStyle) -> Result<(), Error>;
}
