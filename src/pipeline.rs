use crate::bbox::RawBBox;
use crate::calibration::Calibration;
use crate::config::TrackingConfig;
use crate::error::Error;
use crate::frame::{Canvas, FrameSink, FrameSource, VideoMeta};
use crate::kinematics::{FrameRecord, Kinematics};
use crate::tracker::{self, Algorithm, Namespace, TrackingEngine};
use nalgebra as na;
use tracing::{debug, info};

/// Result of a completed run: one record per decoded frame.
#[derive(Debug, Clone)]
pub struct TrackingRun {
    pub records: Vec<FrameRecord>,
    pub algorithm: Algorithm,
    pub namespace: Namespace,
    pub meta: VideoMeta,
}

impl TrackingRun {
    #[inline]
    pub fn frames(&self) -> usize {
        self.records.len()
    }

    pub fn lost(&self) -> usize {
        self.records.iter().filter(|r| r.is_lost()).count()
    }
}

pub struct Pipeline<'a> {
    config: &'a TrackingConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a TrackingConfig) -> Self {
        Self { config }
    }

    /// Fixes up the stream properties reported by the decoder.
    pub fn effective_meta(&self, reported: VideoMeta) -> Result<VideoMeta, Error> {
        if reported.width <= 0 || reported.height <= 0 {
            return Err(Error::VideoOpen(format!(
                "invalid frame size {}x{}",
                reported.width, reported.height
            )));
        }

        let fps = if reported.fps.is_finite() && reported.fps > 0.0 {
            reported.fps
        } else {
            debug!(
                "source reports fps {}, using {}",
                reported.fps, self.config.fallback_fps
            );
            self.config.fallback_fps
        };

        Ok(VideoMeta { fps, ..reported })
    }

    /// Tracks the object through every frame of `source`.
    ///
    /// `construct` builds a tracking engine for a given algorithm variant,
    /// `open_sink` is called once the tracker accepted the initial box.
    pub fn run<S, E, C, W, O>(
        &self,
        source: &mut S,
        calibration: Calibration,
        bbox: &RawBBox,
        construct: C,
        open_sink: O,
    ) -> Result<TrackingRun, Error>
    where
        S: FrameSource,
        E: TrackingEngine<S::Frame>,
        C: Fn(Algorithm, Namespace) -> Result<E, Error>,
        W: FrameSink<S::Frame>,
        O: FnOnce(&VideoMeta) -> Result<W, Error>,
    {
        let meta = self.effective_meta(source.meta())?;

        let first = source
            .read()?
            .ok_or_else(|| Error::VideoOpen("cannot read first frame".into()))?;

        let provided = tracker::provide(self.config.algorithm, construct)?;
        let mut engine = provided.engine;

        let init_box = bbox.normalize(first.dims())?;
        if !engine.init(&first, &init_box)? {
            return Err(Error::TrackerInit(init_box.into()));
        }
        drop(first);

        source.rewind()?;

        info!(
            "tracking {}x{} @ {:.3} fps, dt {:.5} s, {:.6} m/px, init box {:?}",
            meta.width,
            meta.height,
            meta.fps,
            meta.dt(),
            calibration.meters_per_pixel(),
            init_box.as_slice()
        );

        let mut sink = open_sink(&meta)?;
        let mut kinematics = Kinematics::new(calibration, meta.dt(), self.config.gap_policy);
        let mut records = Vec::new();

        while let Some(mut frame) = source.read()? {
            let pos_ms = source.position_ms()?;
            let time_s = if pos_ms.is_finite() { pos_ms / 1000.0 } else { 0.0 };

            match engine.update(&frame)? {
                Some(bbox) => {
                    let c = bbox.as_xywh();
                    let record = kinematics.observe(time_s, na::Point2::new(c.cx(), c.cy()));

                    frame.draw_track(&bbox, &self.config.annotation)?;
                    sink.write(&frame)?;
                    records.push(record);
                }
                None => {
                    debug!("object lost at {:.3} s (frame {})", time_s, records.len());

                    sink.write(&frame)?;
                    records.push(kinematics.lost(time_s));
                }
            }
        }

        sink.finish()?;

        let run = TrackingRun {
            records,
            algorithm: provided.algorithm,
            namespace: provided.namespace,
            meta,
        };

        info!("processed {} frames, lost on {}", run.frames(), run.lost());

        Ok(run)
    }
}
