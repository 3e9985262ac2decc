use crate::bbox::{BBox, BoundingBox};
use crate::config::{AnnotationStyle, JobParams, OutputConfig, TrackingConfig};
use crate::error::Error;
use crate::frame::{Canvas, FrameSink, FrameSource, VideoMeta};
use crate::output::{self, ResultPaths};
use crate::pipeline::{Pipeline, TrackingRun};
use crate::tracker::{Algorithm, Namespace, TrackingEngine};
use opencv::{
    core::{self, Mat},
    imgcodecs, imgproc,
    prelude::*,
    tracking, video, videoio,
};
use serde_derive::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

fn path_str(path: &Path) -> Result<&str, Error> {
    path.to_str()
        .ok_or_else(|| Error::Validation(format!("path is not valid UTF-8: {}", path.display())))
}

pub struct VideoSource {
    cap: videoio::VideoCapture,
    meta: VideoMeta,
}

impl VideoSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let cap = videoio::VideoCapture::from_file(path_str(path)?, videoio::CAP_ANY)?;

        if !cap.is_opened()? {
            return Err(Error::VideoOpen(format!("cannot open {}", path.display())));
        }

        let meta = VideoMeta {
            fps: cap.get(videoio::CAP_PROP_FPS)?,
            width: cap.get(videoio::CAP_PROP_FRAME_WIDTH)?.round() as i32,
            height: cap.get(videoio::CAP_PROP_FRAME_HEIGHT)?.round() as i32,
        };

        debug!("opened {}: {:?}", path.display(), meta);

        Ok(Self { cap, meta })
    }
}

impl FrameSource for VideoSource {
    type Frame = Mat;

    fn meta(&self) -> VideoMeta {
        self.meta
    }

    fn read(&mut self) -> Result<Option<Mat>, Error> {
        let mut frame = Mat::default();

        if !self.cap.read(&mut frame)? || frame.rows() == 0 || frame.cols() == 0 {
            return Ok(None);
        }

        Ok(Some(frame))
    }

    fn position_ms(&self) -> Result<f64, Error> {
        Ok(self.cap.get(videoio::CAP_PROP_POS_MSEC)?)
    }

    fn rewind(&mut self) -> Result<(), Error> {
        if !self.cap.set(videoio::CAP_PROP_POS_FRAMES, 0.0)? {
            return Err(Error::VideoOpen(
                "decoder refused to seek back to the first frame".into(),
            ));
        }

        Ok(())
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        if let Err(err) = self.cap.release() {
            warn!("failed to release video capture: {}", err);
        }
    }
}

pub struct VideoSink {
    writer: Option<videoio::VideoWriter>,
}

impl VideoSink {
    pub fn create<P: AsRef<Path>>(path: P, meta: &VideoMeta, output: &OutputConfig) -> Result<Self, Error> {
        let path = path.as_ref();
        let [a, b, c, d] = output.fourcc_chars()?;

        let writer = videoio::VideoWriter::new(
            path_str(path)?,
            videoio::VideoWriter::fourcc(a, b, c, d)?,
            meta.fps,
            core::Size::new(meta.width, meta.height),
            true,
        )?;

        if !writer.is_opened()? {
            return Err(Error::VideoOpen(format!(
                "cannot open {} for writing with fourcc {}",
                path.display(),
                output.fourcc
            )));
        }

        Ok(Self {
            writer: Some(writer),
        })
    }

    pub fn release(&mut self) -> Result<(), Error> {
        if let Some(mut w) = self.writer.take() {
            w.release()?;
        }

        Ok(())
    }
}

impl FrameSink<Mat> for VideoSink {
    fn write(&mut self, frame: &Mat) -> Result<(), Error> {
        match self.writer.as_mut() {
            Some(w) => Ok(w.write(frame)?),
            None => Err(Error::VideoOpen("video writer already released".into())),
        }
    }

    fn finish(&mut self) -> Result<(), Error> {
        self.release()
    }
}

impl Drop for VideoSink {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            warn!("failed to release video writer: {}", err);
        }
    }
}

fn scalar([b, g, r]: [f64; 3]) -> core::Scalar {
    core::Scalar::new(b, g, r, 0.0)
}

impl Canvas for Mat {
    fn dims(&self) -> (u32, u32) {
        (self.cols().max(0) as u32, self.rows().max(0) as u32)
    }

    fn draw_track(&mut self, bbox: &BoundingBox, style: &AnnotationStyle) -> Result<(), Error> {
        let c = bbox.as_xywh();
        let s = style.cross_half_size;

        imgproc::rectangle(
            self,
            outline(bbox),
            scalar(style.box_color),
            style.thickness,
            imgproc::LINE_8,
            0,
        )?;

        imgproc::line(
            self,
            pixel(c.cx() - s, c.cy() - s),
            pixel(c.cx() + s, c.cy() + s),
            scalar(style.cross_color),
            style.thickness,
            imgproc::LINE_8,
            0,
        )?;

        imgproc::line(
            self,
            pixel(c.cx() - s, c.cy() + s),
            pixel(c.cx() + s, c.cy() - s),
            scalar(style.cross_color),
            style.thickness,
            imgproc::LINE_8,
            0,
        )?;

        Ok(())
    }
}

/// OpenCV tracker, one variant per algorithm and namespace.
pub enum CvTracker {
    Csrt(core::Ptr<tracking::TrackerCSRT>),
    Kcf(core::Ptr<tracking::TrackerKCF>),
    LegacyCsrt(core::Ptr<tracking::legacy_TrackerCSRT>),
    LegacyKcf(core::Ptr<tracking::legacy_TrackerKCF>),
    LegacyMosse(core::Ptr<tracking::legacy_TrackerMOSSE>),
}

impl CvTracker {
    fn csrt() -> Result<Self, Error> {
        Ok(CvTracker::Csrt(tracking::TrackerCSRT::create_def()?))
    }

    fn kcf() -> Result<Self, Error> {
        Ok(CvTracker::Kcf(tracking::TrackerKCF::create_def()?))
    }

    fn legacy_csrt() -> Result<Self, Error> {
        Ok(CvTracker::LegacyCsrt(tracking::legacy_TrackerCSRT::create_def()?))
    }

    fn legacy_kcf() -> Result<Self, Error> {
        Ok(CvTracker::LegacyKcf(tracking::legacy_TrackerKCF::create_def()?))
    }

    fn legacy_mosse() -> Result<Self, Error> {
        Ok(CvTracker::LegacyMosse(tracking::legacy_TrackerMOSSE::create()?))
    }

    fn unsupported() -> Result<Self, Error> {
        Err(Error::Validation("MOSSE has no native constructor".into()))
    }

    /// Constructor table for the tracker provider.
    pub fn construct(algorithm: Algorithm, namespace: Namespace) -> Result<Self, Error> {
        let ctor: fn() -> Result<Self, Error> = match (algorithm, namespace) {
            (Algorithm::Csrt, Namespace::Native) => Self::csrt,
            (Algorithm::Csrt, Namespace::Legacy) => Self::legacy_csrt,
            (Algorithm::Kcf, Namespace::Native) => Self::kcf,
            (Algorithm::Kcf, Namespace::Legacy) => Self::legacy_kcf,
            // MOSSE only ships in the legacy namespace
            (Algorithm::Mosse, Namespace::Native) => Self::unsupported,
            (Algorithm::Mosse, Namespace::Legacy) => Self::legacy_mosse,
        };

        ctor()
    }
}

/// Truncates to the pixel grid, toward zero.
#[inline]
fn pixel(x: f64, y: f64) -> core::Point {
    core::Point::new(x as i32, y as i32)
}

/// Drawing rect spanning the truncated corners, both inclusive.
fn outline(bbox: &BoundingBox) -> core::Rect {
    let c = bbox.as_ltrb();
    let tl = pixel(c.left(), c.top());
    let br = pixel(c.right(), c.bottom());

    // `rectangle` stops one pixel short of a rect's bottom-right corner
    core::Rect::new(tl.x, tl.y, br.x - tl.x + 1, br.y - tl.y + 1)
}

fn to_rect(bbox: &BoundingBox) -> core::Rect {
    core::Rect::new(
        bbox.left().round() as i32,
        bbox.top().round() as i32,
        bbox.width().round().max(1.0) as i32,
        bbox.height().round().max(1.0) as i32,
    )
}

fn to_rect2d(bbox: &BoundingBox) -> core::Rect2d {
    core::Rect2d::new(bbox.left(), bbox.top(), bbox.width(), bbox.height())
}

fn init_native<T: video::TrackerTrait>(t: &mut T, frame: &Mat, bbox: &BoundingBox) -> Result<bool, Error> {
    match t.init(frame, to_rect(bbox)) {
        Ok(()) => Ok(true),
        Err(err) => {
            warn!("tracker init failed: {}", err);
            Ok(false)
        }
    }
}

fn update_native<T: video::TrackerTrait>(t: &mut T, frame: &Mat) -> Result<Option<BoundingBox>, Error> {
    let mut r = core::Rect::default();

    if !t.update(frame, &mut r)? {
        return Ok(None);
    }

    Ok(Some(BBox::ltwh(r.x as f64, r.y as f64, r.width as f64, r.height as f64)))
}

fn init_legacy<T: tracking::legacy_TrackerTrait>(
    t: &mut T,
    frame: &Mat,
    bbox: &BoundingBox,
) -> Result<bool, Error> {
    Ok(t.init(frame, to_rect2d(bbox))?)
}

fn update_legacy<T: tracking::legacy_TrackerTrait>(
    t: &mut T,
    frame: &Mat,
) -> Result<Option<BoundingBox>, Error> {
    let mut r = core::Rect2d::default();

    if !t.update(frame, &mut r)? {
        return Ok(None);
    }

    Ok(Some(BBox::ltwh(r.x, r.y, r.width, r.height)))
}

impl TrackingEngine<Mat> for CvTracker {
    fn init(&mut self, frame: &Mat, bbox: &BoundingBox) -> Result<bool, Error> {
        match self {
            CvTracker::Csrt(t) => init_native(t, frame, bbox),
            CvTracker::Kcf(t) => init_native(t, frame, bbox),
            CvTracker::LegacyCsrt(t) => init_legacy(t, frame, bbox),
            CvTracker::LegacyKcf(t) => init_legacy(t, frame, bbox),
            CvTracker::LegacyMosse(t) => init_legacy(t, frame, bbox),
        }
    }

    fn update(&mut self, frame: &Mat) -> Result<Option<BoundingBox>, Error> {
        match self {
            CvTracker::Csrt(t) => update_native(t, frame),
            CvTracker::Kcf(t) => update_native(t, frame),
            CvTracker::LegacyCsrt(t) => update_legacy(t, frame),
            CvTracker::LegacyKcf(t) => update_legacy(t, frame),
            CvTracker::LegacyMosse(t) => update_legacy(t, frame),
        }
    }
}

/// Artifacts and summary of a finished job.
#[derive(Debug, Clone, Serialize)]
pub struct JobOutputs {
    pub video: PathBuf,
    pub table: PathBuf,
    pub rows: usize,
    pub lost: usize,
    pub algorithm: String,
}

/// Runs a whole job: validation, tracking, annotated video and table.
pub fn run_job<P, Q>(
    video: P,
    result_dir: Q,
    params: &JobParams,
    config: &TrackingConfig,
) -> Result<JobOutputs, Error>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let (calibration, _) = params.validate()?;
    config.output.fourcc_chars()?;

    let mut source = VideoSource::open(video)?;

    std::fs::create_dir_all(result_dir.as_ref())?;
    let paths = ResultPaths::new(result_dir, &config.output);

    let run: TrackingRun = Pipeline::new(config).run(
        &mut source,
        calibration,
        &params.bbox,
        CvTracker::construct,
        |meta| VideoSink::create(&paths.video, meta, &config.output),
    )?;
    drop(source);

    output::write_table_file(&paths.table, &run.records)?;

    info!(
        "wrote {} and {}",
        paths.video.display(),
        paths.table.display()
    );

    Ok(JobOutputs {
        rows: run.frames(),
        lost: run.lost(),
        algorithm: format!("{} ({})", run.algorithm, run.namespace),
        video: paths.video,
        table: paths.table,
    })
}

/// Saves the first decodable frame as `<stem>_first.png` in `out_dir`.
pub fn extract_first_frame<P, Q>(video: P, out_dir: Q, stem: &str) -> Result<Option<PathBuf>, Error>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let mut source = VideoSource::open(video)?;

    let frame = match source.read()? {
        Some(frame) => frame,
        None => return Ok(None),
    };

    std::fs::create_dir_all(out_dir.as_ref())?;
    let path = out_dir.as_ref().join(format!("{}_first.png", stem));

    if !imgcodecs::imwrite(path_str(&path)?, &frame, &core::Vector::new())? {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("cannot write {}", path.display()),
        )));
    }

    Ok(Some(path))
}
