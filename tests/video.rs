#![cfg(feature = "video")]

use kinetrack::config::OutputConfig;
use kinetrack::{video, JobParams, PixelPoint, RawBBox, TrackingConfig};
use opencv::{core, imgproc, prelude::*, videoio};
use std::path::{Path, PathBuf};

const WIDTH: i32 = 640;
const HEIGHT: i32 = 480;
const FPS: f64 = 30.0;
const FRAMES: i32 = 10;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("kinetrack-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// 20x20 white square moving 5 px per frame on a black background.
fn write_synthetic_video(path: &Path) {
    let mut writer = videoio::VideoWriter::new(
        path.to_str().unwrap(),
        videoio::VideoWriter::fourcc('M', 'J', 'P', 'G').unwrap(),
        FPS,
        core::Size::new(WIDTH, HEIGHT),
        true,
    )
    .unwrap();
    assert!(writer.is_opened().unwrap());

    for i in 0..FRAMES {
        let mut frame = core::Mat::new_rows_cols_with_default(
            HEIGHT,
            WIDTH,
            core::CV_8UC3,
            core::Scalar::all(0.0),
        )
        .unwrap();

        imgproc::rectangle(
            &mut frame,
            core::Rect::new(10 + 5 * i, 10, 20, 20),
            core::Scalar::all(255.0),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )
        .unwrap();

        writer.write(&frame).unwrap();
    }

    writer.release().unwrap();
}

fn avi_config() -> TrackingConfig {
    TrackingConfig {
        output: OutputConfig {
            video_ext: "avi".into(),
            fourcc: "MJPG".into(),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[test]
fn test_run_job_end_to_end() {
    let dir = scratch_dir("e2e");
    let source = dir.join("source.avi");
    write_synthetic_video(&source);

    let params = JobParams {
        scale_cm: 100.0,
        p1: PixelPoint::new(0.0, 0.0),
        p2: PixelPoint::new(200.0, 0.0),
        bbox: RawBBox::ltwh(10.0, 10.0, 20.0, 20.0),
    };

    let outputs = video::run_job(&source, dir.join("result"), &params, &avi_config()).unwrap();

    assert_eq!(outputs.rows, FRAMES as usize);
    assert_eq!(outputs.video, dir.join("result").join("tracked.avi"));
    assert_eq!(outputs.table, dir.join("result").join("track.csv"));

    let mut reader = csv::Reader::from_path(&outputs.table).unwrap();
    assert_eq!(
        reader.headers().unwrap().iter().collect::<Vec<_>>(),
        vec!["time", "x", "y", "vx", "vy", "ax", "ay"]
    );

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), FRAMES as usize);
    assert!(!rows[0][1].is_empty());
    for col in 3..7 {
        assert!(rows[0][col].is_empty());
    }

    // 5 px per frame at 30 fps and 1 m per 200 px, give or take 1.5 px
    let vx: f64 = rows[1][3].parse().unwrap();
    assert!((vx - 0.75).abs() < 0.25, "vx = {}", vx);

    let cap = videoio::VideoCapture::from_file(outputs.video.to_str().unwrap(), videoio::CAP_ANY)
        .unwrap();
    assert!(cap.is_opened().unwrap());
    assert_eq!(cap.get(videoio::CAP_PROP_FRAME_WIDTH).unwrap() as i32, WIDTH);
    assert_eq!(cap.get(videoio::CAP_PROP_FRAME_HEIGHT).unwrap() as i32, HEIGHT);
    assert!((cap.get(videoio::CAP_PROP_FPS).unwrap() - FPS).abs() < 1e-3);
    assert_eq!(cap.get(videoio::CAP_PROP_FRAME_COUNT).unwrap() as i32, FRAMES);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_extract_first_frame() {
    let dir = scratch_dir("first");
    let source = dir.join("source.avi");
    write_synthetic_video(&source);

    let png = video::extract_first_frame(&source, dir.join("tmp"), "job1")
        .unwrap()
        .unwrap();

    assert_eq!(png, dir.join("tmp").join("job1_first.png"));
    assert!(png.exists());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_missing_video() {
    let dir = scratch_dir("missing");
    let params = JobParams {
        scale_cm: 100.0,
        p1: PixelPoint::new(0.0, 0.0),
        p2: PixelPoint::new(200.0, 0.0),
        bbox: RawBBox::ltwh(10.0, 10.0, 20.0, 20.0),
    };

    let res = video::run_job(dir.join("nope.avi"), dir.join("result"), &params, &avi_config());
    assert!(res.is_err());
    assert!(!dir.join("result").join("track.csv").exists());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_coincident_calibration_fails_before_io() {
    let dir = scratch_dir("calib");
    let params = JobParams {
        scale_cm: 100.0,
        p1: PixelPoint::new(5.0, 5.0),
        p2: PixelPoint::new(5.0, 5.0),
        bbox: RawBBox::ltwh(10.0, 10.0, 20.0, 20.0),
    };

    let res = video::run_job(dir.join("nope.avi"), dir.join("result"), &params, &avi_config());
    assert!(matches!(res, Err(kinetrack::Error::Calibration(_))));
    assert!(!dir.join("result").exists());

    let _ = std::fs::remove_dir_all(&dir);
}
