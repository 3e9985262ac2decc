use crate::config::OutputConfig;
use crate::error::Error;
use crate::kinematics::FrameRecord;
use serde_derive::Serialize;
use std::io;
use std::path::{Path, PathBuf};

pub const HEADER: [&str; 7] = ["time", "x", "y", "vx", "vy", "ax", "ay"];

/// Writes records as `time,x,y,vx,vy,ax,ay` rows, empty cells for absent values.
pub fn write_table<W: io::Write>(out: W, records: &[FrameRecord]) -> Result<(), Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(out);

    writer.write_record(HEADER)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}

pub fn write_table_file<P: AsRef<Path>>(path: P, records: &[FrameRecord]) -> Result<(), Error> {
    let file = std::fs::File::create(path)?;

    write_table(io::BufWriter::new(file), records)
}

/// Artifact locations of one run inside the result directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultPaths {
    pub video: PathBuf,
    pub table: PathBuf,
}

impl ResultPaths {
    pub fn new<P: AsRef<Path>>(result_dir: P, output: &OutputConfig) -> Self {
        let dir = result_dir.as_ref();

        Self {
            video: dir.join(output.video_name()),
            table: dir.join(&output.table_name),
        }
    }
}
