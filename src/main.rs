use clap::{Parser, Subcommand};
use kinetrack::{video, Algorithm, JobParams, TrackingConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kinetrack", version, about = "Single object tracking with position, velocity and acceleration output")]
struct Opts {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Track the object and write the annotated video and the kinematics table
    Track {
        /// Source video
        #[arg(long)]
        video: PathBuf,

        /// Directory receiving the results, created if absent
        #[arg(long)]
        result_dir: PathBuf,

        /// JSON file with `scale_cm`, `p1`, `p2` and `bbox`
        #[arg(long)]
        params: PathBuf,

        /// JSON run configuration
        #[arg(long)]
        config: Option<PathBuf>,

        /// Preferred tracking algorithm (CSRT, KCF, MOSSE)
        #[arg(long)]
        algorithm: Option<Algorithm>,
    },

    /// Save the first frame of a video as `<stem>_first.png`
    FirstFrame {
        #[arg(long)]
        video: PathBuf,

        #[arg(long)]
        out_dir: PathBuf,

        #[arg(long, default_value = "video")]
        stem: String,
    },
}

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kinetrack=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Opts::parse().command {
        Command::Track {
            video,
            result_dir,
            params,
            config,
            algorithm,
        } => {
            let mut config = match config {
                Some(path) => TrackingConfig::load(path)?,
                None => TrackingConfig::default(),
            };

            if let Some(algorithm) = algorithm {
                config.algorithm = algorithm;
            }

            let params = JobParams::load(params)?;
            let outputs = video::run_job(video, result_dir, &params, &config)?;

            println!(
                "{}",
                serde_json::json!({
                    "ok": true,
                    "video": outputs.video,
                    "table": outputs.table,
                    "rows": outputs.rows,
                    "lost": outputs.lost,
                    "algorithm": outputs.algorithm,
                })
            );
        }

        Command::FirstFrame {
            video,
            out_dir,
            stem,
        } => match video::extract_first_frame(&video, out_dir, &stem)? {
            Some(path) => println!("{}", path.display()),
            None => anyhow::bail!("could not read the first frame of {}", video.display()),
        },
    }

    Ok(())
}
