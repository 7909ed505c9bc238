use crate::{
    dataset::DatasetPaths,
    mapping::{DEFAULT_CALIB_INDEX, DEFAULT_FRAMES_PER_TILE},
    types::{Homogenization, PcdData, TileFormat},
};
use clap::{Args, Parser};
use eyre::{eyre, Result};
use std::path::PathBuf;

/// Build world-frame point cloud maps from KITTI-style lidar sequences.
#[derive(Debug, Clone, Parser)]
#[clap(version)]
pub enum Opts {
    Map(Map),
    Inspect(Inspect),
    Info(Info),
}

/// Project every scan of a sequence into the world frame and write tiles.
#[derive(Debug, Clone, Parser)]
pub struct Map {
    #[clap(flatten)]
    pub dataset: DatasetArgs,

    /// Path prefix of the tiles, e.g. `maps/seq00_` for `maps/seq00_00.pcd`.
    #[clap(short, long)]
    pub output: PathBuf,

    /// Index of the calibration line whose matrix maps the scan points.
    #[clap(long, default_value_t = DEFAULT_CALIB_INDEX)]
    pub calib_index: usize,

    /// A tile is closed after every frame index divisible by this number.
    #[clap(long, default_value_t = DEFAULT_FRAMES_PER_TILE, value_parser = parse_frames_per_tile)]
    pub frames_per_tile: usize,

    #[clap(long, value_enum, default_value_t = Homogenization::Literal)]
    pub homogenization: Homogenization,

    #[clap(short, long, value_enum, default_value_t = TileFormat::Pcd)]
    pub format: TileFormat,

    /// Encoding of PCD tiles.
    #[clap(long, value_enum, default_value_t = PcdData::Binary)]
    pub pcd_data: PcdData,
}

/// Print what a sequence contains, including decomposed calibrations.
#[derive(Debug, Clone, Parser)]
pub struct Inspect {
    #[clap(flatten)]
    pub dataset: DatasetArgs,

    #[clap(long)]
    pub json: bool,
}

/// Show the fields and point count of a written tile.
#[derive(Debug, Clone, Parser)]
pub struct Info {
    pub file: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct DatasetArgs {
    /// Root of the KITTI odometry dataset.
    #[clap(short, long, env = "KITTI_ROOT")]
    pub root: Option<PathBuf>,

    #[clap(short, long, default_value = "00")]
    pub sequence: String,

    #[clap(long)]
    pub times: Option<PathBuf>,

    #[clap(long)]
    pub poses: Option<PathBuf>,

    #[clap(long)]
    pub calib: Option<PathBuf>,

    /// Directory of the `.bin` scans.
    #[clap(long)]
    pub velodyne_dir: Option<PathBuf>,
}

impl DatasetArgs {
    /// Resolve the input paths. Explicit paths win over the layout under
    /// `--root`; without a root every path must be given.
    pub fn paths(&self) -> Result<DatasetPaths> {
        let Self {
            root,
            sequence,
            times,
            poses,
            calib,
            velodyne_dir,
        } = self;

        let layout = root
            .as_ref()
            .map(|root| DatasetPaths::kitti(root, sequence));
        let pick = |explicit: &Option<PathBuf>, name: &str, default: Option<&PathBuf>| {
            explicit
                .clone()
                .or_else(|| default.cloned())
                .ok_or_else(|| eyre!("--{name} is required when --root is not given"))
        };

        Ok(DatasetPaths {
            times: pick(times, "times", layout.as_ref().map(|l| &l.times))?,
            poses: pick(poses, "poses", layout.as_ref().map(|l| &l.poses))?,
            calib: pick(calib, "calib", layout.as_ref().map(|l| &l.calib))?,
            velodyne_dir: pick(
                velodyne_dir,
                "velodyne-dir",
                layout.as_ref().map(|l| &l.velodyne_dir),
            )?,
        })
    }
}

fn parse_frames_per_tile(text: &str) -> Result<usize, String> {
    match text.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(count) => Ok(count),
        Err(err) => Err(err.to_string()),
    }
}
