use crate::{
    calib::{Calibration, CalibrationSummary},
    error::{Error, Result},
    parse::{load_calibrations, load_poses, load_times},
    types::Pose,
};
use itertools::{Itertools, MinMaxResult};
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

/// Where the inputs of one sequence live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPaths {
    pub times: PathBuf,
    pub poses: PathBuf,
    pub calib: PathBuf,
    pub velodyne_dir: PathBuf,
}

impl DatasetPaths {
    /// The layout of the KITTI odometry benchmark:
    ///
    /// ```text
    /// <root>/sequences/<seq>/times.txt
    /// <root>/sequences/<seq>/calib.txt
    /// <root>/sequences/<seq>/velodyne/*.bin
    /// <root>/poses/<seq>.txt
    /// ```
    pub fn kitti<P>(root: P, sequence: &str) -> Self
    where
        P: AsRef<Path>,
    {
        let root = root.as_ref();
        let sequence_dir = root.join("sequences").join(sequence);

        Self {
            times: sequence_dir.join("times.txt"),
            poses: root.join("poses").join(format!("{sequence}.txt")),
            calib: sequence_dir.join("calib.txt"),
            velodyne_dir: sequence_dir.join("velodyne"),
        }
    }
}

/// All tables of a sequence, loaded once and read-only afterwards.
#[derive(Debug, Clone)]
pub struct Dataset {
    times: Vec<f64>,
    poses: Vec<Pose>,
    calibrations: Vec<Calibration>,
    scans: Vec<PathBuf>,
}

impl Dataset {
    pub fn new(
        times: Vec<f64>,
        poses: Vec<Pose>,
        calibrations: Vec<Calibration>,
        scans: Vec<PathBuf>,
    ) -> Self {
        Self {
            times,
            poses,
            calibrations,
            scans,
        }
    }

    pub fn load(paths: &DatasetPaths) -> Result<Self> {
        let times = load_times(&paths.times)?;
        let poses = load_poses(&paths.poses)?;
        let calibrations = load_calibrations(&paths.calib)?;
        let scans = list_scans(&paths.velodyne_dir);

        let dataset = Self::new(times, poses, calibrations, scans);
        let frames = dataset.frame_count();
        info!(
            "{frames} frames, {} timestamps, {} poses, {} calibration entries",
            dataset.times.len(),
            dataset.poses.len(),
            dataset.calibrations.len()
        );

        if dataset.poses.len() < frames {
            warn!(
                "only {} poses for {frames} frames, the run will stop at frame {}",
                dataset.poses.len(),
                dataset.poses.len()
            );
        }
        if !dataset.times.is_empty() && dataset.times.len() != frames {
            warn!("{} timestamps for {frames} frames", dataset.times.len());
        }

        Ok(dataset)
    }

    /// One frame per scan file.
    pub fn frame_count(&self) -> usize {
        self.scans.len()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn poses(&self) -> &[Pose] {
        &self.poses
    }

    pub fn calibrations(&self) -> &[Calibration] {
        &self.calibrations
    }

    pub fn scans(&self) -> &[PathBuf] {
        &self.scans
    }

    pub fn pose(&self, frame: usize) -> Result<&Pose> {
        self.poses.get(frame).ok_or(Error::Index {
            table: "pose",
            index: frame,
            len: self.poses.len(),
        })
    }

    pub fn calibration(&self, index: usize) -> Result<&Calibration> {
        self.calibrations.get(index).ok_or(Error::Index {
            table: "calibration",
            index,
            len: self.calibrations.len(),
        })
    }

    pub fn scan(&self, frame: usize) -> Result<&Path> {
        self.scans
            .get(frame)
            .map(PathBuf::as_path)
            .ok_or(Error::Index {
                table: "scan",
                index: frame,
                len: self.scans.len(),
            })
    }

    pub fn summary(&self) -> DatasetSummary {
        let time_span = match self.times.iter().copied().minmax() {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(time) => Some([time, time]),
            MinMaxResult::MinMax(min, max) => Some([min, max]),
        };

        DatasetSummary {
            frames: self.frame_count(),
            timestamps: self.times.len(),
            time_span,
            poses: self.poses.len(),
            calibrations: self.calibrations.iter().map(Calibration::summary).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub frames: usize,
    pub timestamps: usize,
    /// Earliest and latest timestamp in seconds.
    pub time_span: Option<[f64; 2]>,
    pub poses: usize,
    pub calibrations: Vec<CalibrationSummary>,
}

/// The `.bin` files of a scan directory sorted by name. A directory that
/// cannot be listed gives no frames.
fn list_scans(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(
                "unable to list scan directory '{}' ({err}), no frames to map",
                dir.display()
            );
            return vec![];
        }
    };

    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "bin"))
        .sorted()
        .collect()
}
