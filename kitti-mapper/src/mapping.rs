use crate::{
    dataset::Dataset,
    error::Result,
    io::TileSink,
    project::Projector,
    tile::{TileAccumulator, WrittenTile},
    types::Homogenization,
};
use indicatif::ProgressBar;
use tracing::{debug, info};

pub const DEFAULT_CALIB_INDEX: usize = 4;
pub const DEFAULT_FRAMES_PER_TILE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapSettings {
    /// Which calibration entry maps scan points. Index 4 is the `Tr`
    /// (velodyne to camera 0) line of a KITTI odometry `calib.txt`.
    pub calib_index: usize,
    pub frames_per_tile: usize,
    pub homogenization: Homogenization,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            calib_index: DEFAULT_CALIB_INDEX,
            frames_per_tile: DEFAULT_FRAMES_PER_TILE,
            homogenization: Homogenization::Literal,
        }
    }
}

/// Project every frame of the dataset into the world frame and write the
/// points out as tiles.
///
/// Frames are processed strictly in order. The first error stops the run;
/// tiles written before it stay in the sink.
pub fn build_map<S>(
    dataset: &Dataset,
    settings: &MapSettings,
    sink: S,
    progress: &ProgressBar,
) -> Result<Vec<WrittenTile>>
where
    S: TileSink,
{
    let calibration = dataset.calibration(settings.calib_index)?;
    info!(
        "mapping {} frames with calibration '{}' ({:?} homogenization)",
        dataset.frame_count(),
        calibration.label,
        settings.homogenization
    );

    let projector = Projector::new(calibration, settings.homogenization);
    let mut tiles = TileAccumulator::new(sink, settings.frames_per_tile);
    let frame_count = dataset.frame_count();

    progress.set_length(frame_count as u64);
    for frame in 0..frame_count {
        progress.set_position(frame as u64);

        let pose = dataset.pose(frame)?;
        let scan = dataset.scan(frame)?;
        let points = projector.project_scan(pose, scan)?;
        let added = tiles.push_frame(frame, points)?;

        match dataset.times().get(frame) {
            Some(time) => debug!("frame {frame} at {time:.6}s: {added} points"),
            None => debug!("frame {frame}: {added} points"),
        }
    }
    progress.finish();

    tiles.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        calib::Calibration,
        error::Error,
        io::{write_scan, MemorySink, PcdTileSink},
        types::Pose,
    };
    use approx::assert_abs_diff_eq;
    use kitti_format::{BinPoint, MapPoint};
    use nalgebra::Matrix3x4;
    use pcd_rs::DataKind;
    use std::{fs, path::Path};
    use tempfile::TempDir;

    const POINT: BinPoint = BinPoint {
        x: 1.0,
        y: 1.0,
        z: 1.0,
        intensity: 0.5,
    };

    fn settings() -> MapSettings {
        MapSettings {
            calib_index: 0,
            ..Default::default()
        }
    }

    /// `frames` frames with one point each, pose `i` translating by `(i, 0, 0)`.
    fn shifting_dataset(dir: &Path, frames: usize) -> Dataset {
        let velodyne = dir.join("velodyne");
        fs::create_dir_all(&velodyne).unwrap();

        let scans: Vec<_> = (0..frames)
            .map(|frame| {
                let path = velodyne.join(format!("{frame:06}.bin"));
                write_scan(&path, &[POINT]).unwrap();
                path
            })
            .collect();
        let poses: Vec<Pose> = (0..frames)
            .map(|frame| {
                let mut pose = Pose::identity();
                pose[(0, 3)] = frame as f64;
                pose
            })
            .collect();
        let times = (0..frames).map(|frame| frame as f64 * 0.1).collect();
        let calibration = Calibration::from_projection("Tr", Matrix3x4::identity()).unwrap();

        Dataset::new(times, poses, vec![calibration], scans)
    }

    fn read_tile(path: &Path) -> Vec<MapPoint> {
        let reader: pcd_rs::Reader<MapPoint, _> = pcd_rs::Reader::open(path).unwrap();
        reader.map(|point| point.unwrap()).collect()
    }

    #[test]
    fn two_hundred_fifty_frames_make_three_tiles() {
        let dir = TempDir::new().unwrap();
        let dataset = shifting_dataset(dir.path(), 250);
        let prefix = dir.path().join("out").join("map_");
        let sink = PcdTileSink::new(&prefix, DataKind::Binary).unwrap();

        let written = build_map(&dataset, &settings(), sink, &ProgressBar::hidden()).unwrap();

        let counts: Vec<_> = written.iter().map(|tile| tile.points).collect();
        assert_eq!(counts, vec![101, 100, 49]);
        assert_eq!(written[2].path, dir.path().join("out").join("map_02.pcd"));

        let mut frame = 0;
        for tile in &written {
            for point in read_tile(&tile.path) {
                assert_abs_diff_eq!(point.x, frame as f32 + 1.0);
                assert_eq!(point.y, 1.0);
                assert_eq!(point.z, 1.0);
                assert_eq!(point.intensity, 127.5);
                assert_eq!(point.color(), [0, 0, 0]);
                frame += 1;
            }
        }
        assert_eq!(frame, 250);
    }

    #[test]
    fn repeated_runs_write_identical_tiles() {
        let dir = TempDir::new().unwrap();
        let dataset = shifting_dataset(dir.path(), 120);

        let run = |name: &str| {
            let sink = PcdTileSink::new(dir.path().join(name).join("t"), DataKind::Binary).unwrap();
            build_map(&dataset, &settings(), sink, &ProgressBar::hidden()).unwrap()
        };
        let first = run("a");
        let second = run("b");

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(fs::read(&a.path).unwrap(), fs::read(&b.path).unwrap());
        }
    }

    #[test]
    fn calibration_index_selects_the_entry() {
        let dir = TempDir::new().unwrap();
        let base = shifting_dataset(dir.path(), 3);

        let mut shifted = Matrix3x4::identity();
        shifted[(2, 3)] = 5.0;
        let calibrations = vec![
            base.calibrations()[0].clone(),
            Calibration::from_projection("Tr", shifted).unwrap(),
        ];
        let dataset = Dataset::new(
            base.times().to_vec(),
            base.poses().to_vec(),
            calibrations,
            base.scans().to_vec(),
        );

        let mut sink = MemorySink::default();
        let settings = MapSettings {
            calib_index: 1,
            ..Default::default()
        };
        build_map(&dataset, &settings, &mut sink, &ProgressBar::hidden()).unwrap();

        assert_eq!(sink.tiles.len(), 1);
        assert!(sink.tiles[0].1.iter().all(|point| point.z == 6.0));
    }

    #[test]
    fn missing_calibration_fails_before_writing() {
        let dir = TempDir::new().unwrap();
        let dataset = shifting_dataset(dir.path(), 3);

        let mut sink = MemorySink::default();
        let err = build_map(
            &dataset,
            &MapSettings::default(),
            &mut sink,
            &ProgressBar::hidden(),
        )
        .unwrap_err();

        assert!(matches!(err, Error::Index { table: "calibration", index: 4, len: 1 }));
        assert!(sink.tiles.is_empty());
    }

    #[test]
    fn short_pose_table_stops_at_the_missing_frame() {
        let dir = TempDir::new().unwrap();
        let base = shifting_dataset(dir.path(), 150);
        let dataset = Dataset::new(
            base.times().to_vec(),
            base.poses()[..120].to_vec(),
            base.calibrations().to_vec(),
            base.scans().to_vec(),
        );

        let mut sink = MemorySink::default();
        let err = build_map(&dataset, &settings(), &mut sink, &ProgressBar::hidden()).unwrap_err();

        assert!(matches!(err, Error::Index { table: "pose", index: 120, .. }));
        // The tile flushed at frame 100 survives the failure.
        assert_eq!(sink.tiles.len(), 1);
        assert_eq!(sink.tiles[0].1.len(), 101);
    }

    #[test]
    fn empty_dataset_writes_nothing() {
        let dataset = Dataset::new(
            vec![],
            vec![],
            vec![Calibration::from_projection("Tr", Matrix3x4::identity()).unwrap()],
            vec![],
        );

        let mut sink = MemorySink::default();
        let written = build_map(&dataset, &settings(), &mut sink, &ProgressBar::hidden()).unwrap();
        assert!(written.is_empty());
        assert!(sink.tiles.is_empty());
    }
}
