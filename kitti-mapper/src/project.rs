use crate::{
    calib::Calibration,
    error::{Error, Result},
    io::ScanReader,
    types::{Homogenization, Pose},
};
use kitti_format::{BinPoint, WorldPoint};
use nalgebra::{Matrix3x4, Vector3, Vector4};
use std::path::Path;

/// Moves scan points into the world frame: first through the projection
/// matrix of one calibration entry, then through the frame pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projector {
    projection: Matrix3x4<f64>,
    homogenization: Homogenization,
}

impl Projector {
    pub fn new(calibration: &Calibration, homogenization: Homogenization) -> Self {
        Self {
            projection: calibration.p,
            homogenization,
        }
    }

    pub fn project(&self, pose: &Pose, point: &BinPoint) -> WorldPoint {
        let BinPoint { x, y, z, intensity } = *point;

        let lidar = Vector4::new(x as f64, y as f64, z as f64, 1.0);
        let sensor: Vector3<f64> = self.projection * lidar;

        let sensor = match self.homogenization {
            Homogenization::Literal => sensor.push(1.0),
            Homogenization::Divide => Vector4::new(
                sensor.x / sensor.z,
                sensor.y / sensor.z,
                1.0,
                1.0,
            ),
        };
        let world: Vector3<f64> = pose * sensor;

        WorldPoint {
            x: world.x as f32,
            y: world.y as f32,
            z: world.z as f32,
            intensity: (intensity as f64 * 255.0) as f32,
            r: 0,
            g: 0,
            b: 0,
        }
    }

    /// Lazily project every whole record of a scan file with one pose.
    ///
    /// The file is opened here and read once as the iterator advances.
    pub fn project_scan<P>(
        &self,
        pose: &Pose,
        scan: P,
    ) -> Result<impl Iterator<Item = Result<WorldPoint>>>
    where
        P: AsRef<Path>,
    {
        let scan = scan.as_ref().to_path_buf();
        let reader = ScanReader::open(&scan).map_err(|source| Error::ScanRead {
            path: scan.clone(),
            source,
        })?;

        let projector = *self;
        let pose = *pose;
        Ok(reader.map(move |point| {
            let point = point.map_err(|source| Error::ScanRead {
                path: scan.clone(),
                source,
            })?;
            Ok(projector.project(&pose, &point))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::write_scan;
    use approx::assert_abs_diff_eq;
    use nalgebra::{Rotation3, Translation3};
    use std::{fs, io::Write};
    use tempfile::TempDir;

    fn calibration(p: Matrix3x4<f64>) -> Calibration {
        Calibration::from_projection("Tr", p).unwrap()
    }

    fn translation(x: f64, y: f64, z: f64) -> Pose {
        Translation3::new(x, y, z).to_homogeneous().fixed_view::<3, 4>(0, 0).into_owned()
    }

    const POINT: BinPoint = BinPoint {
        x: 1.0,
        y: 1.0,
        z: 1.0,
        intensity: 0.5,
    };

    #[test]
    fn identity_setup_only_translates() {
        let projector = Projector::new(&calibration(Matrix3x4::identity()), Homogenization::Literal);
        let world = projector.project(&translation(7.0, 0.0, 0.0), &POINT);

        assert_eq!([world.x, world.y, world.z], [8.0, 1.0, 1.0]);
        assert_eq!(world.intensity, 127.5);
        assert_eq!([world.r, world.g, world.b], [0, 0, 0]);
    }

    #[test]
    fn intensity_is_scaled_to_255() {
        let projector = Projector::new(&calibration(Matrix3x4::identity()), Homogenization::Literal);

        for val in [0.0f32, 0.1, 0.33, 0.75, 1.0] {
            let point = BinPoint {
                intensity: val,
                ..POINT
            };
            let world = projector.project(&Pose::identity(), &point);
            assert_abs_diff_eq!(world.intensity, val * 255.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn calibration_is_applied_before_the_pose() {
        // Rotate 90 degrees about z, then shift along x.
        let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), std::f64::consts::FRAC_PI_2);
        let mut p = Matrix3x4::zeros();
        p.fixed_view_mut::<3, 3>(0, 0).copy_from(rotation.matrix());
        p.set_column(3, &Vector3::new(0.0, 0.0, 2.0));

        let projector = Projector::new(&calibration(p), Homogenization::Literal);
        let point = BinPoint {
            x: 1.0,
            y: 0.0,
            z: 0.0,
            intensity: 0.0,
        };
        let world = projector.project(&translation(10.0, 0.0, 0.0), &point);

        assert_abs_diff_eq!(world.x, 10.0, epsilon = 1e-6);
        assert_abs_diff_eq!(world.y, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(world.z, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn literal_mode_keeps_the_third_component() {
        let mut p = Matrix3x4::identity();
        p[(2, 2)] = 2.0;

        let point = BinPoint {
            x: 2.0,
            y: 4.0,
            z: 1.0,
            intensity: 0.0,
        };

        let literal = Projector::new(&calibration(p), Homogenization::Literal)
            .project(&Pose::identity(), &point);
        assert_eq!([literal.x, literal.y, literal.z], [2.0, 4.0, 2.0]);

        let divide = Projector::new(&calibration(p), Homogenization::Divide)
            .project(&Pose::identity(), &point);
        assert_eq!([divide.x, divide.y, divide.z], [1.0, 2.0, 1.0]);
    }

    #[test]
    fn scan_projection_truncates_partial_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("000000.bin");
        write_scan(&path, &[POINT, POINT]).unwrap();
        let mut file = fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&[1u8; 15]).unwrap();
        drop(file);

        let projector = Projector::new(&calibration(Matrix3x4::identity()), Homogenization::Literal);
        let points: Vec<_> = projector
            .project_scan(&translation(1.0, 0.0, 0.0), &path)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(points.len(), 2);
        assert!(points.iter().all(|point| point.x == 2.0));
    }

    #[test]
    fn missing_scan_is_a_read_error() {
        let dir = TempDir::new().unwrap();
        let projector = Projector::new(&calibration(Matrix3x4::identity()), Homogenization::Literal);

        let result = projector.project_scan(&Pose::identity(), dir.path().join("000000.bin"));
        assert!(matches!(result, Err(Error::ScanRead { .. })));
    }
}
