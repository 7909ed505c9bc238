use approx::abs_diff_eq;
use nalgebra::{Matrix3, Matrix3x4, Vector2, Vector3, Vector4};
use serde::Serialize;

/// One sensor line of a KITTI `calib.txt`.
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    pub label: String,
    /// The 3x4 matrix every scan point is mapped through.
    pub p: Matrix3x4<f64>,
    pub k: Matrix3<f64>,
    pub r: Matrix3<f64>,
    /// `(T0 / T3, T1 / T2 / T3)` of the homogeneous camera centre `T`.
    pub t: Vector2<f64>,
}

impl Calibration {
    pub fn from_projection(
        label: impl Into<String>,
        p: Matrix3x4<f64>,
    ) -> Result<Self, &'static str> {
        let Decomposition { k, r, center } = decompose_projection(&p)?;
        let t = Vector2::new(center[0] / center[3], center[1] / center[2] / center[3]);

        Ok(Self {
            label: label.into(),
            p,
            k,
            r,
            t,
        })
    }

    pub fn summary(&self) -> CalibrationSummary {
        CalibrationSummary {
            label: self.label.clone(),
            p: rows(&self.p),
            k: rows(&self.k),
            r: rows(&self.r),
            t: [self.t.x, self.t.y],
        }
    }
}

/// Plain-array view of a [Calibration] for printing.
#[derive(Debug, Clone, Serialize)]
pub struct CalibrationSummary {
    pub label: String,
    pub p: Vec<Vec<f64>>,
    pub k: Vec<Vec<f64>>,
    pub r: Vec<Vec<f64>>,
    pub t: [f64; 2],
}

fn rows<const R: usize, const C: usize>(
    matrix: &nalgebra::SMatrix<f64, R, C>,
) -> Vec<Vec<f64>> {
    matrix
        .row_iter()
        .map(|row| row.iter().copied().collect())
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    /// Upper triangular, positive on the first two diagonal entries.
    pub k: Matrix3<f64>,
    /// Proper rotation with `k * r` equal to the left 3x3 block of `P`.
    pub r: Matrix3<f64>,
    /// Unit-norm homogeneous null vector of `P` with a positive last entry.
    pub center: Vector4<f64>,
}

pub fn decompose_projection(p: &Matrix3x4<f64>) -> Result<Decomposition, &'static str> {
    if p.iter().any(|val| !val.is_finite()) {
        return Err("the projection matrix has non-finite entries");
    }

    let m: Matrix3<f64> = p.fixed_view::<3, 3>(0, 0).into_owned();
    let p4: Vector3<f64> = p.column(3).into_owned();

    let det = m.determinant();
    if abs_diff_eq!(det, 0.0, epsilon = 1e-12) {
        return Err("the left 3x3 block is singular");
    }
    let m_inv = m
        .try_inverse()
        .ok_or("the left 3x3 block is singular")?;

    let c = -(m_inv * p4);
    let center = Vector4::new(c.x, c.y, c.z, 1.0).normalize();

    let (k, r) = rq_decompose(&m);
    Ok(Decomposition { k, r, center })
}

/// RQ decomposition by three Givens rotations, zeroing `m[2][1]`, `m[2][0]`
/// and `m[1][0]` in that order.
fn rq_decompose(m: &Matrix3<f64>) -> (Matrix3<f64>, Matrix3<f64>) {
    let givens = |s: f64, c: f64| {
        let z = 1.0 / (c * c + s * s + f64::EPSILON).sqrt();
        (s * z, c * z)
    };

    let (s, c) = givens(m[(2, 1)], m[(2, 2)]);
    #[rustfmt::skip]
    let qx = Matrix3::new(
        1.0, 0.0, 0.0,
        0.0,   c,   s,
        0.0,  -s,   c,
    );
    let m1 = m * qx;

    let (s, c) = givens(-m1[(2, 0)], m1[(2, 2)]);
    #[rustfmt::skip]
    let qy = Matrix3::new(
          c, 0.0,  -s,
        0.0, 1.0, 0.0,
          s, 0.0,   c,
    );
    let m2 = m1 * qy;

    let (s, c) = givens(m2[(1, 0)], m2[(1, 1)]);
    #[rustfmt::skip]
    let qz = Matrix3::new(
          c,   s, 0.0,
         -s,   c, 0.0,
        0.0, 0.0, 1.0,
    );
    let upper = m2 * qz;

    // Rotate by 180 degrees so that the first two diagonal entries are
    // positive. The last one keeps the sign of det(m).
    let flip = match (upper[(0, 0)] < 0.0, upper[(1, 1)] < 0.0) {
        (true, true) => Matrix3::from_diagonal(&Vector3::new(-1.0, -1.0, 1.0)),
        (true, false) => Matrix3::from_diagonal(&Vector3::new(-1.0, 1.0, -1.0)),
        (false, true) => Matrix3::from_diagonal(&Vector3::new(1.0, -1.0, -1.0)),
        (false, false) => Matrix3::identity(),
    };

    let q = qz.transpose() * qy.transpose() * qx.transpose();
    (upper * flip, flip * q)
}
