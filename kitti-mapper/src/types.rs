use clap::ValueEnum;
use nalgebra::Matrix3x4;
use pcd_rs::DataKind;

/// A frame pose `[R | t]` taking a point into the world frame.
pub type Pose = Matrix3x4<f64>;

/// How the output of the calibration projection is turned back into a
/// homogeneous point before the pose is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum)]
pub enum Homogenization {
    /// Append `1` to the projected 3-vector as is.
    #[default]
    Literal,
    /// Divide by the third component first, giving `(c0/c2, c1/c2, 1, 1)`.
    Divide,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum)]
pub enum TileFormat {
    #[default]
    Pcd,
    Las,
}

impl TileFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TileFormat::Pcd => "pcd",
            TileFormat::Las => "las",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum)]
pub enum PcdData {
    #[default]
    Binary,
    Ascii,
}

impl From<PcdData> for DataKind {
    fn from(data: PcdData) -> Self {
        match data {
            PcdData::Binary => DataKind::Binary,
            PcdData::Ascii => DataKind::Ascii,
        }
    }
}
