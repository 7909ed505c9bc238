//! Record types shared by the KITTI mapping tools.
//!
//! [BinPoint] is the raw velodyne scan record, [WorldPoint] is a point after
//! it has been moved into the world frame, and [MapPoint] is the PCD record a
//! world point is stored as.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use pcd_rs::{PcdDeserialize, PcdSerialize};
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};

/// One record of a velodyne `.bin` scan: four little-endian `f32`s, no header.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub intensity: f32,
}

impl BinPoint {
    /// Size of one record in bytes.
    pub const SIZE: usize = 16;

    pub fn read_from<R>(reader: &mut R) -> io::Result<Self>
    where
        R: Read,
    {
        let x = reader.read_f32::<LittleEndian>()?;
        let y = reader.read_f32::<LittleEndian>()?;
        let z = reader.read_f32::<LittleEndian>()?;
        let intensity = reader.read_f32::<LittleEndian>()?;
        Ok(Self { x, y, z, intensity })
    }

    pub fn write_to<W>(&self, writer: &mut W) -> io::Result<()>
    where
        W: Write,
    {
        let Self { x, y, z, intensity } = *self;
        for val in [x, y, z, intensity] {
            writer.write_f32::<LittleEndian>(val)?;
        }
        Ok(())
    }
}

/// A point in the global world frame.
///
/// Intensity is on the `[0, 255]` scale. The colour channels exist for
/// compatibility with RGB point-cloud consumers and are zero for lidar-only
/// maps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub intensity: f32,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// The PCD record of a map tile: `x y z intensity rgb`, colour packed as
/// `0x00RRGGBB` the way libpcl does.
#[derive(Debug, Clone, Copy, PartialEq, PcdSerialize, PcdDeserialize, Serialize, Deserialize)]
pub struct MapPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub intensity: f32,
    pub rgb: u32,
}

impl MapPoint {
    pub fn color(&self) -> [u8; 3] {
        let [_, r, g, b] = self.rgb.to_be_bytes();
        [r, g, b]
    }
}

impl From<&WorldPoint> for MapPoint {
    fn from(point: &WorldPoint) -> Self {
        let WorldPoint {
            x,
            y,
            z,
            intensity,
            r,
            g,
            b,
        } = *point;

        Self {
            x,
            y,
            z,
            intensity,
            rgb: u32::from_be_bytes([0, r, g, b]),
        }
    }
}

impl From<MapPoint> for WorldPoint {
    fn from(point: MapPoint) -> Self {
        let [r, g, b] = point.color();
        let MapPoint {
            x, y, z, intensity, ..
        } = point;

        Self {
            x,
            y,
            z,
            intensity,
            r,
            g,
            b,
        }
    }
}
