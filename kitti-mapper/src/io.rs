use crate::{
    error::{Error, Result},
    utils::tile_path,
};
use kitti_format::{BinPoint, MapPoint, WorldPoint};
use pcd_rs::DataKind;
use std::{
    fs::{self, File},
    io::{self, prelude::*, BufReader},
    path::{Path, PathBuf},
};

/// Reads the whole records of a velodyne scan one at a time.
///
/// The record count is fixed when the reader is created from the byte length
/// of the input. Trailing bytes that do not fill a record are never read.
pub struct ScanReader<R> {
    input: R,
    remaining: u64,
}

impl ScanReader<BufReader<File>> {
    pub fn open<P>(path: P) -> io::Result<Self>
    where
        P: AsRef<Path>,
    {
        let file = File::open(path)?;
        let byte_len = file.metadata()?.len();
        Ok(Self::new(BufReader::new(file), byte_len))
    }
}

impl<R> ScanReader<R>
where
    R: Read,
{
    pub fn new(input: R, byte_len: u64) -> Self {
        Self {
            input,
            remaining: byte_len / BinPoint::SIZE as u64,
        }
    }

    /// Number of records not yet read.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

impl<R> Iterator for ScanReader<R>
where
    R: Read,
{
    type Item = io::Result<BinPoint>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(BinPoint::read_from(&mut self.input))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

/// Destination of the finished map tiles.
pub trait TileSink {
    /// Store one complete tile and return where it went.
    fn write_tile(&mut self, index: usize, points: &[WorldPoint]) -> Result<PathBuf>;
}

impl<S> TileSink for &mut S
where
    S: TileSink + ?Sized,
{
    fn write_tile(&mut self, index: usize, points: &[WorldPoint]) -> Result<PathBuf> {
        (**self).write_tile(index, points)
    }
}

/// Writes each tile as a standalone `<prefix><index:02>.pcd`.
#[derive(Debug, Clone)]
pub struct PcdTileSink {
    prefix: PathBuf,
    data_kind: DataKind,
}

impl PcdTileSink {
    pub fn new(prefix: impl Into<PathBuf>, data_kind: DataKind) -> Result<Self> {
        let prefix = prefix.into();
        create_parent_dir(&prefix)?;
        Ok(Self { prefix, data_kind })
    }
}

impl TileSink for PcdTileSink {
    fn write_tile(&mut self, index: usize, points: &[WorldPoint]) -> Result<PathBuf> {
        let pcd_file = tile_path(&self.prefix, index, "pcd");
        create_pcd_file(points, &pcd_file, self.data_kind)
            .map_err(|err| Error::tile_write(&pcd_file, err))?;
        Ok(pcd_file)
    }
}

fn create_pcd_file(
    points: &[WorldPoint],
    pcd_file: &Path,
    data_kind: DataKind,
) -> Result<(), pcd_rs::Error> {
    let mut writer = pcd_rs::WriterInit {
        width: points.len() as u64,
        height: 1,
        viewpoint: Default::default(),
        data_kind,
        schema: None,
    }
    .create(pcd_file)?;

    points
        .iter()
        .map(MapPoint::from)
        .try_for_each(|point| writer.push(&point))?;
    writer.finish()?;

    Ok(())
}

/// Writes each tile as a standalone LAS 1.2 file with point format 2
/// (`<prefix><index:02>.las`).
#[derive(Debug, Clone)]
pub struct LasTileSink {
    prefix: PathBuf,
}

impl LasTileSink {
    pub fn new(prefix: impl Into<PathBuf>) -> Result<Self> {
        let prefix = prefix.into();
        create_parent_dir(&prefix)?;
        Ok(Self { prefix })
    }
}

impl TileSink for LasTileSink {
    fn write_tile(&mut self, index: usize, points: &[WorldPoint]) -> Result<PathBuf> {
        let las_file = tile_path(&self.prefix, index, "las");
        create_las_file(points, &las_file).map_err(|err| Error::tile_write(&las_file, err))?;
        Ok(las_file)
    }
}

fn create_las_file(points: &[WorldPoint], las_file: &Path) -> Result<(), las::Error> {
    let mut builder = las::Builder::from((1, 2));
    builder.point_format = las::point::Format::new(2)?;
    let header = builder.into_header()?;

    let mut writer = las::Writer::from_path(las_file, header)?;
    for point in points {
        let WorldPoint {
            x,
            y,
            z,
            intensity,
            r,
            g,
            b,
        } = *point;

        let point = las::Point {
            x: x as f64,
            y: y as f64,
            z: z as f64,
            intensity: intensity.round() as u16,
            color: Some(las::Color::new(r as u16, g as u16, b as u16)),
            ..Default::default()
        };
        writer.write_point(point)?;
    }
    writer.close()?;

    Ok(())
}

fn create_parent_dir(prefix: &Path) -> Result<()> {
    match prefix.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).map_err(|err| Error::tile_write(dir, err))
        }
        _ => Ok(()),
    }
}

/// Keeps tiles in memory, for tests of the tiling logic.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemorySink {
    pub tiles: Vec<(usize, Vec<WorldPoint>)>,
}

#[cfg(test)]
impl TileSink for MemorySink {
    fn write_tile(&mut self, index: usize, points: &[WorldPoint]) -> Result<PathBuf> {
        self.tiles.push((index, points.to_vec()));
        Ok(PathBuf::from(format!("memory/{index:02}")))
    }
}

#[cfg(test)]
pub fn write_scan<P>(path: P, points: &[BinPoint]) -> io::Result<()>
where
    P: AsRef<Path>,
{
    let mut writer = io::BufWriter::new(File::create(path)?);
    for point in points {
        point.write_to(&mut writer)?;
    }
    writer.flush()
}
