use crate::{error::Result, io::TileSink};
use kitti_format::WorldPoint;
use std::{mem, path::PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenTile {
    pub index: usize,
    pub path: PathBuf,
    pub points: usize,
}

/// Collects world points frame by frame and hands a tile to the sink every
/// `frames_per_tile` frames.
///
/// A flush happens after frame `f` when `f != 0 && f % frames_per_tile == 0`,
/// so the first tile also holds frame 0. Whatever is left is flushed by
/// [TileAccumulator::finish].
pub struct TileAccumulator<S> {
    sink: S,
    frames_per_tile: usize,
    buffer: Vec<WorldPoint>,
    written: Vec<WrittenTile>,
}

impl<S> TileAccumulator<S>
where
    S: TileSink,
{
    /// `frames_per_tile` must be non-zero.
    pub fn new(sink: S, frames_per_tile: usize) -> Self {
        assert!(frames_per_tile > 0, "frames_per_tile must be positive");

        Self {
            sink,
            frames_per_tile,
            buffer: vec![],
            written: vec![],
        }
    }

    /// Append the points of `frame`, then flush if the frame closes a tile.
    ///
    /// Frames must be pushed in increasing order starting at 0.
    pub fn push_frame<I>(&mut self, frame: usize, points: I) -> Result<usize>
    where
        I: IntoIterator<Item = Result<WorldPoint>>,
    {
        let before = self.buffer.len();
        for point in points {
            self.buffer.push(point?);
        }
        let added = self.buffer.len() - before;

        if frame != 0 && frame % self.frames_per_tile == 0 {
            self.flush()?;
        }

        Ok(added)
    }

    /// Points waiting for the next flush.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Flush the remaining points, if any, and list every tile written.
    pub fn finish(mut self) -> Result<Vec<WrittenTile>> {
        if !self.buffer.is_empty() {
            self.flush()?;
        }
        Ok(self.written)
    }

    fn flush(&mut self) -> Result<()> {
        let index = self.written.len();
        let points = mem::take(&mut self.buffer);
        let path = self.sink.write_tile(index, &points)?;

        info!("wrote tile {index:02} with {} points to {}", points.len(), path.display());
        self.written.push(WrittenTile {
            index,
            path,
            points: points.len(),
        });
        Ok(())
    }
}
