use crate::{
    dataset::Dataset,
    io::{LasTileSink, PcdTileSink},
    mapping::{build_map, MapSettings},
    opts::Map,
    types::TileFormat,
};
use eyre::{Result, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

pub fn map(args: Map) -> Result<()> {
    let Map {
        dataset,
        output,
        calib_index,
        frames_per_tile,
        homogenization,
        format,
        pcd_data,
    } = args;

    let paths = dataset.paths()?;
    let dataset = Dataset::load(&paths).wrap_err_with(|| {
        format!(
            "failed to load the sequence at '{}'",
            paths.velodyne_dir.display()
        )
    })?;

    let settings = MapSettings {
        calib_index,
        frames_per_tile,
        homogenization,
    };

    let progress = ProgressBar::new(dataset.frame_count() as u64);
    progress.set_style(
        ProgressStyle::with_template("[{bar:40.cyan/blue}] {pos}/{len} frames ({percent}%) {msg}")?
            .progress_chars("▉▊▋▌▍▎▏ "),
    );

    let written = match format {
        TileFormat::Pcd => {
            let sink = PcdTileSink::new(&output, pcd_data.into())?;
            build_map(&dataset, &settings, sink, &progress)
        }
        TileFormat::Las => {
            let sink = LasTileSink::new(&output)?;
            build_map(&dataset, &settings, sink, &progress)
        }
    };
    let written = written
        .inspect_err(|_| progress.abandon())
        .wrap_err_with(|| {
            format!(
                "mapping stopped, tiles written so far are under '{}'",
                output.display()
            )
        })?;

    let points: usize = written.iter().map(|tile| tile.points).sum();
    info!("{} tiles, {points} points in total", written.len());

    println!("tile\tpoints\tpath");
    for tile in &written {
        println!("{:02}\t{}\t{}", tile.index, tile.points, tile.path.display());
    }

    Ok(())
}
