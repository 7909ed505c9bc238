use crate::types::TileFormat;
use std::path::{Path, PathBuf};

/// `<prefix><index:02>.<extension>`. The prefix is joined as text, so
/// `maps/seq00_` gives `maps/seq00_07.pcd`.
pub fn tile_path<P>(prefix: P, index: usize, extension: &str) -> PathBuf
where
    P: AsRef<Path>,
{
    let mut name = prefix.as_ref().as_os_str().to_owned();
    name.push(format!("{index:02}.{extension}"));
    PathBuf::from(name)
}

pub fn guess_tile_format<P>(file: P) -> Option<TileFormat>
where
    P: AsRef<Path>,
{
    let file = file.as_ref();
    let file_name = file.file_name()?.to_str()?;

    let format = if file_name.ends_with(".pcd") {
        TileFormat::Pcd
    } else if file_name.ends_with(".las") {
        TileFormat::Las
    } else {
        return None;
    };

    Some(format)
}
