use crate::{types::TileFormat, utils::guess_tile_format};
use eyre::{eyre, Result};
use std::path::Path;

pub fn info(file: impl AsRef<Path>) -> Result<()> {
    let file = file.as_ref();

    let format = guess_tile_format(file).ok_or_else(|| {
        eyre!(
            "file name must end with '.pcd' or '.las', but get '{}'",
            file.display()
        )
    })?;

    match format {
        TileFormat::Pcd => pcd_info(file),
        TileFormat::Las => las_info(file),
    }
}

fn pcd_info(file: &Path) -> Result<()> {
    let reader = pcd_rs::DynReader::open(file)?;
    let meta = reader.meta();

    println!("points\t{}", meta.num_points);
    println!("name\ttype\tcount");
    meta.field_defs.iter().for_each(|field| {
        let pcd_rs::FieldDef {
            ref name,
            kind,
            count,
        } = *field;

        println!("{}\t{:?}\t{}", name, kind, count);
    });

    Ok(())
}

fn las_info(file: &Path) -> Result<()> {
    let reader = las::Reader::from_path(file)?;
    let header = reader.header();
    let las::Bounds { min, max } = header.bounds();

    println!("points\t{}", header.number_of_points());
    println!("format\t{:?}", header.point_format());
    println!("min\t{} {} {}", min.x, min.y, min.z);
    println!("max\t{} {} {}", max.x, max.y, max.z);

    Ok(())
}
