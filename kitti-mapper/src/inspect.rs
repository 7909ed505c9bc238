use crate::{dataset::Dataset, opts::Inspect};
use eyre::{Result, WrapErr};

pub fn inspect(args: Inspect) -> Result<()> {
    let Inspect { dataset, json } = args;

    let paths = dataset.paths()?;
    let dataset = Dataset::load(&paths).wrap_err("failed to load the sequence")?;
    let summary = dataset.summary();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("frames\t{}", summary.frames);
    if let (Some(first), Some(last)) = (dataset.scans().first(), dataset.scans().last()) {
        println!("scans\t{} .. {}", first.display(), last.display());
    }
    println!("poses\t{}", summary.poses);
    match summary.time_span {
        Some([first, last]) => println!(
            "times\t{} ({first:.6}s .. {last:.6}s)",
            summary.timestamps
        ),
        None => println!("times\t0"),
    }

    for (index, calibration) in dataset.calibrations().iter().enumerate() {
        println!();
        println!("calibration {index}: {}", calibration.label);
        println!("P ={}", calibration.p);
        println!("K ={}", calibration.k);
        println!("R ={}", calibration.r);
        println!("t = [{}, {}]", calibration.t.x, calibration.t.y);
    }

    Ok(())
}
