//! Loaders for the line-oriented text files of a KITTI sequence.
//!
//! An input that cannot be read loads as an empty table and a warning is
//! logged. Blank lines are skipped. Any other malformed line aborts the load.

use crate::{
    calib::Calibration,
    error::{Error, Result},
    types::Pose,
};
use nalgebra::Matrix3x4;
use std::{fs, path::Path};
use tracing::{debug, warn};

/// Load `times.txt`: one timestamp in seconds per line.
pub fn load_times<P>(path: P) -> Result<Vec<f64>>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let Some(text) = read_table(path, "timestamp") else {
        return Ok(vec![]);
    };

    let times: Vec<f64> = records(&text)
        .map(|(line, tokens)| match tokens.as_slice() {
            [token] => parse_number(path, line, token),
            _ => Err(Error::format(
                path,
                line,
                format!("expect 1 timestamp, but found {} tokens", tokens.len()),
            )),
        })
        .collect::<Result<_>>()?;

    debug!("loaded {} timestamps from {}", times.len(), path.display());
    Ok(times)
}

/// Load a pose file: 12 numbers per line, the row-major 3x4 matrix `[R | t]`.
pub fn load_poses<P>(path: P) -> Result<Vec<Pose>>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let Some(text) = read_table(path, "pose") else {
        return Ok(vec![]);
    };

    let poses: Vec<Pose> = records(&text)
        .map(|(line, tokens)| parse_matrix3x4(path, line, &tokens))
        .collect::<Result<_>>()?;

    debug!("loaded {} poses from {}", poses.len(), path.display());
    Ok(poses)
}

/// Load `calib.txt`: a sensor label followed by the row-major 3x4
/// projection matrix on each line.
pub fn load_calibrations<P>(path: P) -> Result<Vec<Calibration>>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let Some(text) = read_table(path, "calibration") else {
        return Ok(vec![]);
    };

    let calibrations: Vec<Calibration> = records(&text)
        .map(|(line, tokens)| {
            let (label, values) = tokens
                .split_first()
                .ok_or_else(|| Error::format(path, line, "missing sensor label"))?;
            let label = label.trim_end_matches(':');
            let p = parse_matrix3x4(path, line, values)?;

            Calibration::from_projection(label, p).map_err(|reason| Error::Calibration {
                path: path.to_path_buf(),
                line,
                label: label.to_string(),
                reason,
            })
        })
        .collect::<Result<_>>()?;

    debug!(
        "loaded {} calibration entries from {}",
        calibrations.len(),
        path.display()
    );
    Ok(calibrations)
}

fn read_table(path: &Path, table: &str) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(err) => {
            warn!(
                "unable to read {table} file '{}' ({err}), using an empty table",
                path.display()
            );
            None
        }
    }
}

/// Non-blank lines with their 1-based line numbers, split on whitespace.
fn records(text: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
    text.lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.split_whitespace().collect::<Vec<_>>()))
        .filter(|(_, tokens)| !tokens.is_empty())
}

fn parse_number(path: &Path, line: usize, token: &str) -> Result<f64> {
    token
        .parse()
        .map_err(|_| Error::format(path, line, format!("'{token}' is not a number")))
}

fn parse_matrix3x4(path: &Path, line: usize, tokens: &[&str]) -> Result<Matrix3x4<f64>> {
    if tokens.len() != 12 {
        return Err(Error::format(
            path,
            line,
            format!("expect 12 matrix entries, but found {}", tokens.len()),
        ));
    }

    let values: Vec<f64> = tokens
        .iter()
        .map(|token| parse_number(path, line, token))
        .collect::<Result<_>>()?;
    Ok(Matrix3x4::from_row_slice(&values))
}
