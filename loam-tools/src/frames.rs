use std::{
    fs::{read_dir, File},
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{anyhow, bail, Context, Result};
use itertools::Itertools;
use loam_core::{containers::PointCloud, point::RawPoint};

/// One raw message of the sensor
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Timestamp in seconds
    pub stamp: f64,
    pub cloud: PointCloud<RawPoint>,
}

fn parse_value<T: FromStr>(value: &str, line_number: usize) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse::<T>()
        .with_context(|| format!("Could not parse '{}' in line {}", value, line_number))
}

/// Parses a frame from ASCII data. The first line that is neither empty nor a comment (starting with `#`)
/// must be `stamp <seconds>`, every following one holds the `x y z` coordinates of a single point in
/// sensor-native axes.
pub fn parse_frame<R: BufRead>(read: R) -> Result<Frame> {
    let mut stamp = None;
    let mut cloud = PointCloud::new();

    for (index, line) in read.lines().enumerate() {
        let line_number = index + 1;
        let line = line.with_context(|| format!("Could not read line {}", line_number))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if stamp.is_none() {
            match line.split_whitespace().collect_tuple::<(&str, &str)>() {
                Some(("stamp", value)) => stamp = Some(parse_value::<f64>(value, line_number)?),
                _ => bail!(
                    "Expected 'stamp <seconds>' in line {} but got '{}'",
                    line_number,
                    line
                ),
            }
            continue;
        }

        let (x, y, z) = line
            .split_whitespace()
            .collect_tuple::<(&str, &str, &str)>()
            .ok_or_else(|| {
                anyhow!(
                    "Expected three coordinates in line {} but got '{}'",
                    line_number,
                    line
                )
            })?;
        cloud.push(RawPoint::new(
            parse_value(x, line_number)?,
            parse_value(y, line_number)?,
            parse_value(z, line_number)?,
        ));
    }

    let stamp = stamp.ok_or_else(|| anyhow!("Frame has no timestamp"))?;
    Ok(Frame { stamp, cloud })
}

/// Reads a single frame file
pub fn read_frame_file(path: &Path) -> Result<Frame> {
    let file = File::open(path).with_context(|| format!("Could not open {}", path.display()))?;
    parse_frame(BufReader::new(file)).with_context(|| format!("Invalid frame {}", path.display()))
}

/// Returns all files in `dir` (non-recursively), ordered by file name
pub fn list_frame_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        bail!("Input path {} is no directory!", dir.display());
    }
    let mut files = vec![];
    for entry in read_dir(dir).with_context(|| format!("Could not read {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    Ok(files
        .into_iter()
        .sorted_by_key(|path| path.file_name().map(|name| name.to_owned()))
        .collect())
}
