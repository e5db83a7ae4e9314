use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use loam_algorithms::publisher::ScanFeatures;
use loam_core::{containers::PointCloud, point::ScanPoint};

/// File format of the written clouds
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OutputFormat {
    /// One `x y z intensity` line per point
    Ascii,
    /// The raw memory of the points: four `f32` values per point in native byte order
    Binary,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Ascii => "txt",
            OutputFormat::Binary => "bin",
        }
    }
}

fn write_cloud<W: Write>(
    cloud: &PointCloud<ScanPoint>,
    format: OutputFormat,
    mut writer: W,
) -> Result<()> {
    match format {
        OutputFormat::Ascii => {
            for point in cloud.iter() {
                writeln!(
                    writer,
                    "{} {} {} {}",
                    point.position.x, point.position.y, point.position.z, point.intensity
                )?;
            }
        }
        OutputFormat::Binary => writer.write_all(cloud.as_bytes())?,
    }
    writer.flush()?;
    Ok(())
}

/// Writes the clouds of every processed frame into a directory of its own below `output_dir`
pub struct FeatureWriter {
    output_dir: PathBuf,
    format: OutputFormat,
}

impl FeatureWriter {
    pub fn new<P: AsRef<Path>>(output_dir: P, format: OutputFormat) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_owned(),
            format,
        }
    }

    /// Writes all clouds of `features` into `<output_dir>/<frame_name>/` and returns that directory
    pub fn write(&self, frame_name: &str, features: &ScanFeatures) -> Result<PathBuf> {
        let frame_dir = self.output_dir.join(frame_name);
        std::fs::create_dir_all(&frame_dir)
            .with_context(|| format!("Could not create directory {}", frame_dir.display()))?;

        for (name, cloud) in features.named_clouds().iter() {
            let path = frame_dir.join(format!("{}.{}", name, self.format.extension()));
            let file = File::create(&path)
                .with_context(|| format!("Could not create {}", path.display()))?;
            write_cloud(cloud, self.format, BufWriter::new(file))
                .with_context(|| format!("Could not write {}", path.display()))?;
        }
        Ok(frame_dir)
    }
}
