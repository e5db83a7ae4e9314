#![warn(clippy::all)]

use std::{fs::File, io::BufReader, path::PathBuf, time::Instant};

use anyhow::{anyhow, Context, Result};
use clap::{App, Arg};
use log::info;
use loam_algorithms::{params::RegistrationParams, registration::ScanRegistration};
use loam_tools::{
    frames::{list_frame_files, read_frame_file},
    writer::{FeatureWriter, OutputFormat},
};

struct Args {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub params: RegistrationParams,
    pub format: OutputFormat,
}

fn read_params(path: &str) -> Result<RegistrationParams> {
    let file = File::open(path).with_context(|| format!("Could not open config file {}", path))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Invalid config file {}", path))
}

fn get_args() -> Result<Args> {
    let matches = App::new("loam extract_features")
        .version("0.1")
        .about("Extracts corner and surface features from the frames of a continuously rotating 2D laser scanner")
        .arg(
            Arg::with_name("INPUT")
                .short("i")
                .long("input")
                .takes_value(true)
                .value_name("INPUT")
                .help("Input directory. Every file is one frame, frames are processed in file name order")
                .required(true),
        )
        .arg(
            Arg::with_name("OUTPUT")
                .short("o")
                .long("output")
                .takes_value(true)
                .value_name("OUTPUT")
                .help("Output directory")
                .required(true),
        )
        .arg(
            Arg::with_name("CONFIG")
                .short("c")
                .long("config")
                .takes_value(true)
                .value_name("CONFIG")
                .help("JSON file with the registration parameters. Missing parameters keep their default value"),
        )
        .arg(
            Arg::with_name("BINARY")
                .long("binary")
                .help("Write the raw point records instead of ASCII files"),
        )
        .get_matches();

    let input_dir: PathBuf = matches
        .value_of("INPUT")
        .ok_or_else(|| anyhow!("Missing input directory"))?
        .into();
    let output_dir: PathBuf = matches
        .value_of("OUTPUT")
        .ok_or_else(|| anyhow!("Missing output directory"))?
        .into();
    if !output_dir.exists() {
        std::fs::create_dir_all(&output_dir)?;
    }

    let params = match matches.value_of("CONFIG") {
        Some(path) => read_params(path)?,
        None => RegistrationParams::default(),
    };
    let format = if matches.is_present("BINARY") {
        OutputFormat::Binary
    } else {
        OutputFormat::Ascii
    };

    Ok(Args {
        input_dir,
        output_dir,
        params,
        format,
    })
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    let args = get_args()?;
    let frame_files = list_frame_files(&args.input_dir)?;
    info!("Processing {} frames", frame_files.len());

    let mut registration = ScanRegistration::new(args.params)?;
    let writer = FeatureWriter::new(&args.output_dir, args.format);
    let t_start = Instant::now();
    let mut processed = 0;

    for file in frame_files.iter() {
        let frame = read_frame_file(file)?;
        let features = match registration.handle_cloud_message(&frame.cloud, frame.stamp) {
            Some(features) => features,
            None => continue,
        };

        let frame_name = file
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| anyhow!("Invalid frame file name {}", file.display()))?;
        let frame_dir = writer.write(frame_name, &features)?;
        processed += 1;

        info!(
            "{}: {} points, {} sharp, {} less sharp, {} flat, {} less flat, written to {}",
            frame_name,
            features.full_scan.len(),
            features.corner_sharp.len(),
            features.corner_less_sharp.len(),
            features.surface_flat.len(),
            features.surface_less_flat.len(),
            frame_dir.display()
        );
    }

    info!(
        "Processed {} of {} frames in {:.2}s",
        processed,
        frame_files.len(),
        t_start.elapsed().as_secs_f64()
    );

    Ok(())
}
