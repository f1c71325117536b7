use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use somaviz::options::Options;
use somaviz::sensor::{ReaderSource, SensorSource, SimulatedSource};

struct Args {
    options_path: Option<PathBuf>,
    replay_path: Option<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        options_path: None,
        replay_path: None,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--options" => {
                let path = iter
                    .next()
                    .ok_or("--options requires a path".to_owned())?;
                args.options_path = Some(PathBuf::from(path));
            }
            "--replay" => {
                let path = iter
                    .next()
                    .ok_or("--replay requires a path".to_owned())?;
                args.replay_path = Some(PathBuf::from(path));
            }
            other => {
                return Err(format!(
                    "unknown argument {other:?}\n\
                     Usage: somaviz [--options <file.toml>] \
                     [--replay <recording.txt>]"
                ));
            }
        }
    }
    Ok(args)
}

fn main() {
    env_logger::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };

    let options = match &args.options_path {
        Some(path) => match Options::load(path) {
            Ok(options) => options,
            Err(e) => {
                log::error!("failed to load {}: {e}", path.display());
                std::process::exit(1);
            }
        },
        None => Options::default(),
    };

    let source: Box<dyn SensorSource> = match &args.replay_path {
        Some(path) => match File::open(path) {
            Ok(file) => {
                log::info!("replaying sensor data from {}", path.display());
                Box::new(ReaderSource::new(
                    BufReader::new(file),
                    options.sensor.count,
                ))
            }
            Err(e) => {
                log::error!("failed to open {}: {e}", path.display());
                std::process::exit(1);
            }
        },
        None => {
            log::info!("no replay file given, simulating sensor data");
            Box::new(SimulatedSource::new(
                options.sensor.count,
                options.sensor.max_value,
            ))
        }
    };

    if let Err(e) = somaviz::viewer::run(options, source) {
        log::error!("{e}");
        std::process::exit(1);
    }
}
