//! oledpack CLI - turn a directory of frames into a firmware header.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process;

use oledpack::{
    BitstreamEmitter, CHeaderEmitter, EncodedStream, EncoderConfig, ImageSequence, Progress,
    Transcoder,
};

fn usage(program: &str) -> ! {
    eprintln!("Usage: {program} <config.json> <frames-dir> <header-name>");
    eprintln!("       {program} --example");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  config.json  Encoder configuration");
    eprintln!("  frames-dir   Directory of still frames, played in file name order");
    eprintln!("  header-name  Array name; the header is written to <header-name>.h");
    process::exit(1);
}

fn main() {
    pretty_env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("--example") {
        match serde_json::to_string_pretty(&EncoderConfig::default()) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing config: {e}");
                process::exit(1);
            }
        }
        return;
    }
    if args.len() != 4 {
        usage(args.first().map(String::as_str).unwrap_or("oledpack"));
    }

    let config_str = fs::read_to_string(&args[1]).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {e}");
        process::exit(1);
    });
    let config: EncoderConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {e}");
        process::exit(1);
    });

    if let Err(e) = run(&config, PathBuf::from(&args[2]), &args[3]) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(config: &EncoderConfig, frames_dir: PathBuf, name: &str) -> oledpack::Result<()> {
    let mut source = ImageSequence::from_dir(&frames_dir)?;
    let mut transcoder = Transcoder::new(config)?.on_progress(|progress| match progress {
        Progress::FramePacked { index, total } => println!("packed frame {}/{}", index + 1, total),
        Progress::Compressed { input, output } => println!("compressed {input} -> {output} bytes"),
        _ => {}
    });
    let stream = transcoder.transcode(&mut source)?;

    let path = write_header(&stream, Path::new("."), name)?;
    println!(
        "{} frames, {} bytes ({:.1}% of packed) written to {}",
        stream.metadata.frame_count,
        stream.payload.len(),
        stream.ratio() * 100.0,
        path.display()
    );
    Ok(())
}

/// Writes `<name>.h` under `dir` through a `.partial` file that is renamed into
/// place once complete and removed if anything fails.
fn write_header(stream: &EncodedStream, dir: &Path, name: &str) -> oledpack::Result<PathBuf> {
    let path = dir.join(format!("{name}.h"));
    let partial = path.with_extension("h.partial");
    let written = File::create(&partial)
        .map_err(oledpack::Error::from)
        .and_then(|file| {
            let mut emitter = CHeaderEmitter::new(name, BufWriter::new(file));
            emitter.emit(stream)?;
            emitter.into_inner().into_inner().map_err(|e| e.into_error())?;
            Ok(fs::rename(&partial, &path)?)
        });
    if let Err(e) = written {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }
    Ok(path)
}
