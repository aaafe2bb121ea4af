//! # tylc
//!
//! Command-line driver for the tylang compiler: lexes, parses, type-checks
//! and emits class files for a single source file.

mod cli;

use cli::*;

use std::{error::Error, fs};

use log::{error, info};
use tylang_core::compile;

fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::init();

    simple_logger::init_with_level((&args.verbosity).into())?;

    let source = fs::read_to_string(&args.file)?;
    let file_name = args
        .file
        .to_str()
        .ok_or("source path is not valid UTF-8")?
        .to_string();

    info!("compiling {file_name}");

    let artifacts = match compile(&source, file_name) {
        Ok(artifacts) => artifacts,
        Err(compile_error) => {
            error!("{compile_error}");
            std::process::exit(1);
        }
    };

    let output_dir = args.output.unwrap_or_else(|| std::path::PathBuf::from("."));
    fs::create_dir_all(&output_dir)?;

    for artifact in &artifacts {
        let path = output_dir.join(format!("{}.class", artifact.name));
        fs::write(&path, &artifact.bytes)?;
        info!("wrote {}", path.display());
    }

    Ok(())
}
