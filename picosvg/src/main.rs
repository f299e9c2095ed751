use std::{
    io::{self, Read, Write},
    process::ExitCode,
};

use clap::Parser;
use log::error;

use picosvg::{normalize_file, normalize_files, normalize_str, Args, Error};

fn run(args: &Args) -> Result<bool, Error> {
    let options = args.options();

    if let Some(output_dir) = &args.output_dir {
        let failures = normalize_files(&args.input, output_dir, &options)?;
        for (input, e) in failures.iter() {
            error!("{input:?} failed: {e}");
        }
        return Ok(failures.is_empty());
    }

    match args.input.as_slice() {
        [] => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            let output = normalize_str(&text, &options)?;
            if args.to_stdout() {
                io::stdout().write_all(output.as_bytes())?;
            } else {
                std::fs::write(&args.output_file, output).map_err(|source| Error::FileIo {
                    path: args.output_file.clone(),
                    source,
                })?;
            }
        }
        [input] if args.to_stdout() => {
            let text = std::fs::read_to_string(input).map_err(|source| Error::FileIo {
                path: input.clone(),
                source,
            })?;
            io::stdout().write_all(normalize_str(&text, &options)?.as_bytes())?;
        }
        [input] => normalize_file(input, &args.output_file, &options)?,
        _ => {
            return Err(Error::InvalidArgs(
                "multiple inputs require --output-dir".to_string(),
            ))
        }
    }
    Ok(true)
}

fn main() -> ExitCode {
    env_logger::builder()
        .format(|buf, record| {
            let style = buf.default_level_style(record.level());
            writeln!(
                buf,
                "{style}{}{style:#}: {}: {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
