pub mod cancel;
pub mod cols;
pub mod config;
pub mod diff;
pub mod disasm;
pub mod err;
pub mod gdiff;
pub mod logging;
pub mod palette;
pub mod render;
pub mod util;

use std::{
    fs,
    io::{self, BufWriter, IsTerminal, Write},
    path::{Path, PathBuf},
};

use clap::{Args, CommandFactory, Parser, Subcommand, error::ErrorKind};

use crate::{
    cols::{ColumnStyle, Columns, auto_width},
    config::{Config, LogConfig, init_config},
    diff::{DiffOpStream, Distance, DistanceAlgorithm},
    err::{Error, Result},
    palette::Palette,
    render::{Dispatcher, Input, Inputs, RenderMode, RenderOptions},
};

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Use verbose output (-vv very verbose, -vvv also to debug.log, -vvvv trace.log)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compare two files and print the changes
    Diff(DiffArgs),
    /// Show two files side by side as hex columns
    Cols(ColsArgs),
    /// Compute the edit distance between two files
    Distance(DistanceArgs),
    /// Apply a GDIFF patch to the old file
    Patch(PatchArgs),
}

#[derive(Debug, Args)]
struct DiffArgs {
    /// Path to old file
    old: PathBuf,
    /// Path to new file
    new: PathBuf,
    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    format: RenderMode,
    /// Only print the number of changes
    #[arg(short, long)]
    count: bool,
    /// Disassemble changed bytes instead of showing hex pairs
    #[arg(short = 'D', long)]
    disasm: bool,
    /// Disable colors and shorten output
    #[arg(short, long)]
    quiet: bool,
    /// Disable colors
    #[arg(long)]
    no_color: bool,
    /// Do not copy the unchanged tail at the end of a GDIFF patch
    #[arg(long)]
    no_tail: bool,
}

#[derive(Debug, Args)]
struct ColsArgs {
    /// Path to old file
    old: PathBuf,
    /// Path to new file
    new: PathBuf,
    /// Byte rendering
    #[arg(short, long, value_enum, default_value_t)]
    style: ColumnStyle,
    /// Bytes per row, 8 or 16 [default: fit the terminal]
    #[arg(short, long)]
    width: Option<usize>,
    /// Disable colors
    #[arg(long)]
    no_color: bool,
}

#[derive(Debug, Args)]
struct DistanceArgs {
    /// Path to old file
    old: PathBuf,
    /// Path to new file
    new: PathBuf,
    /// Distance algorithm
    #[arg(short, long, value_enum, default_value = "myers")]
    algorithm: DistanceAlgorithm,
}

#[derive(Debug, Args)]
struct PatchArgs {
    /// Path to old file
    old: PathBuf,
    /// Path to GDIFF patch
    patch: PathBuf,
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    log::info!("reading {}...", path.display());
    fs::read(path).map_err(|source| Error::Input {
        path: path.to_path_buf(),
        source,
    })
}

fn use_color(no_color: bool) -> bool {
    !no_color && io::stdout().is_terminal()
}

fn diff(args: DiffArgs) -> Result<()> {
    if args.count && args.format == RenderMode::Gdiff {
        Cli::command()
            .error(
                ErrorKind::ArgumentConflict,
                "--count cannot be combined with --format gdiff",
            )
            .exit();
    }
    let old = read_input(&args.old)?;
    let new = read_input(&args.new)?;
    if old.len() != new.len() {
        log::warn!("File size differs {} vs {}", old.len(), new.len());
    }

    log::info!("comparing...");
    let stream = DiffOpStream::from_compare(&old, &new);

    let old_name = args.old.to_string_lossy();
    let new_name = args.new.to_string_lossy();
    let inputs = Inputs {
        old: Input {
            name: &old_name,
            bytes: &old,
        },
        new: Input {
            name: &new_name,
            bytes: &new,
        },
    };
    let options = RenderOptions {
        count: args.count,
        color: !args.quiet && use_color(args.no_color),
        quiet: args.quiet,
        disasm: args.disasm,
        gdiff_tail: !args.no_tail,
    };

    log::info!("rendering...");
    let mut writer = BufWriter::new(io::stdout().lock());
    let summary = Dispatcher::new(args.format, options).run(&inputs, &stream, &mut writer)?;
    log::info!("{} operations rendered", summary.ops);
    Ok(())
}

fn cols(args: ColsArgs) -> Result<()> {
    let old = read_input(&args.old)?;
    let new = read_input(&args.new)?;
    let width = args.width.unwrap_or_else(auto_width);
    let columns = Columns::new(width, args.style, Palette::new(use_color(args.no_color)))?;
    let mut writer = BufWriter::new(io::stdout().lock());
    columns.render(&old, &new, &mut writer)?;
    Ok(())
}

fn distance(args: DistanceArgs) -> Result<()> {
    let old = read_input(&args.old)?;
    let new = read_input(&args.new)?;
    log::info!("computing {:?} distance...", args.algorithm);
    let distance = Distance::compute(&old, &new, args.algorithm);
    let mut writer = BufWriter::new(io::stdout().lock());
    writeln!(writer, "similarity: {:.3}", distance.similarity)?;
    writeln!(writer, "distance: {}", distance.distance)?;
    writer.flush()?;
    Ok(())
}

fn patch(args: PatchArgs) -> Result<()> {
    let old = read_input(&args.old)?;
    let patch = read_input(&args.patch)?;
    log::info!("patching...");
    let new = gdiff::apply(&old, &patch)?;
    let mut writer = BufWriter::new(io::stdout().lock());
    writer.write_all(&new)?;
    writer.flush()?;
    Ok(())
}

pub fn main() {
    let cli = Cli::parse();
    init_config(Config {
        log_config: LogConfig::Verbose(cli.verbose),
    });
    log::debug!("cli args: {:#?}", cli);
    let result = match cli.command {
        Commands::Diff(args) => diff(args),
        Commands::Cols(args) => cols(args),
        Commands::Distance(args) => distance(args),
        Commands::Patch(args) => patch(args),
    };
    match result {
        Ok(()) => log::info!("success"),
        Err(e) => {
            log::error!("{}", e);
            log::logger().flush();
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_diff() {
        let cli = Cli::try_parse_from(["byte-diff", "-v", "diff", "a", "b", "-f", "gdiff", "--no-tail"])
            .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Diff(args) => {
                assert_eq!(args.format, RenderMode::Gdiff);
                assert!(args.no_tail);
                assert!(!args.count);
            }
            _ => panic!("expected diff"),
        }
    }

    #[test]
    fn test_cli_parses_cols() {
        let cli = Cli::try_parse_from(["byte-diff", "cols", "a", "b", "-s", "hex-ii", "-w", "16"])
            .unwrap();
        match cli.command {
            Commands::Cols(args) => {
                assert_eq!(args.style, ColumnStyle::HexII);
                assert_eq!(args.width, Some(16));
            }
            _ => panic!("expected cols"),
        }
    }

    #[test]
    fn test_missing_input_is_an_input_error() {
        let err = read_input(Path::new("/nonexistent/byte-diff-input")).unwrap_err();
        assert!(matches!(err, Error::Input { .. }));
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }
}
