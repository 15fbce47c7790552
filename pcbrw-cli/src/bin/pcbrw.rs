//! pcbrw Command Line Interface

#![deny(missing_docs)]

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{crate_version, ArgAction, Parser, Subcommand, ValueEnum};
use itertools::Itertools;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use pcbrw::parse::{parse_file, Parsed};
use pcbrw::primitives::{Format, Unit};
use pcbrw::write::write_elements;

#[derive(Parser, Debug)]
#[command(author, about, long_about = None,
    disable_help_flag = true,
    disable_version_flag = true,
    next_help_heading="Global Options",
    version=crate_version!())]
struct PcbrwArgs {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, global = true, action=ArgAction::Help,
        help = "Print help")]
    help: (),

    #[arg(long, short='V', action=ArgAction::Version,
        help = "Print version")]
    version: (),
}

#[derive(Subcommand, Debug)]
enum Commands {
    View(ViewConfig),
    Fmt(FmtConfig),
    Check(CheckConfig),
}

/// The unit cooked distances are printed in.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
enum UnitArg {
    #[default]
    Mm,
    Um,
    Cm,
    Th,
    In,
}

impl From<UnitArg> for Unit {
    fn from(value: UnitArg) -> Self {
        match value {
            UnitArg::Mm => Unit::Mm,
            UnitArg::Um => Unit::Um,
            UnitArg::Cm => Unit::Cm,
            UnitArg::Th => Unit::Th,
            UnitArg::In => Unit::In,
        }
    }
}

/// Show element files in the human readable cooked format
#[derive(Parser, Debug)]
#[command(long_about = None)]
struct ViewConfig {
    /// One or more element files
    path: Vec<OsString>,

    /// Unit for distances
    #[arg(long, short, value_enum, default_value_t = UnitArg::Mm)]
    unit: UnitArg,
}

/// Re-emit element files in the canonical raw format
#[derive(Parser, Debug)]
#[command(long_about = None)]
struct FmtConfig {
    /// One or more element files
    path: Vec<OsString>,
}

/// Parse element files and report what was salvaged
#[derive(Parser, Debug)]
#[command(long_about = None)]
struct CheckConfig {
    /// One or more element files
    path: Vec<OsString>,
}

fn load(path: &OsString) -> Result<Parsed> {
    let path = PathBuf::from(path);
    parse_file(&path).with_context(|| format!("while parsing {}", path.display()))
}

fn view(config: &ViewConfig) -> Result<()> {
    for path in &config.path {
        let parsed = load(path)?;
        println!(
            "{}: {} element{}{}",
            PathBuf::from(path).display(),
            parsed.elements.len(),
            if parsed.elements.len() == 1 { "" } else { "s" },
            if parsed.salvaged { " (salvaged)" } else { "" },
        );
        let cooked = write_elements(&parsed.elements, Format::Cooked(config.unit.into()))?;
        for line in cooked.lines() {
            println!("  {line}");
        }
    }
    Ok(())
}

fn fmt(config: &FmtConfig) -> Result<()> {
    for path in &config.path {
        let parsed = load(path)?;
        print!("{}", write_elements(&parsed.elements, Format::Raw)?);
    }
    Ok(())
}

fn check(config: &CheckConfig) -> Result<bool> {
    let mut clean = true;
    for path in &config.path {
        let path_display = PathBuf::from(path);
        match load(path) {
            Ok(parsed) => {
                let summary = parsed
                    .elements
                    .iter()
                    .map(|element| element.name())
                    .counts()
                    .into_iter()
                    .sorted()
                    .map(|(name, count)| format!("{count} {name}"))
                    .join(", ");
                if parsed.salvaged {
                    clean = false;
                    println!(
                        "{}: salvaged; kept {}",
                        path_display.display(),
                        if summary.is_empty() { "nothing".to_owned() } else { summary }
                    );
                } else {
                    println!(
                        "{}: ok{}",
                        path_display.display(),
                        if summary.is_empty() {
                            String::new()
                        } else {
                            format!(" ({summary})")
                        }
                    );
                }
            }
            Err(err) => {
                clean = false;
                println!("{}: {err:#}", path_display.display());
            }
        }
    }
    Ok(clean)
}

fn main() -> Result<ExitCode> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::WARN)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("while installing the tracing subscriber")?;

    let args = PcbrwArgs::parse();
    match &args.command {
        Commands::View(config) => view(config)?,
        Commands::Fmt(config) => fmt(config)?,
        Commands::Check(config) => {
            if !check(config)? {
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[test]
fn verify_args() {
    use clap::CommandFactory;
    PcbrwArgs::command().debug_assert();
}
