use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sievebridge::batch::{self, BatchOptions, Direction};
use sievebridge::config::{self, paths};
use sievebridge::converter::{becky_to_sieve, sieve_to_becky, Conversion};
use sievebridge::store::build_folder_map;
use sievebridge::store::rule_io::{load_def, load_script};
use sievebridge::verify::VerifyOptions;
use sievebridge::{becky, sieve, Result};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_COMMIT"),
    ", built ",
    env!("BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "sievebridge", version, long_version = LONG_VERSION, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log debug details (`RUST_LOG` takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Write output even when the round trip check rejects it
    #[arg(long, global = true)]
    skip_verify: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert the IFilter.def of every configured account to SIEVE
    ToSieve(BatchArgs),
    /// Convert the SIEVE script of every configured account to IFilter.def
    ToBecky(BatchArgs),
    /// Convert one IFilter.def and print the SIEVE script
    Def2sieve {
        #[arg(value_name = "IFILTER_DEF")]
        input: PathBuf,
    },
    /// Convert one SIEVE script and print the IFilter.def
    Sieve2def {
        #[arg(value_name = "SCRIPT")]
        input: PathBuf,
        /// Becky! mailbox directory used to resolve folders
        #[arg(value_name = "MAILBOX_DIR")]
        mailbox: PathBuf,
    },
    /// Print the rules of an IFilter.def (`.def`) or SIEVE script as JSON
    Dump {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
struct BatchArgs {
    /// Account mapping file [default: ./becky.json, then the user config dir]
    #[arg(long, short, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory of the SIEVE scripts
    #[arg(long, value_name = "DIR", default_value = paths::DEFAULT_SIEVE_DIR)]
    sieve_dir: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    install_tracing(cli.verbose);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn install_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

/// `Ok(false)` when some output was rejected or an account failed.
fn run(cli: Cli) -> Result<bool> {
    let skip_verify = cli.skip_verify;
    let verify = move |options: VerifyOptions| (!skip_verify).then_some(options);

    match cli.command {
        Command::ToSieve(args) => run_batch(Direction::ToSieve, args, skip_verify),
        Command::ToBecky(args) => run_batch(Direction::ToBecky, args, skip_verify),
        Command::Def2sieve { input } => {
            let text = load_def(&input)?;
            let conversion = becky_to_sieve(&text, verify(VerifyOptions { expand_lists: false }));
            Ok(print_conversion(&conversion))
        }
        Command::Sieve2def { input, mailbox } => {
            let text = load_script(&input)?;
            let folders = build_folder_map(&mailbox)?;
            let conversion = sieve_to_becky(&text, &folders, verify(VerifyOptions { expand_lists: true }));
            Ok(print_conversion(&conversion))
        }
        Command::Dump { input } => {
            let rules = if is_def(&input) {
                becky::parse(&load_def(&input)?)
            } else {
                sieve::parse(&load_script(&input)?)
            };
            println!("{}", serde_json::to_string_pretty(&rules)?);
            Ok(true)
        }
    }
}

fn run_batch(direction: Direction, args: BatchArgs, skip_verify: bool) -> Result<bool> {
    let config_path = paths::resolve_config(args.config.as_deref())?;
    let accounts = config::load_accounts(&config_path)?;
    let options = BatchOptions {
        sieve_dir: args.sieve_dir,
        skip_verify,
    };
    let summary = batch::run(direction, &accounts, &options);
    Ok(summary.is_success())
}

/// Print accepted output to stdout, or the verification report to stderr.
fn print_conversion(conversion: &Conversion) -> bool {
    if let Some(verification) = &conversion.verification {
        if !verification.is_accepted() {
            eprint!("{verification}");
            return false;
        }
    }
    print!("{}", conversion.output);
    true
}

fn is_def(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("def"))
}
