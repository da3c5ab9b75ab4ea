use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use slc_drv::{Config, Session};

/// Compiler & interpreter for the Slate stack language
#[derive(Parser, Debug)]
#[command(name = "slc", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Additional include search directories
    #[arg(short = 'I', long = "include", global = true, value_name = "DIR")]
    include: Vec<PathBuf>,

    /// Enable debug logging (same as SLC_LOG=debug)
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Type check a program without running it
    Check {
        /// The program to check
        file: PathBuf,
    },
    /// Type check and interpret a program
    Run {
        /// The program to run
        file: PathBuf,
        /// Arguments made visible through `argc`/`argv`
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,
    },
}

fn main() {
    match try_main() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

fn try_main() -> Result<i32> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("SLC_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to initialise logging: {err}"))?;

    let code = match cli.command {
        Command::Check { file } => {
            let mut session = Session::new(Config {
                file,
                include_dirs: cli.include,
                args: Vec::new(),
            });
            session.check()
        }
        Command::Run { file, args } => {
            let mut session = Session::new(Config {
                file,
                include_dirs: cli.include,
                args,
            });
            session.run()
        }
    };
    Ok(code)
}
