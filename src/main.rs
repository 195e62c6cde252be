use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use rox::error::LoxError;
use rox::interpreter::{Interpreter, Outcome};
use rox::scanner::Scanner;

/// Exit code for errors found before execution (scan, parse, resolve).
const EXIT_STATIC: i32 = 65;

/// Exit code for errors raised while running.
const EXIT_RUNTIME: i32 = 70;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print tokens as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Runs input from a file as a Lox program
    Run { filename: PathBuf },

    /// Starts an interactive session; globals persist between lines
    Repl,
}

/// Maps a source file into memory.
fn map_file(filename: &Path) -> Result<Mmap> {
    info!("Mapping file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;

    // SAFETY: the mapping is read-only and lives only while the file is scanned.
    let map = unsafe { Mmap::map(&file) }.context(format!("Failed to map file {:?}", filename))?;

    info!("Mapped {} bytes from {:?}", map.len(), filename);
    Ok(map)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_default_env() // RUST_LOG overrides
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn tokenize(filename: &Path, json: bool) -> Result<()> {
    let source = map_file(filename)?;
    let mut tokenized = true;

    for token in Scanner::new(&source) {
        match token {
            Ok(token) if json => println!("{}", serde_json::to_string(&token)?),
            Ok(token) => println!("{}", token),
            Err(e) => {
                tokenized = false;
                eprintln!("{}", e);
            }
        }
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code {}", EXIT_STATIC);
        std::process::exit(EXIT_STATIC);
    }

    Ok(())
}

fn run(filename: &Path) -> Result<()> {
    let source = map_file(filename)?;
    let mut interpreter = Interpreter::new();

    match rox::run_source(&mut interpreter, &source) {
        Ok(Outcome::Completed) => {
            info!("Program executed successfully");
            Ok(())
        }

        Ok(Outcome::Aborted) => std::process::exit(EXIT_RUNTIME),

        Err(e @ (LoxError::Lex { .. } | LoxError::Parse { .. } | LoxError::Resolve { .. })) => {
            eprintln!("{}", e);
            std::process::exit(EXIT_STATIC);
        }

        Err(e @ LoxError::StackOverflow { .. }) => {
            eprintln!("{}", e);
            std::process::exit(EXIT_RUNTIME);
        }

        Err(e) => Err(e.into()),
    }
}

fn repl() -> Result<()> {
    let mut interpreter = Interpreter::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            return Ok(());
        }

        match rox::run_source(&mut interpreter, line.as_bytes()) {
            Ok(Outcome::Completed) => {
                if let Some(value) = interpreter.last_value() {
                    println!("{}", value);
                }
            }

            Ok(Outcome::Aborted) => {}

            Err(e @ LoxError::StackOverflow { .. }) => {
                eprintln!("{}", e);
                std::process::exit(EXIT_RUNTIME);
            }

            Err(e) => eprintln!("{}", e),
        }
    }
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => tokenize(&filename, json),
        Commands::Run { filename } => run(&filename),
        Commands::Repl => repl(),
    }
}
