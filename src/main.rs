use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::driver::{self, Outcome};
use rox::error::{Diagnostics, LoxError};
use rox::interpreter::Interpreter;
use rox::scanner::Scanner;

/// Exit code for static (scan/parse/resolve) errors.
const EXIT_STATIC: i32 = 65;

/// Exit code for an uncaught runtime error.
const EXIT_RUNTIME: i32 = 70;

#[derive(ClapParser, Debug)]
#[command(name = "rox", version, about = "Rox language interpreter", long_about = None)]
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
        filename: Option<PathBuf>,

        /// Print the token stream as JSON instead of one token per line
        #[arg(long)]
        json: bool,
    },

    /// Parses and resolves a file, reporting every static error without running it
    Check { filename: Option<PathBuf> },

    /// Runs a file as a Rox program, or starts a prompt when no file is given
    Run { filename: Option<PathBuf> },
}

/// Reads the contents of a file as UTF‑8 text.
fn read_file(filename: PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    let source = String::from_utf8(buf)
        .map_err(LoxError::from)
        .context(format!("File {:?} is not valid UTF-8", filename))?;

    Ok(source)
}

fn init_logger() -> Result<()> {
    // Create or open the log file
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    // Configure env_logger to write to file with module and source line
    Builder::new()
        .format(|buf, record| {
            // Strip 'rox::' from module path
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
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn print_diagnostics(diagnostics: &Diagnostics) {
    for error in diagnostics.errors() {
        eprintln!("{}", error);
    }
}

/// Runs one source text, printing whatever stopped it on stderr.
fn run_source(interpreter: &mut Interpreter, source: &str) -> Outcome {
    let outcome = driver::run(interpreter, source);

    match &outcome {
        Outcome::Completed => {}
        Outcome::StaticErrors(diagnostics) => print_diagnostics(diagnostics),
        Outcome::RuntimeError(e) => {
            debug!("Runtime error at line {:?}: {}", e.line(), e);
            eprintln!("{}", e);
        }
    }

    outcome
}

fn run_prompt() -> Result<()> {
    info!("Starting interactive prompt");

    let mut interpreter = Interpreter::new();
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush prompt")?;

        line.clear();
        if stdin.lock().read_line(&mut line).context("Failed to read line")? == 0 {
            break;
        }

        // Errors are reported and the session carries on with the next line.
        let outcome = run_source(&mut interpreter, &line);
        debug!("Prompt line finished: {:?}", outcome);
    }

    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    // Interpretation runs on a thread sized for MAX_CALL_DEPTH nested calls.
    driver::with_stack(move || dispatch(args.commands))
        .context("Failed to start interpreter thread")?
}

fn dispatch(commands: Commands) -> Result<()> {
    match commands {
        Commands::Tokenize { filename, json } => {
            let Some(filename) = filename else {
                println!("No input filepath was provided. Exiting...");
                std::process::exit(0);
            };

            info!("Running Tokenize subcommand");
            let source = read_file(filename)?;

            let mut tokens = Vec::new();
            let mut tokenized = true;

            for item in Scanner::new(&source) {
                match item {
                    Ok(token) => tokens.push(token),
                    Err(e) => {
                        tokenized = false;
                        eprintln!("{}", e);
                    }
                }
            }

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&tokens).context("Failed to encode tokens")?
                );
            } else {
                for token in &tokens {
                    println!("{}", token);
                }
            }

            if !tokenized {
                debug!("Tokenization failed, exiting with code {}", EXIT_STATIC);
                std::process::exit(EXIT_STATIC);
            }

            info!("Tokenization completed successfully");
        }

        Commands::Check { filename } => {
            let Some(filename) = filename else {
                println!("No input filepath was provided. Exiting...");
                std::process::exit(0);
            };

            info!("Running Check subcommand");
            let source = read_file(filename)?;

            let mut interpreter = Interpreter::new();
            let mut diagnostics = Diagnostics::new();
            driver::analyze(&mut interpreter, &source, &mut diagnostics);

            if diagnostics.had_error() {
                print_diagnostics(&diagnostics);
                std::process::exit(EXIT_STATIC);
            }

            info!("Check completed without diagnostics");
        }

        Commands::Run { filename } => match filename {
            Some(filename) => {
                info!("Running Run subcommand");
                let source = read_file(filename)?;
                info!("Provided input:\n {}", source);

                let mut interpreter = Interpreter::new();

                match run_source(&mut interpreter, &source) {
                    Outcome::Completed => info!("Program executed successfully"),
                    Outcome::StaticErrors(_) => std::process::exit(EXIT_STATIC),
                    Outcome::RuntimeError(_) => std::process::exit(EXIT_RUNTIME),
                }
            }

            None => run_prompt()?,
        },
    }

    Ok(())
}
