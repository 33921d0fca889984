use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use urm::codec::{self, RunDocument};
use urm::frontend;
use urm::lang::{Program, disasm};
use urm::runtime::{DEFAULT_MAX_REGISTERS, DEFAULT_SAFETY_COUNT, RegisterBank, Vm, VmConfig};
use urm::service::{self, Endpoint};

#[derive(Parser)]
#[command(name = "urm", version, about = "Unlimited Register Machine simulator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a program and print the final registers
    Run {
        /// Program file (.json, .urmb or .urm listing)
        file: PathBuf,
        /// Initial registers, from r0 upwards
        #[arg(short, long, value_delimiter = ',')]
        registers: Vec<u64>,
        /// Step ceiling; defaults to the file's safety count
        #[arg(long)]
        safety_count: Option<u64>,
        /// Largest register bank the run may use
        #[arg(long, default_value_t = DEFAULT_MAX_REGISTERS)]
        max_registers: usize,
        /// Print every executed step
        #[arg(long)]
        trace: bool,
        /// Print the run-result document instead of a summary
        #[arg(long, conflicts_with = "trace")]
        json: bool,
    },
    /// Print the number of registers a program needs
    Haddr { file: PathBuf },
    /// Print an annotated listing of a program
    Disasm { file: PathBuf },
    /// Convert a program between formats, chosen by file extension
    Convert {
        input: PathBuf,
        output: PathBuf,
        /// Safety count to store; defaults to the input's
        #[arg(long)]
        safety_count: Option<u64>,
    },
    /// Answer a backend request read from a file or stdin
    Request {
        #[arg(value_enum)]
        endpoint: RequestKind,
        file: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RequestKind {
    MaxRegister,
    Run,
}

impl From<RequestKind> for Endpoint {
    fn from(kind: RequestKind) -> Self {
        match kind {
            RequestKind::MaxRegister => Endpoint::MaxRegister,
            RequestKind::Run => Endpoint::RunProgram,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Json,
    Binary,
    Listing,
}

impl FileFormat {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => FileFormat::Json,
            Some("urmb") => FileFormat::Binary,
            _ => FileFormat::Listing,
        }
    }
}

fn main() -> ExitCode {
    init_tracing();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("URM_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Run {
            file,
            registers,
            safety_count,
            max_registers,
            trace,
            json,
        } => {
            let (program, stored) = load_program(&file)?;
            let safety_count = safety_count.or(stored).unwrap_or(DEFAULT_SAFETY_COUNT);
            let vm = Vm::with_config(VmConfig {
                safety_count,
                max_registers,
            });
            let execution = vm.run(&program, RegisterBank::from_values(registers))?;

            if json {
                let document = RunDocument::new(codec::encode(&program, safety_count)?, &execution)?;
                println!("{}", serde_json::to_string_pretty(&document)?);
            } else {
                if trace {
                    print!("{}", disasm::format_trace(&execution.trace));
                }
                println!("halted: {} after {} step(s)", execution.halt, execution.steps());
                println!("registers: {:?}", execution.registers.as_slice());
            }
        }
        Command::Haddr { file } => {
            let (program, _) = load_program(&file)?;
            let count = program
                .register_count()
                .context("register count does not fit in a machine word")?;
            println!("{}", count);
        }
        Command::Disasm { file } => {
            let (program, _) = load_program(&file)?;
            print!("{}", disasm::disassemble(&program));
        }
        Command::Convert {
            input,
            output,
            safety_count,
        } => {
            let (program, stored) = load_program(&input)?;
            let safety_count = safety_count.or(stored).unwrap_or(DEFAULT_SAFETY_COUNT);
            save_program(&output, &program, safety_count)?;
        }
        Command::Request { endpoint, file } => {
            let body = match &file {
                Some(path) => fs::read_to_string(path)
                    .with_context(|| format!("failed to read '{}'", path.display()))?,
                None => {
                    let mut body = String::new();
                    io::stdin()
                        .read_to_string(&mut body)
                        .context("failed to read request from stdin")?;
                    body
                }
            };
            let response = service::handle(endpoint.into(), &body);
            println!("{}", response.body);
            if !response.status.is_success() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Reads a program and, for document formats, its stored safety count.
fn load_program(path: &Path) -> Result<(Program, Option<u64>)> {
    let format = FileFormat::of(path);
    debug!(path = %path.display(), ?format, "loading program");

    let loaded = match format {
        FileFormat::Json => {
            let json = read_text(path)?;
            let (program, safety_count) = codec::from_json(&json)
                .with_context(|| format!("failed to decode '{}'", path.display()))?;
            (program, Some(safety_count))
        }
        FileFormat::Binary => {
            let bytes =
                fs::read(path).with_context(|| format!("failed to read '{}'", path.display()))?;
            let (program, safety_count) = codec::from_bytes(&bytes)
                .with_context(|| format!("failed to decode '{}'", path.display()))?;
            (program, Some(safety_count))
        }
        FileFormat::Listing => {
            let source = read_text(path)?;
            let program = frontend::parse_source(&source)
                .with_context(|| format!("failed to parse '{}'", path.display()))?;
            (program, None)
        }
    };

    if loaded.0.is_empty() {
        bail!("'{}' contains no instructions", path.display());
    }
    Ok(loaded)
}

fn save_program(path: &Path, program: &Program, safety_count: u64) -> Result<()> {
    let bytes = match FileFormat::of(path) {
        FileFormat::Json => {
            let mut json = codec::to_json(program, safety_count)?;
            json.push('\n');
            json.into_bytes()
        }
        FileFormat::Binary => codec::to_bytes(program, safety_count)?,
        FileFormat::Listing => frontend::to_source(program).into_bytes(),
    };
    fs::write(path, bytes).with_context(|| format!("failed to write '{}'", path.display()))
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read '{}'", path.display()))
}
