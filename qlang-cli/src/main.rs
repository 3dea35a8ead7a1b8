use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use qlang_core::{Binding, CoreError, FailurePolicy, Flow, Pipeline, Sink};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const BANNER: &str = "qlang REPL (type 'exit' to quit)";
const FAREWELL: &str = "Bye!";
const EXIT_COMMAND: &str = "exit";

/// Runs qlang declarations from a file, stdin, or an interactive prompt.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "PATH",
        help = "Source file to run (reads stdin when omitted)"
    )]
    input: Option<PathBuf>,

    #[arg(short, long, help = "Start an interactive session instead of running a source")]
    repl: bool,

    #[arg(long, default_value = ">>> ", help = "Prompt shown before each interactive line")]
    prompt: String,

    #[arg(
        long,
        value_name = "FILTER",
        default_value = "warn",
        help = "Log filter used when QLANG_LOG is not set"
    )]
    log_level: String,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);
    execute(cli)
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_env("QLANG_LOG").unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn execute(cli: Cli) -> Result<ExitCode> {
    if cli.repl {
        if cli.input.is_some() {
            eprintln!("--input is ignored in interactive mode");
        }
        let stdin = io::stdin();
        let stdout = io::stdout();
        run_repl(stdin.lock(), &mut stdout.lock(), &cli.prompt)?;
        return Ok(ExitCode::SUCCESS);
    }

    let source = read_source(cli.input.as_deref())?;
    let stdout = io::stdout();
    if run_batch(&source, &mut stdout.lock())? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn read_source(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {}", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read source from stdin")?;
            Ok(buffer)
        }
    }
}

/// Halts on the first error; values are printed only if every line succeeds.
///
/// Returns whether the run completed.
fn run_batch(source: &str, output: &mut impl Write) -> Result<bool> {
    let mut pipeline = Pipeline::new(FailurePolicy::Halt);
    let mut sink = StderrSink;
    for line in source.lines() {
        if pipeline.feed(line, &mut sink) == Flow::Halt {
            break;
        }
    }

    let Some(symbols) = pipeline.finalize() else {
        return Ok(false);
    };
    debug!(count = symbols.len(), "batch run complete");
    for value in symbols.values() {
        writeln!(output, "{value}").context("failed to write output")?;
    }
    Ok(true)
}

struct StderrSink;

impl Sink for StderrSink {
    fn accepted(&mut self, _binding: &Binding) {}

    fn rejected(&mut self, error: &CoreError) {
        eprintln!("{error}");
    }
}

/// Reports every line and keeps going; the table survives failed lines.
fn run_repl(input: impl BufRead, output: &mut impl Write, prompt: &str) -> Result<()> {
    writeln!(output, "{BANNER}")?;
    let mut pipeline = Pipeline::new(FailurePolicy::Skip);
    let mut lines = input.lines();

    loop {
        write!(output, "{prompt}")?;
        output.flush()?;

        let Some(line) = lines.next() else {
            writeln!(output)?;
            break;
        };
        let line = line.context("failed to read from stdin")?;
        let line = line.trim();

        if line.eq_ignore_ascii_case(EXIT_COMMAND) {
            writeln!(output, "{FAREWELL}")?;
            break;
        }
        // Blank input does not consume a line number.
        if line.is_empty() {
            continue;
        }

        let mut sink = EchoSink {
            output: &mut *output,
            failure: None,
        };
        pipeline.feed(line, &mut sink);
        if let Some(err) = sink.failure {
            return Err(err).context("failed to write to stdout");
        }
    }

    debug!(count = pipeline.symbols().len(), "session ended");
    Ok(())
}

struct EchoSink<'a, W: Write> {
    output: &'a mut W,
    failure: Option<io::Error>,
}

impl<W: Write> EchoSink<'_, W> {
    fn echo(&mut self, message: std::fmt::Arguments<'_>) {
        if self.failure.is_none() {
            if let Err(err) = writeln!(self.output, "{message}") {
                self.failure = Some(err);
            }
        }
    }
}

impl<W: Write> Sink for EchoSink<'_, W> {
    fn accepted(&mut self, binding: &Binding) {
        self.echo(format_args!("[OK] {} = {}", binding.name, binding.value));
    }

    fn rejected(&mut self, error: &CoreError) {
        self.echo(format_args!("{error}"));
    }
}
