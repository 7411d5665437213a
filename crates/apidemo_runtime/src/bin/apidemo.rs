//! apidemo CLI entry point.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use apidemo_core::DispatcherConfig;
use apidemo_foundation::Error;
use apidemo_runtime::{Repl, Session};
use thiserror::Error as ThisError;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter; `RUST_LOG` is the fallback.
const LOG_ENV: &str = "APIDEMO_LOG";

/// CLI configuration parsed from arguments.
#[derive(Debug, Default)]
struct CliConfig {
    files: Vec<PathBuf>,
    lines: Vec<String>,
    state: Option<PathBuf>,
    batch_mode: bool,
    show_help: bool,
    show_version: bool,
    quiet: bool,
    to_stderr: bool,
    detect_cycles: bool,
}

impl CliConfig {
    fn dispatcher_config(&self) -> DispatcherConfig {
        let mut config = DispatcherConfig::new();
        if self.quiet {
            config = config.quiet();
        } else if self.to_stderr {
            config = config.to_stderr();
        }
        if self.detect_cycles {
            config = config.detect_cycles();
        }
        config
    }
}

#[derive(Debug, ThisError)]
enum CliError {
    #[error("unknown option: {0}")]
    UnknownOption(String),

    #[error("{0} requires a value")]
    MissingValue(&'static str),

    #[error("{0} command(s) failed")]
    Failures(usize),

    #[error(transparent)]
    Run(#[from] Error),
}

fn main() -> ExitCode {
    init_tracing();
    let args: Vec<String> = env::args().collect();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError: {e}\x1b[0m");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_args(args: Vec<String>) -> Result<CliConfig, CliError> {
    let mut config = CliConfig::default();
    let mut args = args.into_iter().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => config.show_help = true,
            "-V" | "--version" => config.show_version = true,
            "-b" | "--batch" => config.batch_mode = true,
            "-q" | "--quiet" => config.quiet = true,
            "--stderr" => config.to_stderr = true,
            "--detect-cycles" => config.detect_cycles = true,
            "-e" => {
                let line = args.next().ok_or(CliError::MissingValue("-e"))?;
                config.lines.push(line);
            }
            "--state" => {
                let path = args.next().ok_or(CliError::MissingValue("--state"))?;
                config.state = Some(PathBuf::from(path));
            }
            other if other.starts_with('-') => {
                return Err(CliError::UnknownOption(other.to_string()));
            }
            path => config.files.push(PathBuf::from(path)),
        }
    }

    Ok(config)
}

fn run(args: Vec<String>) -> Result<(), CliError> {
    let config = parse_args(args)?;

    if config.show_help {
        print_help();
        return Ok(());
    }

    if config.show_version {
        println!("apidemo {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let mut session = Session::with_config(config.dispatcher_config());
    if let Some(state) = config.state.as_ref().filter(|p| p.exists()) {
        let report = session.load(state)?;
        eprintln!("{report}");
    }

    let mut repl = Repl::new()?.with_session(session);
    let mut failures = 0;

    for file in &config.files {
        failures += repl.eval_file(file)?;
    }
    for (i, line) in config.lines.iter().enumerate() {
        let name = format!("-e #{}", i + 1);
        failures += repl.eval_source(line, &name)?;
    }

    // Scripts or -e lines establish context; skip the banner.
    if !config.files.is_empty() || !config.lines.is_empty() {
        repl = repl.without_banner();
    }
    if !config.batch_mode {
        repl.run()?;
    }

    if let Some(state) = &config.state {
        repl.session_mut().save(state)?;
    }

    if config.batch_mode && failures > 0 {
        return Err(CliError::Failures(failures));
    }
    Ok(())
}

fn print_help() {
    println!(
        "\x1b[1mapidemo\x1b[0m - Simulated Lua C API, one call at a time

\x1b[1mUSAGE:\x1b[0m
    apidemo [OPTIONS] [FILES...]

\x1b[1mARGUMENTS:\x1b[0m
    [FILES...]    Command scripts to run before starting the REPL

\x1b[1mOPTIONS:\x1b[0m
    -h, --help         Print help information
    -V, --version      Print version information
    -b, --batch        Run scripts and exit (no REPL)
    -e LINE            Run one command (repeatable)
    --state FILE       Load FILE at start if it exists, save to it at exit
    -q, --quiet        Do not print stack lines
    --stderr           Print stack lines to stderr
    --detect-cycles    Print self-referencing tables as {{...}}

\x1b[1mENVIRONMENT:\x1b[0m
    APIDEMO_LOG        Log filter (falls back to RUST_LOG), e.g. apidemo_core=debug

\x1b[1mEXAMPLES:\x1b[0m
    apidemo                                   Start interactive REPL
    apidemo -b demo.api                       Run demo.api and exit
    apidemo -e 'L = luaL_newstate()' -e 'lua_pushnil(L)'
    apidemo --state session.msgpack           Continue a saved session

\x1b[1mREPL COMMANDS:\x1b[0m
    L = luaL_newstate()  Create a machine bound to L
    lua_pushnumber(L, 1) Run an operation on L; the stack is printed after
    n = lua_gettop(L)    Capture an operation's result
    help [operation]     List operations or describe one
    history [N]          Show the last N stack lines
    machines             List machines and their stacks
    save \"path\"          Save the session
    load \"path\"          Load a saved session into this one
    Ctrl+D               Exit REPL
    Ctrl+C               Cancel current input"
    );
}
