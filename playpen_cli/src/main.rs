//! # Playpen CLI
//!
//! Runs playground scripts outside the GUI with the same runner, config and
//! console formatting.
//!
//! ```text
//! playpen run demo.js                 # print console lines, exit 1 on error
//! playpen run demo.js --json          # console lines as JSON
//! playpen run demo.js --language Java # the placeholder error, as in the GUI
//! playpen check demo.js               # parse only
//! playpen config --config my.toml     # effective configuration as TOML
//! playpen routes                      # pages and header links
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use playpen_core::config::PlaypenConfig;
use playpen_core::console::{ConsoleLevel, ConsoleLine};
use playpen_core::routes::{Route, ACCOUNT_LINKS, NAVIGATION};
use playpen_core::runner::CodeRunner;
use playpen_core::script::{Limits, ScriptEngine};
use playpen_core::{PlaypenError, PlaypenResult};

#[derive(Parser, Debug)]
#[command(
    name = "playpen",
    version,
    about = "Run and check playground scripts from the terminal"
)]
struct Cli {
    /// Log at debug level unless RUST_LOG is set
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a script and print its console output
    Run(RunArgs),
    /// Parse a script without running it
    Check {
        /// Script file
        file: PathBuf,
    },
    /// Print the effective configuration as TOML
    Config {
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
    /// List pages and header links
    Routes,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Script file
    file: PathBuf,

    /// Language selector value; anything but the default language yields the placeholder error
    #[arg(long, short = 'l')]
    language: Option<String>,

    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print a JSON document instead of plain lines
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct RunReport<'a> {
    language: &'a str,
    success: bool,
    lines: &'a [ConsoleLine],
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // Logs go to stderr so stdout stays the script's console
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(debug)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

fn read_source(path: &Path) -> PlaypenResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| PlaypenError::file_error("read", path.display().to_string(), e.to_string()))
}

/// Plain console rendering: one line per entry, non-log levels prefixed.
fn format_line(line: &ConsoleLine) -> String {
    match line.level {
        ConsoleLevel::Log => line.text.clone(),
        level => format!("[{level}] {}", line.text),
    }
}

/// Returns whether the run completed without error.
fn run_script(args: &RunArgs) -> PlaypenResult<bool> {
    let config = PlaypenConfig::load_or_default(args.config.as_deref())?;
    let source = read_source(&args.file)?;

    let mut runner = CodeRunner::new(&config.runner);
    if let Some(language) = &args.language {
        runner.select_language(language)?;
    }

    let result = runner.run(&source);
    if let Err(err) = &result {
        tracing::debug!(%err, file = %args.file.display(), "run failed");
    }

    if args.json {
        let report = RunReport {
            language: runner.selected().as_str(),
            success: result.is_ok(),
            lines: runner.console().lines(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for line in runner.console().lines() {
            println!("{}", format_line(line));
        }
    }

    Ok(result.is_ok())
}

fn check_script(file: &Path) -> PlaypenResult<bool> {
    let source = read_source(file)?;
    match ScriptEngine::new(Limits::default()).check(&source) {
        Ok(()) => {
            println!("{}: ok", file.display());
            Ok(true)
        }
        Err(err) => {
            match err.line {
                Some(line) => println!("{}:{line}: {err}", file.display()),
                None => println!("{}: {err}", file.display()),
            }
            Ok(false)
        }
    }
}

fn print_config(path: Option<&Path>) -> PlaypenResult<bool> {
    let config = PlaypenConfig::load_or_default(path)?;
    print!("{}", config.to_toml_string()?);
    Ok(true)
}

fn routes_table() -> String {
    let mut out = String::from("Pages:\n");
    for route in Route::ALL {
        out.push_str(&format!("  {:<10} {}\n", route.path(), route.title()));
    }
    out.push_str("Header links:\n");
    for link in NAVIGATION.iter().chain(ACCOUNT_LINKS.iter()) {
        let target = if link.route().is_some() { "" } else { " (not found)" };
        out.push_str(&format!("  {:<10} {}{target}\n", link.href, link.label));
    }
    out
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let outcome = match &cli.command {
        Command::Run(args) => run_script(args),
        Command::Check { file } => check_script(file),
        Command::Config { config } => print_config(config.as_deref()),
        Command::Routes => {
            print!("{}", routes_table());
            Ok(true)
        }
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error [{}]: {err}", err.error_code());
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn script(source: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(source.as_bytes()).unwrap();
        file
    }

    fn run_args(file: &Path) -> RunArgs {
        RunArgs {
            file: file.to_path_buf(),
            language: None,
            config: None,
            json: false,
        }
    }

    #[test]
    fn test_cli_parses_run_flags() {
        let cli = Cli::parse_from(["playpen", "run", "demo.js", "--language", "Python", "--json"]);
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.file, PathBuf::from("demo.js"));
                assert_eq!(args.language.as_deref(), Some("Python"));
                assert!(args.json);
            }
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn test_format_line_prefixes_levels() {
        let log = ConsoleLine {
            level: ConsoleLevel::Log,
            text: "plain".to_string(),
        };
        let warn = ConsoleLine {
            level: ConsoleLevel::Warn,
            text: "careful".to_string(),
        };
        assert_eq!(format_line(&log), "plain");
        assert_eq!(format_line(&warn), "[warn] careful");
    }

    #[test]
    fn test_run_success_flag() {
        let ok = script("console.log(1)");
        assert!(run_script(&run_args(ok.path())).unwrap());

        let failing = script("throw new Error('boom')");
        assert!(!run_script(&run_args(failing.path())).unwrap());

        let mut args = run_args(ok.path());
        args.language = Some("Java".to_string());
        assert!(!run_script(&args).unwrap());
    }

    #[test]
    fn test_run_rejects_unknown_language() {
        let file = script("console.log(1)");
        let mut args = run_args(file.path());
        args.language = Some("Fortran".to_string());
        let err = run_script(&args).unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_LANGUAGE");
    }

    #[test]
    fn test_missing_file_is_file_error() {
        let err = read_source(Path::new("/definitely/not/here.js")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
    }

    #[test]
    fn test_check_reports_syntax_errors() {
        let bad = script("let = ;");
        assert!(!check_script(bad.path()).unwrap());
        let good = script("function f(a) { return a * 2 }");
        assert!(check_script(good.path()).unwrap());
    }

    #[test]
    fn test_routes_table_lists_everything() {
        let table = routes_table();
        assert!(table.contains("/report"));
        assert!(table.contains("Bug Report"));
        assert!(table.contains("/signin"));
        assert!(table.contains("Sign In (not found)"));
    }
}
