use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod testing;

use commands::RunOverrides;

/// Conformance test runner for external interpreters.
///
/// Test definitions are JSON files holding source files, stdin and the
/// expected stdout, stderr and return code. exam writes the sources to a
/// scratch directory, runs the interpreter on the entry file under a timeout
/// and compares what comes back.
///
/// EXAMPLES:
///     exam test                         Run every definition under the script root
///     exam test lists/ -v               Run a subtree, one line per test
///     exam run lists/append.json        Run a definition and show its output
///     exam record lists/append.json     Store the current output as expected
///     exam new lists/insert.json        Create an empty definition
///     exam config set interpreter /usr/local/bin/exin
///
/// ENVIRONMENT VARIABLES:
///     EXAM_INTERPRETER  Interpreter executable
///     EXAM_ENTRY_FILE   File name the interpreter is started on
///     EXAM_TIMEOUT      Timeout per test in seconds
///     EXAM_SCRIPT_ROOT  Root directory of the definitions
///     EXAM_JSON         Set to '1' for JSON test reports by default
///     EXAM_LOG          Log filter (e.g. 'debug', 'exam_core=trace')
///     NO_COLOR          Set to disable colored output
#[derive(Parser)]
#[command(name = "exam")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Interpreter settings shared by every command that executes code
#[derive(clap::Args, Debug, Default)]
struct InterpreterFlags {
    /// Interpreter executable (overrides configuration)
    #[arg(long, short = 'i')]
    interpreter: Option<PathBuf>,
    /// Timeout per execution in seconds
    #[arg(long, short = 't', value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,
    /// File name the interpreter is started on
    #[arg(long)]
    entry_file: Option<String>,
}

impl From<InterpreterFlags> for RunOverrides {
    fn from(flags: InterpreterFlags) -> Self {
        Self {
            interpreter: flags.interpreter,
            timeout: flags.timeout,
            entry_file: flags.entry_file,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run test definitions
    ///
    /// Discovers definition files under PATH (a single file or a directory
    /// searched recursively) and reports PASS, FAIL or EXCEPTION for each.
    /// Exits with status 1 when any test does not pass.
    ///
    /// EXAMPLES:
    ///     exam test                       Run everything under the script root
    ///     exam test lists/                Run one directory
    ///     exam test --filter append       Only paths containing 'append'
    ///     exam test --sequential          Disable parallelism
    ///     exam test --json                Machine-readable report
    #[command(visible_alias = "t")]
    Test {
        /// Definition file or directory (defaults to the script root, then '.')
        path: Option<PathBuf>,
        /// Only run definitions whose path contains this text
        #[arg(long, short = 'f')]
        filter: Option<String>,
        /// Run tests one after another
        #[arg(long)]
        sequential: bool,
        /// Verbose output (one line per test)
        #[arg(long, short = 'v')]
        verbose: bool,
        /// Disable colored output
        #[arg(long, env = "NO_COLOR")]
        no_color: bool,
        /// Output in JSON format
        #[arg(long, env = "EXAM_JSON")]
        json: bool,
        #[command(flatten)]
        interpreter: InterpreterFlags,
    },

    /// Run a definition's sources and show the output
    ///
    /// Executes the sources with the definition's stdin without comparing
    /// anything. Captured stdout goes to stdout, captured stderr to stderr.
    ///
    /// EXAMPLES:
    ///     exam run lists/append.json
    ///     exam run lists/append.json --timeout 30
    #[command(visible_alias = "r")]
    Run {
        /// Definition file
        definition: PathBuf,
        #[command(flatten)]
        interpreter: InterpreterFlags,
    },

    /// Run a definition and store its output as the expected result
    ///
    /// EXAMPLES:
    ///     exam record lists/append.json
    Record {
        /// Definition file
        definition: PathBuf,
        #[command(flatten)]
        interpreter: InterpreterFlags,
    },

    /// Create a new definition with an empty entry file
    ///
    /// The file name must consist of word characters followed by the
    /// definition extension. Existing files are never overwritten.
    ///
    /// EXAMPLES:
    ///     exam new lists/insert.json
    New {
        /// Path of the definition to create
        path: PathBuf,
        /// Entry file name for the skeleton
        #[arg(long)]
        entry_file: Option<String>,
    },

    /// Inspect or change settings
    ///
    /// EXAMPLES:
    ///     exam config show
    ///     exam config set interpreter /usr/local/bin/exin
    ///     exam config set script-root ~/exin-tests
    ///     exam config path
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    ///
    /// EXAMPLES:
    ///     exam completions bash > ~/.bash_completions/exam.bash
    ///     exam completions zsh > ~/.zfunc/_exam
    ///     exam completions fish > ~/.config/fish/completions/exam.fish
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective settings and where they come from
    Show,
    /// Persist a setting in the global configuration file
    Set {
        /// Setting to change
        #[arg(value_enum)]
        key: commands::config::SettingKey,
        /// New value
        value: String,
    },
    /// Print the global configuration file path
    Path,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("EXAM_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Test {
            path,
            filter,
            sequential,
            verbose,
            no_color,
            json,
            interpreter,
        } => {
            let args = commands::test::TestArgs {
                path,
                filter,
                sequential,
                verbose,
                no_color,
                json,
                overrides: interpreter.into(),
            };
            commands::test::run(args)?;
        }
        Commands::Run {
            definition,
            interpreter,
        } => {
            commands::run::run(&definition, &interpreter.into())?;
        }
        Commands::Record {
            definition,
            interpreter,
        } => {
            commands::record::run(&definition, &interpreter.into())?;
        }
        Commands::New { path, entry_file } => {
            commands::new::run(&path, entry_file.as_deref())?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show()?,
            ConfigAction::Set { key, value } => commands::config::set(key, &value)?,
            ConfigAction::Path => commands::config::path()?,
        },
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
        }
    }

    Ok(())
}
