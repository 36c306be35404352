//! RCC CLI
//!
//! Entry point for the `rcc` command-line tool.

use clap::{Args, CommandFactory, Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use rcc::config::{ConfigOrigin, OptionLayer, Overlay};
use rcc::credentials::{KeyringCommand, Secret};
use rcc::host::{Artifact, HttpConfig, HttpTransport, SessionError};
use rcc::vcs::Mercurial;
use rcc::{DiagnosticRenderer, Environment, Error, ExplicitOptions, OptionResolver};

#[derive(Parser)]
#[command(name = "rcc")]
#[command(about = "Build mbed programs on the online compiler", version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    compile: CompileArgs,

    /// Log requests and resolved options
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Log everything, including suppressed build messages
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the merged config overlay and where it came from
    Config,
}

#[derive(Args)]
struct CompileArgs {
    /// Repository URL of the program (default: the working copy's default path)
    #[arg(long, short = 'r')]
    repository: Option<String>,

    /// Online compiler username
    #[arg(long, short = 'u', env = "RCC_USERNAME")]
    username: Option<String>,

    /// Target platform, e.g. K64F
    #[arg(long, short = 'b')]
    platform: Option<String>,

    /// Online compiler password (default: looked up with keyring)
    #[arg(long, short = 'p', env = "RCC_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Directory the binary is written to (default: current directory)
    #[arg(long, short = 'd')]
    output_dir: Option<PathBuf>,

    /// Send this file's local content with the build (repeatable)
    #[arg(long = "replace-file", short = 'f')]
    replace_files: Vec<PathBuf>,

    /// Remove the stored password before compiling
    #[arg(long)]
    delete_password: bool,

    /// Request a clean build
    #[arg(long)]
    clean: bool,

    /// Extra preprocessor symbols
    #[arg(long)]
    extra_symbols: Option<String>,

    /// API endpoint of the online compiler
    #[arg(long)]
    endpoint: Option<String>,
}

impl CompileArgs {
    fn into_explicit(self) -> ExplicitOptions {
        ExplicitOptions {
            values: OptionLayer {
                repository: self.repository,
                username: self.username,
                password: self.password.map(Secret::new),
                platform: self.platform,
                output_dir: self.output_dir,
                replace_files: if self.replace_files.is_empty() {
                    None
                } else {
                    Some(self.replace_files)
                },
                clean: if self.clean { Some(true) } else { None },
                extra_symbols: self.extra_symbols,
                endpoint: self.endpoint,
                poll_attempts: None,
                poll_interval_seconds: None,
            },
            delete_password: self.delete_password,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.debug);

    match cli.command {
        Some(Commands::Config) => run_config(),
        None => match run_compile(cli.compile) {
            Ok(artifact) => {
                println!("Binary written to {} ({} bytes)", artifact.path.display(), artifact.size);
            }
            Err(e) => {
                report(&e);
                process::exit(e.exit_code());
            }
        },
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the flags.
fn init_tracing(verbose: bool, debug: bool) {
    let level = if debug {
        "trace"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .try_init()
        .ok();
}

fn run_compile(args: CompileArgs) -> rcc::Result<Artifact> {
    let env = Environment::from_process()?;
    let overlay = Overlay::load(env.home.as_deref(), &env.cwd)?;

    let vcs = Mercurial::detect(&env.cwd);
    let store = KeyringCommand::detect();
    let resolver = OptionResolver::new(&vcs, &store);

    let options = resolver.resolve(&args.into_explicit(), &overlay, &env)?;
    let credentials = resolver.resolve_credentials(&options)?;

    let config = HttpConfig {
        endpoint: options.endpoint.clone(),
        ..HttpConfig::default()
    };
    let transport = Arc::new(HttpTransport::new(config, credentials)?);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    rcc::compile(&options, transport, &DiagnosticRenderer::new(), &mut out)
}

fn report(err: &Error) {
    eprintln!("Error: {}", err);
    match err {
        Error::Configuration(_) => {
            eprintln!();
            eprintln!("{}", Cli::command().render_help());
        }
        Error::Session(session) => {
            if let SessionError::Api { status, body, .. } = session {
                eprintln!("HTTP status: {}", status);
                eprintln!("Response body: {}", body);
            }
            if let Some(trace) = session.trace() {
                eprintln!();
                eprintln!("Request trace:");
                eprint!("{}", trace);
            }
        }
        _ => {}
    }
}

fn run_config() {
    let env = match Environment::from_process() {
        Ok(env) => env,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let overlay = match Overlay::load(env.home.as_deref(), &env.cwd) {
        Ok(overlay) => overlay,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(2);
        }
    };

    if overlay.sources.is_empty() {
        println!("No config files found");
    } else {
        println!("Sources (lowest precedence first):");
        for source in &overlay.sources {
            let origin = match source.origin {
                ConfigOrigin::Home => "home",
                ConfigOrigin::Cwd => "cwd",
            };
            println!("  {:<5} {} sha256:{}", origin, source.path.display(), source.digest);
        }
    }

    match overlay.options.to_toml() {
        Ok(toml) => {
            println!();
            print!("{}", toml);
        }
        Err(e) => {
            eprintln!("Error rendering config: {}", e);
            process::exit(1);
        }
    }
}
