#![allow(clippy::write_with_newline)]

mod cmd;
mod ctx;
mod pbx;

use clap::{Arg, App, SubCommand};
use semver::Version;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn main() {
  // Initialize.
  let commands = cmd::init();

  // Parse the environment variables.
  let env = ctx::Env::from_env()
    .check(|| "Failed to parse environment variables");

  // Parse the command line.
  let args = App::new(env!("CARGO_PKG_NAME"))
    .version(env!("CARGO_PKG_VERSION"))
    .author(env!("CARGO_PKG_AUTHORS"))
    .about(env!("CARGO_PKG_DESCRIPTION"))
    .arg(Arg::with_name("project")
         .short("p")
         .long("project")
         .value_name("FILE")
         .help("Path to the project.pbxproj file or its .xcodeproj folder")
         .takes_value(true))
    .arg(Arg::with_name("group")
         .short("g")
         .long("group")
         .value_name("NAME")
         .help("Group receiving the new files [default: Models]")
         .takes_value(true))
    .arg(Arg::with_name("phase")
         .long("phase")
         .value_name("NAME")
         .help("Build phase compiling the new files [default: Sources]")
         .takes_value(true))
    .arg(Arg::with_name("config")
         .short("c")
         .long("config")
         .value_name("FILE")
         .help("Name of the configuration file [default: Xcpatch.toml]")
         .takes_value(true))
    .arg(Arg::with_name("verbose")
         .short("v")
         .long("verbose")
         .multiple(true)
         .help("Verbosity level"))
    .subcommands(commands.iter().map(|(name, cmd)| {
      cmd.init(SubCommand::with_name(*name))
    }))
    .get_matches();

  init_tracing(args.occurrences_of("verbose"));

  // Load the configuration file. Only an explicitly named one must exist.
  let named       = args.value_of("config").or_else(|| env.config.as_deref());
  let config_path = PathBuf::from(named.unwrap_or(ctx::DEFAULT_CONFIG));
  let config      = load_config(&config_path, named.is_some())
    .check(|| format!("Failed to load config file ({:?})", config_path));

  is_supported(&config.min_xcpatch_version).check(|| "Min version check failed");

  let config_dir = config_path.parent().map(Path::to_path_buf).unwrap_or_default();

  // Execute the requested command.
  let ctx = ctx::Context::new(commands, &args, &env, &config, config_dir);

  let cmd_name = ctx.args.subcommand_name().unwrap_or("add");
  tracing::debug!(command = cmd_name, project = %ctx.project.display(),
                  group = %ctx.targets.group, phase = %ctx.targets.phase, "running");

  ctx.commands[cmd_name].run(&ctx)
    .check(|| format!("Failed to run command ({})", cmd_name));
}

/// `RUST_LOG` takes precedence over the verbosity flags. Logs go to stderr,
/// leaving stdout to command output.
fn init_tracing(verbosity: u64) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
    EnvFilter::new(match verbosity {
      0 => "warn",
      1 => "info",
      2 => "debug",
      _ => "trace"
    })
  });

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .init();
}

fn load_config(path: &Path, required: bool) -> ctx::DynResult<ctx::Config> {
  match std::fs::read(path) {
    Ok(bytes) => Ok(ctx::Config::parse(&bytes)?),
    Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
      tracing::debug!(path = ?path, "no config file, using defaults");
      Ok(ctx::Config::default())
    },
    Err(e) => Err(Box::new(e))
  }
}

fn is_supported(min_version: &str) -> ctx::DynResult<()> {
  if !min_version.is_empty() {
    let expected = Version::parse(min_version)?;
    let current  = Version::parse(env!("CARGO_PKG_VERSION"))?;
    if expected > current {
      return Err(Box::new(ctx::ConfigError::MinVersion { expected, current }))
    }
  }
  Ok(())
}

trait Check {
  type R;
  fn check<F, S>(self, msg: F) -> Self::R where F: FnOnce() -> S, S: Display;
}

impl<T, E> Check for Result<T, E> where E: Display {
  type R = T;
  fn check<F, S>(self, msg: F) -> Self::R where F: FnOnce() -> S, S: Display {
    match self {
      Ok (v) => v,
      Err(e) => fatal(format!("{}: {}", msg(), e))
    }
  }
}

fn fatal<S: Display>(msg: S) -> ! {
  eprintln!("{}", msg);
  std::process::exit(1)
}
