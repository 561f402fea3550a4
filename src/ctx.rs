use clap::{App, ArgMatches};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::pbx::Targets;

pub trait Command {
  fn init<'a, 'b>(&self, cmd: App<'a, 'b>) -> App<'a, 'b>;

  fn run(&self, ctx: &Context) -> RunResult;
}

pub type DynResult<T> = Result<T, Box<dyn std::error::Error>>;
pub type RunResult    = DynResult<()>;

pub type Commands = BTreeMap<&'static str, Box<dyn Command>>;

pub const DEFAULT_CONFIG:  &str = "Xcpatch.toml";
pub const DEFAULT_PROJECT: &str = "project.pbxproj";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("Project requires xcpatch {expected} but running {current}")]
  MinVersion { expected: semver::Version, current: semver::Version },

  #[error("No files to add")]
  NoFiles,

  #[error("Pattern {pattern:?} did not match any file")]
  NoMatch { pattern: String }
}

pub struct Context<'a> {
  pub commands: Commands,

  pub args:   &'a ArgMatches<'a>,
  pub config: &'a Config,

  /// Directory relative paths in the configuration file are resolved from.
  pub config_dir: PathBuf,
  pub project:    PathBuf,
  pub targets:    Targets
}

impl<'a> Context<'a> {
  pub fn new(commands: Commands, args: &'a ArgMatches<'a>, env: &'a Env,
             config: &'a Config, config_dir: PathBuf) -> Self
  {
    let project = match args.value_of("project").or_else(|| env.project.as_deref()) {
      Some(p) => project_file(PathBuf::from(p)),
      None    => match &config.path {
        Some(p) => project_file(config_dir.join(p)),
        None    => PathBuf::from(DEFAULT_PROJECT)
      }
    };

    let defaults = Targets::default();
    let targets  = Targets {
      group: pick(args.value_of("group"), &env.group, &config.group, &defaults.group),
      phase: pick(args.value_of("phase"), &env.phase, &config.phase, &defaults.phase)
    };

    Context { commands, args, config, config_dir, project, targets }
  }

  /// Files named on the command line, or else listed in the configuration.
  pub fn files(&self, cmd: Option<&ArgMatches>) -> DynResult<Vec<String>> {
    let files = match cmd.and_then(|x| x.values_of("FILES")) {
      Some(values) => values.map(String::from).collect(),
      None         => expand_files(&self.config_dir, &self.config.files)?
    };

    match files.is_empty() {
      true  => Err(Box::new(ConfigError::NoFiles)),
      false => Ok(files)
    }
  }
}

/// Command line first, then environment, then configuration file.
fn pick(arg: Option<&str>, env: &Option<String>, cfg: &Option<String>, default: &str) -> String {
  arg.or_else(|| env.as_deref())
    .or_else(|| cfg.as_deref())
    .unwrap_or(default)
    .to_string()
}

/// Resolves a path to an ".xcodeproj" bundle to the project file inside it.
pub fn project_file(path: PathBuf) -> PathBuf {
  match path.extension().and_then(|x| x.to_str()) {
    Some("xcodeproj") => path.join(DEFAULT_PROJECT),
    _                 => path
  }
}

/// Expands glob patterns into file names. Plain names are kept as they are.
pub fn expand_files(dir: &Path, patterns: &[String]) -> DynResult<Vec<String>> {
  let mut files = Vec::new();
  for pattern in patterns {
    if !pattern.contains(|c: char| c == '*' || c == '?' || c == '[') {
      files.push(pattern.clone());
      continue;
    }

    let before = files.len();
    let full   = dir.join(pattern);
    for m in glob::glob(&full.to_string_lossy())? {
      let path = m?;
      if let Some(name) = path.file_name().and_then(|x| x.to_str()) {
        files.push(name.to_string());
      }
    }

    if files.len() == before {
      return Err(Box::new(ConfigError::NoMatch { pattern: pattern.clone() }));
    }
  }
  Ok(files)
}

/// Environment variables, read with the `XCPATCH_` prefix.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Env {
  pub project: Option<String>,
  pub group:   Option<String>,
  pub phase:   Option<String>,
  pub config:  Option<String>
}

impl Env {
  pub fn from_env() -> Result<Self, envy::Error> {
    envy::prefixed("XCPATCH_").from_env()
  }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
  #[serde(default)]
  #[serde(rename = "project")]
  pub info: ProjectInfo
}

impl std::ops::Deref for Config {
  type Target = ProjectInfo;

  fn deref(&self) -> &ProjectInfo {
    &self.info
  }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct ProjectInfo {
  pub path:  Option<String>,
  pub group: Option<String>,
  pub phase: Option<String>,
  pub files: Vec<String>,

  pub min_xcpatch_version: String
}

impl Config {
  pub fn parse(bytes: &[u8]) -> Result<Self, toml::de::Error> {
    toml::from_slice(bytes)
  }
}
