use clap::{App, Arg};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::ctx::{Command, Context, RunResult};
use crate::pbx;

pub struct Add;

impl Command for Add {
  fn init<'a, 'b>(&self, cmd: App<'a, 'b>) -> App<'a, 'b> {
    cmd.about("Registers source files with the project")
      .arg(Arg::with_name("FILES")
           .help("Names of the files to add, defaults to the configured list")
           .multiple(true))
      .arg(Arg::with_name("dry-run")
           .short("n")
           .long("dry-run")
           .help("Prints the patched project instead of writing it"))
  }

  fn run(&self, ctx: &Context) -> RunResult {
    let args    = ctx.args.subcommand_matches("add");
    let files   = ctx.files(args)?;
    let text    = super::read_project(&ctx.project)?;
    let patched = pbx::patch(&text, &files[..], &ctx.targets)?;

    for a in &patched.added {
      tracing::info!(file = %a.file.name, file_ref = %a.ids.file_ref,
                     build_file = %a.ids.build_file, "registered");
    }

    if args.map_or(false, |x| x.is_present("dry-run")) {
      print!("{}", patched.text);
      return Ok(());
    }

    write_project(&ctx.project, &patched.text)?;

    let n = patched.added.len();
    println!("Added {} {} to {}", n, if n == 1 { "file" } else { "files" }, ctx.project.display());
    Ok(())
  }
}

/// Replaces the project file in one step, so readers never see a partial file.
fn write_project(path: &Path, text: &str) -> RunResult {
  let dir = match path.parent() {
    Some(p) if !p.as_os_str().is_empty() => p,
    _                                    => Path::new(".")
  };

  let perms = fs::metadata(path)?.permissions();

  let mut f = NamedTempFile::new_in(dir)?;
  f.write_all(text.as_bytes())?;
  f.flush()?;
  f.as_file().set_permissions(perms)?;
  f.as_file().sync_all()?;
  f.persist(path)?;

  tracing::debug!(path = %path.display(), bytes = text.len(), "wrote project");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn write_replaces_the_whole_file() {
    let dir  = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.pbxproj");
    fs::write(&path, "a much longer original content\n").unwrap();

    write_project(&path, "short\n").unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "short\n");

    // No temporary file is left behind.
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
  }

  #[cfg(unix)]
  #[test]
  fn write_keeps_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let dir  = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.pbxproj");
    fs::write(&path, "x").unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

    write_project(&path, "y").unwrap();
    assert_eq!(fs::metadata(&path).unwrap().permissions().mode() & 0o777, 0o644);
  }
}
