mod add;
mod check;

use std::path::Path;

use crate::ctx::{Commands, DynResult};

pub fn init() -> Commands {
  let mut commands = Commands::new();
  commands.insert("add",   Box::new(add::Add));
  commands.insert("check", Box::new(check::Check));
  commands
}

fn read_project(path: &Path) -> DynResult<String> {
  std::fs::read_to_string(path)
    .map_err(|e| format!("Failed to read project file ({:?}): {}", path, e).into())
}
