use clap::{App};

use crate::ctx::{Command, Context, RunResult};
use crate::pbx::{self, PatchError};

pub struct Check;

impl Command for Check {
  fn init<'a, 'b>(&self, cmd: App<'a, 'b>) -> App<'a, 'b> {
    cmd.about("Checks whether every region patched by 'add' can be found")
  }

  fn run(&self, ctx: &Context) -> RunResult {
    let text    = super::read_project(&ctx.project)?;
    let reports = pbx::scan(&text, &ctx.targets);

    for r in &reports {
      match r.matches {
        0 => println!("missing  {}", r.name),
        1 => println!("found    {}", r.name),
        n => println!("found    {} ({} matches, the first one is used)", r.name, n)
      }
    }

    match reports.into_iter().find(|r| !r.found()) {
      Some(r) => Err(Box::new(PatchError::SectionNotFound { region: r.name })),
      None    => Ok(())
    }
  }
}
