//! Patches Xcode project files.
//!
//! XCode stores a project in a single file named "project.pbxproj", written in
//! the NeXTSTEP property list format. Registering a source file with a target
//! touches four places in that file:
//!
//! - PBXFileReference section: the file itself.
//! - PBXGroup: the group showing the file in the project navigator.
//! - PBXSourcesBuildPhase: the build phase compiling the file.
//! - PBXBuildFile section: the object tying the file to the build phase.
//!
//! The file reference and build file each get a fresh identifier, shared by
//! the records pointing at them. Rather than parsing the whole format, each
//! region is found by its markers and new records are written last inside it.
//! Every region is located again in the text produced by the previous step,
//! since inserting records moves everything after them.
//!
//! This module does no I/O: the caller reads the project once, patches it in
//! memory and writes it back only when every step succeeded.
//!
//! References:
//! - http://monoobjc.net/xcode-project-file-format.html

mod id;
mod insert;
mod record;
mod region;

pub use id::{IdMinter, IdPair};
pub use insert::insert;
pub use record::{FileEntry, Record, RecordKind};
pub use region::{Locator, Region, RegionName};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
  #[error("Could not find the {region}")]
  SectionNotFound { region: RegionName },

  #[error("Invalid file name {name:?}: cannot be written to a project file")]
  InvalidFileName { name: String }
}

/// What the new files are added to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Targets {
  /// Comment label of the PBXGroup receiving the file references.
  pub group: String,
  /// Comment label of the build phase receiving the build files.
  pub phase: String
}

impl Default for Targets {
  fn default() -> Self {
    Targets {
      group: "Models".to_string(),
      phase: "Sources".to_string()
    }
  }
}

/// Progress through a patch. Any failure aborts the whole patch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
  Loaded,
  RefsInserted,
  GroupInserted,
  BuildPhaseInserted,
  BuildFilesInserted
}

impl Stage {
  fn after(region: Region) -> Self {
    match region {
      Region::FileReferences => Stage::RefsInserted,
      Region::Group          => Stage::GroupInserted,
      Region::BuildPhase     => Stage::BuildPhaseInserted,
      Region::BuildFiles     => Stage::BuildFilesInserted
    }
  }
}

fn record_kind(region: Region) -> RecordKind {
  match region {
    Region::FileReferences => RecordKind::FileReference,
    Region::Group          => RecordKind::GroupChild,
    Region::BuildPhase     => RecordKind::BuildPhaseFile,
    Region::BuildFiles     => RecordKind::BuildFile
  }
}

/// A registered file along with the identifiers minted for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Added {
  pub file: FileEntry,
  pub ids:  IdPair
}

#[derive(Debug)]
pub struct Patched {
  pub text:  String,
  pub added: Vec<Added>
}

/// Registers `files`, in order, with the group and build phase in `targets`.
pub fn patch<S: AsRef<str>>(text: &str, files: &[S], targets: &Targets) -> Result<Patched, PatchError> {
  let entries = files.iter()
    .map(|x| FileEntry::new(x.as_ref()))
    .collect::<Result<Vec<_>, _>>()?;

  let mut minter = IdMinter::seeded(text);
  let added = entries.into_iter()
    .map(|file| Added { file, ids: minter.next_pair() })
    .collect::<Vec<_>>();

  for a in &added {
    tracing::debug!(file = %a.file.name, file_ref = %a.ids.file_ref,
                    build_file = %a.ids.build_file, "minted identifiers");
  }

  let locator   = Locator::new(&targets.group, &targets.phase);
  let mut text  = text.to_string();
  let mut stage = Stage::Loaded;
  for &region in &Region::ALL {
    let at = locator.locate(&text, region).map_err(|e| {
      tracing::debug!(?stage, "aborting patch");
      e
    })?;

    let mut fragments = Vec::with_capacity(added.len() + 2);
    fragments.push(at.prefix.clone());
    for a in &added {
      let record = Record {
        kind:  record_kind(region),
        file:  &a.file,
        ids:   &a.ids,
        phase: &targets.phase
      };
      fragments.push(record.render(&at.indent));
    }
    fragments.push(at.suffix.clone());

    // The separator always precedes the records, shifting them by one byte.
    let offset = match at.separator {
      Some(pos) => { text = insert(&text, pos, &[","]); at.at + 1 },
      None      => at.at
    };
    text  = insert(&text, offset, &fragments);
    stage = Stage::after(region);
    tracing::debug!(?stage, region = %locator.name(region), offset, "inserted records");
  }

  debug_assert_eq!(stage, Stage::BuildFilesInserted);
  Ok(Patched { text, added })
}

/// The outcome of looking up one region, without patching anything.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionReport {
  pub name:    RegionName,
  pub matches: usize
}

impl RegionReport {
  pub fn found(&self) -> bool {
    self.matches > 0
  }
}

/// Looks up every region of `text`, reporting how often each one matched.
pub fn scan(text: &str, targets: &Targets) -> Vec<RegionReport> {
  let locator = Locator::new(&targets.group, &targets.phase);
  Region::ALL.iter().map(|&region| {
    RegionReport {
      name:    locator.name(region),
      matches: match locator.locate(text, region) {
        Ok (at) => at.matches,
        Err(_)  => 0
      }
    }
  }).collect()
}
