//! Record fragments written into the project.
//!
//! Every fragment is a single line, terminated by a newline, formatted the
//! way Xcode itself writes the object so the patched file diffs cleanly:
//!
//! ```text
//! <ID> /* Name.swift */ = {isa = PBXFileReference; lastKnownFileType = sourcecode.swift; path = Name.swift; sourceTree = "<group>"; };
//! <ID> /* Name.swift */,
//! <ID> /* Name.swift in Sources */,
//! <ID> /* Name.swift in Sources */ = {isa = PBXBuildFile; fileRef = <ID> /* Name.swift */; };
//! ```

use std::borrow::Cow;
use std::fmt::Write;

use super::id::IdPair;
use super::PatchError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
  /// A PBXFileReference object, listed in its section.
  FileReference,
  /// An entry in the `children` list of a PBXGroup.
  GroupChild,
  /// An entry in the `files` list of a PBXSourcesBuildPhase.
  BuildPhaseFile,
  /// A PBXBuildFile object, listed in its section.
  BuildFile
}

/// A file to register with the project.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileEntry {
  pub name:      String,
  pub file_type: &'static str
}

impl FileEntry {
  pub fn new(name: &str) -> Result<Self, PatchError> {
    if !is_valid_name(name) {
      return Err(PatchError::InvalidFileName { name: name.to_string() });
    }

    let ext = name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    Ok(FileEntry {
      name:      name.to_string(),
      file_type: get_file_type(ext)
    })
  }
}

pub struct Record<'a> {
  pub kind:  RecordKind,
  pub file:  &'a FileEntry,
  pub ids:   &'a IdPair,
  pub phase: &'a str
}

impl<'a> Record<'a> {
  pub fn render(&self, indent: &str) -> String {
    let mut s = String::with_capacity(128);
    let name  = &self.file.name;

    match self.kind {
      RecordKind::FileReference => {
        write!(s, concat!("{indent}{id} /* {name} */ = {{",
                          "isa = PBXFileReference; ",
                          "lastKnownFileType = {ty}; ",
                          "path = {path}; ",
                          "sourceTree = \"<group>\"; }};\n"),
               indent = indent,
               id     = self.ids.file_ref,
               name   = name,
               ty     = self.file.file_type,
               path   = quote(name)).unwrap()
      },
      RecordKind::GroupChild => {
        write!(s, "{}{} /* {} */,\n", indent, self.ids.file_ref, name).unwrap()
      },
      RecordKind::BuildPhaseFile => {
        write!(s, "{}{} /* {} in {} */,\n", indent, self.ids.build_file, name, self.phase).unwrap()
      },
      RecordKind::BuildFile => {
        write!(s, concat!("{indent}{id} /* {name} in {phase} */ = {{",
                          "isa = PBXBuildFile; ",
                          "fileRef = {refid} /* {name} */; }};\n"),
               indent = indent,
               id     = self.ids.build_file,
               name   = name,
               phase  = self.phase,
               refid  = self.ids.file_ref).unwrap()
      }
    }
    s
  }
}

/// Names that would break out of a comment or a quoted string are refused.
fn is_valid_name(name: &str) -> bool {
  !name.is_empty()
    && !name.contains(|c: char| c == '"' || c == '\\' || c.is_control())
    && !name.contains("/*")
    && !name.contains("*/")
}

fn quote(s: &str) -> Cow<'_, str> {
  let plain = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '/' || c == '$';
  match s.is_empty() || !s.chars().all(plain) {
    true  => Cow::Owned(["\"", s, "\""].join("")),
    false => Cow::Borrowed(s)
  }
}

fn get_file_type(ext: &str) -> &'static str {
  match ext {
    "swift"        => "sourcecode.swift",
    "h"            => "sourcecode.c.h",
    "hpp"          => "sourcecode.cpp.h",
    "c"            => "sourcecode.c.c",
    "cc" | "cpp"   => "sourcecode.cpp.cpp",
    "m"            => "sourcecode.c.objc",
    "mm"           => "sourcecode.cpp.objcpp",
    "metal"        => "sourcecode.metal",
    "plist"        => "text.plist.xml",
    "json"         => "text.json",
    "strings"      => "text.plist.strings",
    "storyboard"   => "file.storyboard",
    "xib"          => "file.xib",
    "xcassets"     => "folder.assetcatalog",
    "png"          => "image.png",
    "jpg" | "jpeg" => "image.jpeg",
    "xml"          => "text.xml",
    &_             => "text"
  }
}
