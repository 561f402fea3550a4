//! Locates the regions of a project file that receive new records.
//!
//! Two kinds of regions exist. Object sections are delimited by comments:
//!
//! ```text
//! /* Begin PBXFileReference section */
//! <OBJECT-ID> /* <OBJECT-NAME> */ = <OBJECT-PROPERTIES-DICTIONARY>;
//! /* End PBXFileReference section */
//! ```
//!
//! Lists are array properties of a single object, found through the comment
//! naming that object:
//!
//! ```text
//! <OBJECT-ID> /* Models */ = {
//!   isa = PBXGroup;
//!   children = (
//!     <OBJECT-ID> /* <CHILD-NAME> */,
//!   );
//! ```
//!
//! New records always go last: right before the end marker of a section, or
//! right before the closing parenthesis of a list.

use regex::Regex;
use std::fmt::{self, Display};

use super::PatchError;

const SECTION_INDENT: &str = "\t\t";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Region {
  /// The PBXFileReference object section.
  FileReferences,
  /// The `children` list of the target group.
  Group,
  /// The `files` list of the target build phase.
  BuildPhase,
  /// The PBXBuildFile object section.
  BuildFiles
}

impl Region {
  /// Regions in the order they are patched.
  pub const ALL: [Region; 4] = [
    Region::FileReferences,
    Region::Group,
    Region::BuildPhase,
    Region::BuildFiles
  ];
}

/// A region paired with the names it is looked up by, for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionName {
  pub region: Region,
  pub label:  String
}

impl Display for RegionName {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self.region {
      Region::FileReferences => write!(f, "PBXFileReference section"),
      Region::Group          => write!(f, "{} group", self.label),
      Region::BuildPhase     => write!(f, "{} build phase", self.label),
      Region::BuildFiles     => write!(f, "PBXBuildFile section")
    }
  }
}

/// Where to insert new records, and how to lay them out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Insertion {
  /// Byte offset in the text the region was located in.
  pub at:     usize,
  /// Leading whitespace of every new record.
  pub indent: String,
  /// Text to write before the records. Only set when opening an inline list.
  pub prefix: String,
  /// Text to write after the records. Only set when opening an inline list.
  pub suffix: String,
  /// Byte offset where a `,` must go to terminate the last list item, when
  /// it was written without one. Always before `at`.
  pub separator: Option<usize>,
  /// How many times the region's pattern matched.
  pub matches: usize
}

pub struct Locator {
  group:       String,
  phase:       String,
  file_refs:   Regex,
  group_list:  Regex,
  phase_list:  Regex,
  build_files: Regex
}

impl Locator {
  pub fn new(group: &str, phase: &str) -> Self {
    Locator {
      group:       group.to_string(),
      phase:       phase.to_string(),
      file_refs:   section_regex("PBXFileReference"),
      group_list:  list_regex(group, "children"),
      phase_list:  list_regex(phase, "files"),
      build_files: section_regex("PBXBuildFile")
    }
  }

  pub fn name(&self, region: Region) -> RegionName {
    let label = match region {
      Region::Group      => self.group.clone(),
      Region::BuildPhase => self.phase.clone(),
      _                  => String::new()
    };
    RegionName { region, label }
  }

  fn regex(&self, region: Region) -> &Regex {
    match region {
      Region::FileReferences => &self.file_refs,
      Region::Group          => &self.group_list,
      Region::BuildPhase     => &self.phase_list,
      Region::BuildFiles     => &self.build_files
    }
  }

  /// Finds where new records go in `text`. The first match wins when the
  /// pattern is ambiguous.
  pub fn locate(&self, text: &str, region: Region) -> Result<Insertion, PatchError> {
    let re   = self.regex(region);
    let caps = re.captures(text).ok_or_else(|| PatchError::SectionNotFound {
      region: self.name(region)
    })?;

    let matches = re.find_iter(text).count();
    if matches > 1 {
      tracing::warn!(region = %self.name(region), matches,
                     "pattern is ambiguous, using the first match");
    }

    // Group 1 is the section body or the list contents; both end right
    // before the closing delimiter.
    let body = match caps.get(1) {
      Some(m) => m,
      None    => unreachable!("region patterns always capture their body")
    };

    let mut insertion = match region {
      Region::FileReferences | Region::BuildFiles => section_insertion(text, body.start(), body.end()),
      Region::Group | Region::BuildPhase          => list_insertion(text, body.start(), body.end())
    };
    insertion.matches = matches;
    Ok(insertion)
  }
}

fn section_regex(name: &str) -> Regex {
  let pattern = format!(r"(?s)/\*\s*Begin {name} section\s*\*/(.*?)/\*\s*End {name} section\s*\*/",
                        name = name);
  compile(&pattern)
}

fn list_regex(label: &str, field: &str) -> Regex {
  // Item comments hold file names verbatim, parentheses included.
  let pattern = format!(concat!(r"(?s)\b[0-9A-Fa-f]{{24}}\s*/\*\s*{label}\s*\*/\s*=\s*\{{",
                                r"[^}}]*?\b{field}\s*=\s*\(((?:/\*.*?\*/|[^)])*)\)\s*;"),
                        label = regex::escape(label),
                        field = field);
  compile(&pattern)
}

fn compile(pattern: &str) -> Regex {
  match Regex::new(pattern) {
    Ok (re) => re,
    Err(e)  => unreachable!("invalid region pattern {}: {}", pattern, e)
  }
}

/// The body runs from after the begin marker to the start of the end marker.
/// Records go at the start of the end marker's line.
fn section_insertion(text: &str, start: usize, end: usize) -> Insertion {
  let body = &text[start .. end];
  let (at, prefix) = match closing_line_start(body) {
    Some(offset) => (start + offset, String::new()),
    // The end marker shares a line with the last record.
    None         => (end, "\n".to_string())
  };

  // Reuse the indentation of the last record, if any.
  let indent = body[.. at - start].lines()
    .rev()
    .find(|line| !line.trim().is_empty())
    .map(leading_whitespace)
    .filter(|ws| !ws.is_empty())
    .unwrap_or(SECTION_INDENT)
    .to_string();

  Insertion { at, indent, prefix, suffix: String::new(), separator: None, matches: 1 }
}

/// The body runs from after `(` to right before `)`. Records go at the start
/// of the closing parenthesis' line, one level deeper than it.
fn list_insertion(text: &str, start: usize, end: usize) -> Insertion {
  let body      = &text[start .. end];
  let separator = missing_separator(body).map(|offset| start + offset);
  match closing_line_start(body) {
    Some(offset) => Insertion {
      at:      start + offset,
      indent:  [&body[offset ..], "\t"].join(""),
      prefix:  String::new(),
      suffix:  String::new(),
      separator,
      matches: 1
    },
    None => {
      // Inline list, e.g. `children = ();`. Open it onto its own lines,
      // closing at the indentation of the line holding the property.
      let property = &text[line_start(text, start) .. start];
      let outer    = leading_whitespace(property);
      Insertion {
        at:      end,
        indent:  [outer, "\t"].join(""),
        prefix:  "\n".to_string(),
        suffix:  outer.to_string(),
        separator,
        matches: 1
      }
    }
  }
}

/// Offset, within `body`, right after the last list item when that item is
/// not followed by a comma. Comments after the item belong to it.
fn missing_separator(body: &str) -> Option<usize> {
  let item_end = body.trim_end().len();
  let mut rest = &body[.. item_end];
  loop {
    rest = rest.trim_end();
    match rest.ends_with("*/") {
      true  => rest = &rest[.. rest.rfind("/*")?],
      false => break
    }
  }

  match rest.is_empty() || rest.ends_with(',') {
    true  => None,
    false => Some(item_end)
  }
}

/// Offset, within `body`, of the line holding the closing delimiter; only
/// when that line holds nothing but whitespace before it.
fn closing_line_start(body: &str) -> Option<usize> {
  let newline = body.rfind('\n')?;
  let tail    = &body[newline + 1 ..];
  match tail.chars().all(|c| c == ' ' || c == '\t') {
    true  => Some(newline + 1),
    false => None
  }
}

fn line_start(text: &str, pos: usize) -> usize {
  text[.. pos].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

fn leading_whitespace(line: &str) -> &str {
  let trimmed = line.trim_start_matches(|c: char| c == ' ' || c == '\t');
  &line[.. line.len() - trimmed.len()]
}
