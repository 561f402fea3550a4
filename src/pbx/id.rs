//! Object identifiers.
//!
//! Xcode identifies every object with a 96-bit value written as 24 uppercase
//! hexadecimal digits. New identifiers are taken from version 4 UUIDs; the
//! minter also refuses any value already present in the project.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use uuid::Uuid;

/// Length of an object identifier, in hexadecimal digits.
pub const ID_LEN: usize = 24;

/// The two identifiers minted for every registered file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdPair {
  /// Names the PBXFileReference. Used by the file reference and its group.
  pub file_ref:   String,
  /// Names the PBXBuildFile. Used by the build file and its build phase.
  pub build_file: String
}

pub fn random_id() -> String {
  let uuid  = Uuid::new_v4();
  let bytes = &uuid.as_bytes()[.. ID_LEN / 2];

  let mut id = String::with_capacity(ID_LEN);
  for b in bytes {
    id.push(hex_char(b >> 4));
    id.push(hex_char(b & 0xF));
  }
  id
}

fn hex_char(b: u8) -> char {
  match b < 10 {
    true  => (b'0' + b)        as char,
    false => (b'A' + (b - 10)) as char
  }
}

/// Mints identifiers unique within one run and against an existing project.
pub struct IdMinter {
  used: HashSet<String>
}

impl IdMinter {
  pub fn new() -> Self {
    IdMinter { used: HashSet::new() }
  }

  /// Creates a minter that will never return an identifier already in `text`.
  pub fn seeded(text: &str) -> Self {
    let mut minter = Self::new();
    minter.used.extend(existing_ids(text).map(String::from));
    minter
  }

  pub fn next_id(&mut self) -> String {
    loop {
      let id = random_id();
      if self.used.insert(id.clone()) {
        return id;
      }
      tracing::debug!(%id, "identifier collision, drawing again");
    }
  }

  pub fn next_pair(&mut self) -> IdPair {
    IdPair {
      file_ref:   self.next_id(),
      build_file: self.next_id()
    }
  }
}

fn existing_ids(text: &str) -> impl Iterator<Item = &str> {
  id_regex().find_iter(text).map(|m| m.as_str())
}

fn id_regex() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"\b[0-9A-F]{24}\b").unwrap())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ids_are_24_uppercase_hex_digits() {
    for _ in 0 .. 100 {
      let id = random_id();
      assert_eq!(id.len(), ID_LEN);
      assert!(id.chars().all(|c| c.is_ascii_digit() || ('A' ..= 'F').contains(&c)), "{}", id);
    }
  }

  #[test]
  fn minted_ids_never_repeat() {
    let mut minter = IdMinter::new();
    let mut seen   = HashSet::new();
    for _ in 0 .. 10_000 {
      let pair = minter.next_pair();
      assert_ne!(pair.file_ref, pair.build_file);
      assert!(seen.insert(pair.file_ref));
      assert!(seen.insert(pair.build_file));
    }
  }

  #[test]
  fn seeded_minter_knows_existing_ids() {
    let text = "\t\t1A0000000000000000000011 /* A.swift */ = {isa = PBXFileReference; };\n";
    let minter = IdMinter::seeded(text);
    assert!(minter.used.contains("1A0000000000000000000011"));
    assert_eq!(minter.used.len(), 1);
  }

  #[test]
  fn hex_char_covers_all_nibbles() {
    let s: String = (0 .. 16).map(hex_char).collect();
    assert_eq!(s, "0123456789ABCDEF");
  }
}
