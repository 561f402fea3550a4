use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const PROJECT: &str = include_str!("fixtures/project.pbxproj");

/// A scratch folder holding a copy of the fixture project.
struct Scratch {
  dir: tempfile::TempDir
}

impl Scratch {
  fn new(project: &str) -> Self {
    let dir = tempfile::tempdir().unwrap();
    let bundle = dir.path().join("WigiAI.xcodeproj");
    fs::create_dir(&bundle).unwrap();
    fs::write(bundle.join("project.pbxproj"), project).unwrap();
    Scratch { dir }
  }

  fn path(&self) -> &Path {
    self.dir.path()
  }

  fn project(&self) -> PathBuf {
    self.path().join("WigiAI.xcodeproj").join("project.pbxproj")
  }

  fn read(&self) -> String {
    fs::read_to_string(self.project()).unwrap()
  }

  fn run(&self, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_xcpatch"))
      .args(args)
      .current_dir(self.path())
      .env_remove("XCPATCH_PROJECT")
      .env_remove("XCPATCH_GROUP")
      .env_remove("XCPATCH_PHASE")
      .env_remove("XCPATCH_CONFIG")
      .env_remove("RUST_LOG")
      .output()
      .unwrap()
  }
}

fn stdout(o: &Output) -> String {
  String::from_utf8_lossy(&o.stdout).into_owned()
}

fn stderr(o: &Output) -> String {
  String::from_utf8_lossy(&o.stderr).into_owned()
}

#[test]
fn add_registers_files_in_all_four_regions() {
  let s = Scratch::new(PROJECT);
  let o = s.run(&["-p", "WigiAI.xcodeproj", "add", "A.ext", "B.ext"]);

  assert!(o.status.success(), "{}", stderr(&o));
  assert!(stdout(&o).contains("Added 2 files to"), "{}", stdout(&o));

  let text = s.read();
  for name in &["A.ext", "B.ext"] {
    let refs   = format!("/* {} */ = {{isa = PBXFileReference;", name);
    let child  = format!("/* {} */,\n", name);
    let phase  = format!("/* {} in Sources */,\n", name);
    let builds = format!("/* {} in Sources */ = {{isa = PBXBuildFile;", name);
    assert_eq!(text.matches(&refs).count(), 1);
    assert_eq!(text.matches(&child).count(), 1);
    assert_eq!(text.matches(&phase).count(), 1);
    assert_eq!(text.matches(&builds).count(), 1);
  }
  assert!(text.len() > PROJECT.len());
}

#[test]
fn missing_group_fails_without_touching_the_file() {
  let original = PROJECT.replace("/* Models */", "/* Entities */");
  let s = Scratch::new(&original);
  let o = s.run(&["-p", "WigiAI.xcodeproj", "add", "A.swift"]);

  assert_eq!(o.status.code(), Some(1));
  assert!(stderr(&o).contains("Could not find the Models group"), "{}", stderr(&o));
  assert_eq!(s.read(), original);
}

#[test]
fn group_and_phase_can_be_chosen() {
  let s = Scratch::new(PROJECT);
  let o = s.run(&["-p", "WigiAI.xcodeproj", "-g", "WigiAI", "--phase", "Resources",
                  "add", "Info.plist"]);

  assert!(o.status.success(), "{}", stderr(&o));
  assert!(s.read().contains("/* Info.plist in Resources */,\n"));
}

#[test]
fn files_and_project_come_from_the_config_file() {
  let s = Scratch::new(PROJECT);
  fs::write(s.path().join("Xcpatch.toml"), concat!(
    "[project]\n",
    "path  = \"WigiAI.xcodeproj\"\n",
    "files = [\"Activity.swift\", \"ActivityMigration.swift\"]\n")).unwrap();

  let o = s.run(&[]);
  assert!(o.status.success(), "{}", stderr(&o));
  assert!(stdout(&o).contains("Added 2 files"));

  let text = s.read();
  let first  = text.find("/* Activity.swift in Sources */,").unwrap();
  let second = text.find("/* ActivityMigration.swift in Sources */,").unwrap();
  assert!(first < second);
}

#[test]
fn config_requiring_a_newer_version_is_refused() {
  let s = Scratch::new(PROJECT);
  fs::write(s.path().join("Xcpatch.toml"),
            "[project]\nfiles = [\"A.swift\"]\nmin_xcpatch_version = \"99.0.0\"\n").unwrap();

  let o = s.run(&["-p", "WigiAI.xcodeproj"]);
  assert_eq!(o.status.code(), Some(1));
  assert!(stderr(&o).contains("Min version check failed"), "{}", stderr(&o));
  assert_eq!(s.read(), PROJECT);
}

#[test]
fn nothing_to_add_is_an_error() {
  let s = Scratch::new(PROJECT);
  let o = s.run(&["-p", "WigiAI.xcodeproj", "add"]);

  assert_eq!(o.status.code(), Some(1));
  assert!(stderr(&o).contains("No files to add"), "{}", stderr(&o));
}

#[test]
fn dry_run_prints_without_writing() {
  let s = Scratch::new(PROJECT);
  let o = s.run(&["-p", "WigiAI.xcodeproj", "add", "--dry-run", "A.swift"]);

  assert!(o.status.success(), "{}", stderr(&o));
  assert!(stdout(&o).contains("/* A.swift in Sources */ = {isa = PBXBuildFile;"));
  assert_eq!(s.read(), PROJECT);
}

#[test]
fn check_reports_every_region() {
  let s = Scratch::new(PROJECT);
  let o = s.run(&["-p", "WigiAI.xcodeproj", "check"]);

  assert!(o.status.success(), "{}", stderr(&o));
  let out = stdout(&o);
  assert!(out.contains("found    PBXFileReference section"));
  assert!(out.contains("found    Models group"));
  assert!(out.contains("found    Sources build phase"));
  assert!(out.contains("found    PBXBuildFile section"));
}

#[test]
fn check_fails_on_a_missing_region() {
  let s = Scratch::new(PROJECT);
  let o = s.run(&["-p", "WigiAI.xcodeproj", "-g", "Views", "check"]);

  assert_eq!(o.status.code(), Some(1));
  assert!(stdout(&o).contains("missing  Views group"));
  assert!(stderr(&o).contains("Could not find the Views group"));
  assert_eq!(s.read(), PROJECT);
}

#[test]
fn missing_project_file_is_reported() {
  let s = Scratch::new(PROJECT);
  let o = s.run(&["-p", "Other.xcodeproj", "add", "A.swift"]);

  assert_eq!(o.status.code(), Some(1));
  assert!(stderr(&o).contains("Failed to read project file"), "{}", stderr(&o));
}
