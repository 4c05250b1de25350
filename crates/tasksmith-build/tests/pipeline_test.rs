//! Pipeline scenarios against scratch directory trees.

use std::cell::RefCell;
use std::path::PathBuf;
use tasksmith_build::pipeline::{read_sentinel, sentinel_path};
use tasksmith_build::{BuildOptions, BuildReport, CompileJob, Compiler, DirOutcome, Pipeline};
use tasksmith_core::{Error, Result, TasksmithConfig};
use tempfile::TempDir;

/// Records every job and writes a placeholder binary, failing for packages
/// whose directory name is listed in `fail`.
#[derive(Debug, Default)]
struct FakeCompiler {
    jobs: RefCell<Vec<CompileJob>>,
    fail: Vec<String>,
}

impl FakeCompiler {
    fn failing(names: &[&str]) -> Self {
        Self {
            jobs: RefCell::default(),
            fail: names.iter().map(|n| (*n).to_string()).collect(),
        }
    }

    fn count(&self) -> usize {
        self.jobs.borrow().len()
    }
}

impl Compiler for FakeCompiler {
    fn compile(&self, job: &CompileJob) -> Result<()> {
        self.jobs.borrow_mut().push(job.clone());
        assert!(job.manifest_path.is_file(), "manifest written before compile");

        let name = job
            .package_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.fail.contains(&name) {
            return Err(Error::Compile {
                dir: job.package_dir.clone(),
                code: Some(101),
                output: "error[E0425]: cannot find value".to_string(),
            });
        }

        std::fs::create_dir_all(job.output.parent().unwrap()).unwrap();
        std::fs::write(&job.output, b"binary").unwrap();
        Ok(())
    }
}

struct Workspace {
    _tmp: TempDir,
    root: PathBuf,
    bin: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("project");
        let bin = tmp.path().join("bin");
        std::fs::create_dir_all(&root).unwrap();
        Self {
            _tmp: tmp,
            root,
            bin,
        }
    }

    fn package(&self, sub: Option<&str>, file: &str, text: &str) -> PathBuf {
        let dir = sub.map_or_else(|| self.root.clone(), |s| self.root.join(s));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(file), text).unwrap();
        dir
    }

    fn options(&self) -> BuildOptions {
        BuildOptions::from_config(&TasksmithConfig::default(), &self.bin)
    }
}

const ROOT_SOURCE: &str =
    "#![cfg(tasksmith)]\n/// @default\npub fn slash() -> Result<(), String> { Ok(()) }\n";

fn run(workspace: &Workspace, options: BuildOptions, compiler: &FakeCompiler) -> Result<BuildReport> {
    Pipeline::new(options, compiler)?.run(&workspace.root)
}

#[test]
fn test_second_run_is_a_no_op() {
    let ws = Workspace::new();
    ws.package(None, "katana.rs", ROOT_SOURCE);
    let compiler = FakeCompiler::default();

    let first = run(&ws, ws.options(), &compiler).unwrap();
    assert!(matches!(first.root, DirOutcome::Built { .. }));
    assert_eq!(compiler.count(), 1);
    assert!(ws.bin.join("project").is_file());
    assert!(sentinel_path(&ws.root).is_file());
    assert!(!ws.root.join(".tasksmith/cmd/project").exists());

    let second = run(&ws, ws.options(), &compiler).unwrap();
    assert_eq!(second.root, DirOutcome::UpToDate);
    assert_eq!(second.files_written(), 0);
    assert_eq!(compiler.count(), 1);
}

#[test]
fn test_edit_and_force_trigger_rebuild() {
    let ws = Workspace::new();
    ws.package(None, "katana.rs", ROOT_SOURCE);
    let compiler = FakeCompiler::default();

    run(&ws, ws.options(), &compiler).unwrap();
    let before = read_sentinel(&ws.root).unwrap().unwrap();

    ws.package(None, "katana.rs", &ROOT_SOURCE.replace("slash", "cut"));
    let report = run(&ws, ws.options(), &compiler).unwrap();
    assert!(report.root.is_rebuilt());
    assert_ne!(read_sentinel(&ws.root).unwrap().unwrap(), before);

    let mut forced = ws.options();
    forced.force = true;
    run(&ws, forced, &compiler).unwrap();
    assert_eq!(compiler.count(), 3);
}

#[test]
fn test_failed_sub_package_is_isolated() {
    let ws = Workspace::new();
    ws.package(None, "root.rs", ROOT_SOURCE);
    ws.package(Some("broken"), "broken.rs", "#![cfg(tasksmith)]\npub fn oops() {}\n");
    ws.package(Some("good"), "good.rs", "#![cfg(tasksmith)]\npub fn fine() {}\n");
    let compiler = FakeCompiler::failing(&["broken"]);

    let report = run(&ws, ws.options(), &compiler).unwrap();

    assert!(report.subs["broken"].is_failed());
    assert!(matches!(report.subs["good"], DirOutcome::Built { .. }));
    assert!(matches!(report.root, DirOutcome::Built { .. }));
    assert!(ws.bin.join("good").is_file());
    assert!(ws.bin.join("project").is_file());
    assert!(!ws.bin.join("broken").exists());
    assert!(read_sentinel(&ws.root.join("broken")).unwrap().is_none());

    let failures = report.failures();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].1.contains("exit code 101"));
}

#[test]
fn test_root_failure_fails_the_run() {
    let ws = Workspace::new();
    ws.package(None, "root.rs", ROOT_SOURCE);
    let compiler = FakeCompiler::failing(&["project"]);

    let err = run(&ws, ws.options(), &compiler).unwrap_err();
    assert!(err.is_compile_error());
    assert!(read_sentinel(&ws.root).unwrap().is_none());
}

#[test]
fn test_rebuilt_sub_package_rebuilds_root() {
    let ws = Workspace::new();
    ws.package(None, "root.rs", ROOT_SOURCE);
    ws.package(Some("db"), "db.rs", "#![cfg(tasksmith)]\npub fn migrate() {}\n");
    let compiler = FakeCompiler::default();

    run(&ws, ws.options(), &compiler).unwrap();
    assert_eq!(compiler.count(), 2);

    ws.package(Some("db"), "db.rs", "#![cfg(tasksmith)]\npub fn migrate_all() {}\n");
    let report = run(&ws, ws.options(), &compiler).unwrap();
    assert!(report.subs["db"].is_rebuilt());
    assert!(report.root.is_rebuilt());
    assert_eq!(compiler.count(), 4);
}

#[test]
fn test_skip_build_leaves_sources_without_sentinel() {
    let ws = Workspace::new();
    ws.package(None, "katana.rs", ROOT_SOURCE);
    let compiler = FakeCompiler::default();

    let mut options = ws.options();
    options.skip_build = true;
    let report = run(&ws, options, &compiler).unwrap();

    let DirOutcome::Generated { crate_dir, files } = &report.root else {
        panic!("expected generated outcome, got {:?}", report.root);
    };
    assert_eq!(*files, 4);
    assert!(crate_dir.join("src/tasks/katana.rs").is_file());
    assert_eq!(compiler.count(), 0);
    assert!(read_sentinel(&ws.root).unwrap().is_none());
}

#[test]
fn test_skip_sub_builds_only_root() {
    let ws = Workspace::new();
    ws.package(None, "root.rs", ROOT_SOURCE);
    ws.package(Some("db"), "db.rs", "#![cfg(tasksmith)]\npub fn migrate() {}\n");
    let compiler = FakeCompiler::default();

    let mut options = ws.options();
    options.skip_sub = true;
    let report = run(&ws, options, &compiler).unwrap();

    assert!(report.subs.is_empty());
    assert_eq!(compiler.count(), 1);
}

#[test]
fn test_sources_without_tasks_are_skipped() {
    let ws = Workspace::new();
    ws.package(None, "helpers.rs", "#![cfg(tasksmith)]\nfn private() {}\n");
    ws.package(Some("docs"), "README.md", "# docs\n");
    let compiler = FakeCompiler::default();

    let report = run(&ws, ws.options(), &compiler).unwrap();
    assert_eq!(report.root, DirOutcome::Skipped);
    assert_eq!(report.subs["docs"], DirOutcome::Skipped);
    assert_eq!(compiler.count(), 0);
    assert!(read_sentinel(&ws.root).unwrap().is_none());
}

#[test]
fn test_invalid_sub_package_does_not_stop_root() {
    let ws = Workspace::new();
    ws.package(None, "root.rs", ROOT_SOURCE);
    ws.package(
        Some("dup"),
        "dup.rs",
        "#![cfg(tasksmith)]\n/// @default\npub fn a() {}\n/// @default\npub fn b() {}\n",
    );
    let compiler = FakeCompiler::default();

    let report = run(&ws, ws.options(), &compiler).unwrap();
    assert!(report.subs["dup"].is_failed());
    assert!(report.root.is_rebuilt());
}
