//! End-to-end runs of the relocation protocol against real temp directories.
//! Links are directory symlinks here, so these only run on Unix.
#![cfg(unix)]

use assert_fs::TempDir;
use assert_fs::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use junction_move::fs_ops::{BulkTool, CopyOptions};
use junction_move::prelude::*;
use junction_move::report::RecordingReporter;

/// Says yes to everything and never picks anything for an existing target.
struct AlwaysYes;

impl Frontend for AlwaysYes {
    fn confirm(&mut self, _question: &Question) -> anyhow::Result<bool> {
        Ok(true)
    }
    fn choose_existing_target(&mut self, _target: &Path) -> anyhow::Result<TargetChoice> {
        Ok(TargetChoice::Abort)
    }
    fn reenter_target(&mut self, _current: &Path) -> anyhow::Result<Option<PathBuf>> {
        Ok(None)
    }
}

struct QuietMachine;

impl Advisory for QuietMachine {
    fn is_elevated(&self) -> bool {
        false
    }
    fn matching_processes(&self) -> Vec<String> {
        Vec::new()
    }
    fn free_space(&self, _path: &Path) -> Option<u64> {
        None
    }
}

fn manual_ops() -> SystemOps {
    SystemOps::new(CopyOptions {
        bulk_tool: None,
        retries: 1,
    })
}

fn seed_source(root: &TempDir) -> PathBuf {
    let src = root.child("app");
    src.child("models/a.gguf").write_str("weights").unwrap();
    src.child("settings.json").write_str("{}").unwrap();
    src.path().to_path_buf()
}

fn run(request: RelocateRequest, ops: &SystemOps) -> (Outcome, RecordingReporter) {
    let rec = RecordingReporter::new();
    let decision = prepare(&request, &mut AlwaysYes, &QuietMachine, ops, &rec).unwrap();
    let Decision::Proceed(plan) = decision else {
        panic!("expected to proceed, got {decision:?}");
    };
    let outcome = execute(&plan, ops, &rec);
    (outcome, rec)
}

#[test]
fn fresh_relocation_copies_deletes_and_links() {
    let home = TempDir::new().unwrap();
    let volume = TempDir::new().unwrap();
    let source = seed_source(&home);
    let target = volume.path().join("AIModels");

    let ops = manual_ops();
    let request = RelocateRequest {
        source: source.clone(),
        target: target.clone(),
        overwrite: false,
        link_only: false,
    };
    let (outcome, rec) = run(request, &ops);

    assert_eq!(outcome, Outcome::Done { verified: true });
    assert!(fs::symlink_metadata(&source).unwrap().file_type().is_symlink());
    assert_eq!(fs::read_to_string(target.join("models/a.gguf")).unwrap(), "weights");
    // Reads through the old path land on the new volume.
    assert_eq!(fs::read_to_string(source.join("settings.json")).unwrap(), "{}");
    assert_eq!(
        rec.states(),
        vec![
            State::Init,
            State::SourceResolved,
            State::DestinationDecided,
            State::Copying,
            State::SourceDeleting,
            State::Linking,
            State::Done,
        ]
    );
}

#[test]
fn overwrite_replaces_stale_target_contents() {
    let home = TempDir::new().unwrap();
    let volume = TempDir::new().unwrap();
    let source = seed_source(&home);
    volume.child("AIModels/stale.bin").write_str("old").unwrap();
    let target = volume.path().join("AIModels");

    let ops = manual_ops();
    let request = RelocateRequest {
        source: source.clone(),
        target: target.clone(),
        overwrite: true,
        link_only: false,
    };
    let (outcome, _) = run(request, &ops);

    assert_eq!(outcome, Outcome::Done { verified: true });
    assert!(!target.join("stale.bin").exists());
    assert!(target.join("models/a.gguf").is_file());
}

#[test]
fn link_only_leaves_target_untouched() {
    let home = TempDir::new().unwrap();
    let volume = TempDir::new().unwrap();
    let source = seed_source(&home);
    volume.child("AIModels/kept.bin").write_str("mine").unwrap();
    let target = volume.path().join("AIModels");

    let ops = manual_ops();
    let request = RelocateRequest {
        source: source.clone(),
        target: target.clone(),
        overwrite: false,
        link_only: true,
    };
    let (outcome, rec) = run(request, &ops);

    assert_eq!(outcome, Outcome::Done { verified: true });
    assert_eq!(fs::read_to_string(target.join("kept.bin")).unwrap(), "mine");
    assert!(!target.join("models").exists(), "nothing was copied");
    assert!(!rec.states().contains(&State::Copying));
    assert!(fs::symlink_metadata(&source).unwrap().file_type().is_symlink());
}

#[test]
fn failed_bulk_copy_keeps_source() {
    let home = TempDir::new().unwrap();
    let volume = TempDir::new().unwrap();
    let source = seed_source(&home);
    let target = volume.path().join("AIModels");

    let ops = SystemOps::new(CopyOptions {
        bulk_tool: Some(BulkTool {
            program: "sh".into(),
            args: vec!["-c".into(), "exit 16".into()],
            max_success_code: 7,
        }),
        retries: 0,
    });
    let request = RelocateRequest {
        source: source.clone(),
        target: target.clone(),
        overwrite: false,
        link_only: false,
    };
    let (outcome, _) = run(request, &ops);

    let Outcome::Failed(failure) = outcome else {
        panic!("expected a copy failure");
    };
    assert_eq!(failure.phase, Phase::Copy);
    assert!(failure.cause.contains("exit code 16"), "cause: {}", failure.cause);
    assert_eq!(failure.code, Some(30));
    assert!(failure.source_intact());
    assert!(!fs::symlink_metadata(&source).unwrap().file_type().is_symlink());
    assert_eq!(fs::read_to_string(source.join("models/a.gguf")).unwrap(), "weights");
}

#[test]
fn already_linked_source_is_refused() {
    let home = TempDir::new().unwrap();
    let volume = TempDir::new().unwrap();
    let source = seed_source(&home);
    let target = volume.path().join("AIModels");

    let ops = manual_ops();
    let request = RelocateRequest {
        source: source.clone(),
        target: target.clone(),
        overwrite: false,
        link_only: false,
    };
    let (outcome, _) = run(request.clone(), &ops);
    assert_eq!(outcome, Outcome::Done { verified: true });

    // A second run must not follow the link and relocate the target onto itself.
    let err = prepare(
        &request,
        &mut AlwaysYes,
        &QuietMachine,
        &ops,
        &RecordingReporter::new(),
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<RelocateError>(),
        Some(RelocateError::AlreadyLinked(_))
    ));
    assert!(target.join("models/a.gguf").is_file());
}

#[test]
fn target_inside_source_is_refused_before_any_change() {
    let home = TempDir::new().unwrap();
    let source = seed_source(&home);

    let request = RelocateRequest {
        source: source.clone(),
        target: source.join("nested"),
        overwrite: false,
        link_only: false,
    };
    let err = prepare(
        &request,
        &mut AlwaysYes,
        &QuietMachine,
        &manual_ops(),
        &RecordingReporter::new(),
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<RelocateError>(),
        Some(RelocateError::NestedPaths { .. })
    ));
    assert!(source.join("models/a.gguf").is_file());
    assert!(!source.join("nested").exists());
}
