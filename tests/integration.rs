//! End-to-end comparison tests against a real on-disk repository

use revdiff::{
    collect_stats, resolve_target, run_compare, CancellationToken, CompareOptions, ObjectStore,
    RefPair, RevDiffError, Repo, SizeLookup,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

struct Fixture {
    repo: Repo,
    _dir: TempDir,
    work: std::path::PathBuf,
}

/// A repository with two commits on `main`: v1 adds `a.txt` and
/// `sub/b.txt`, v2 modifies `a.txt`, deletes `sub/b.txt`, adds `c.txt`.
fn two_commit_fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let repo = Repo::init(dir.path().join("repo")).unwrap();
    let work = dir.path().join("work");

    write(&work, "a.txt", "version one");
    write(&work, "sub/b.txt", "doomed");
    repo.commit_directory(&work, "main", Some("v1".into())).unwrap();

    fs::write(work.join("a.txt"), "version two").unwrap();
    fs::remove_file(work.join("sub/b.txt")).unwrap();
    write(&work, "c.txt", "fresh");
    repo.commit_directory(&work, "main", Some("v2".into())).unwrap();

    Fixture {
        repo,
        _dir: dir,
        work,
    }
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn compare_output(fx: &Fixture, refs: &[&str], options: CompareOptions) -> String {
    let refs: Vec<String> = refs.iter().map(|s| s.to_string()).collect();
    let pair = RefPair::from_refs(&refs).unwrap();
    let cancel = CancellationToken::new();
    let mut out = Vec::new();
    run_compare(&fx.repo, &pair, options, &cancel, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn single_ref_compares_parent_against_ref() {
    let fx = two_commit_fixture();
    let report = compare_output(&fx, &["main"], CompareOptions::default());

    assert!(report.contains("M    a.txt"));
    assert!(report.contains("D    sub/b.txt"));
    assert!(report.contains("A    c.txt"));
}

#[test]
fn two_refs_compare_directly() {
    let fx = two_commit_fixture();
    // "main^ main" must equal the single-ref form; no extra parent suffix
    // is appended to either side.
    let direct = compare_output(&fx, &["main^", "main"], CompareOptions::default());
    let implicit = compare_output(&fx, &["main"], CompareOptions::default());
    assert_eq!(direct, implicit);

    // Reversed references flip the diff direction.
    let reversed = compare_output(&fx, &["main", "main^"], CompareOptions::default());
    assert!(reversed.contains("A    sub/b.txt"));
    assert!(reversed.contains("D    c.txt"));
}

#[test]
fn default_mode_equals_explicit_fs_diff() {
    let fx = two_commit_fixture();
    let implicit = compare_output(&fx, &["main"], CompareOptions::default());
    let explicit = compare_output(
        &fx,
        &["main"],
        CompareOptions {
            stats: false,
            fs_diff: true,
        },
    );
    assert_eq!(implicit, explicit);
    assert!(!implicit.contains("Object Count"), "no stats output implied");
}

#[test]
fn both_modes_on_identical_commits() {
    let fx = two_commit_fixture();
    let report = compare_output(
        &fx,
        &["main", "main"],
        CompareOptions {
            stats: true,
            fs_diff: true,
        },
    );

    // Empty diff: the stats header is the first line of output.
    assert!(report.starts_with("[A] Object Count: "));

    let cancel = CancellationToken::new();
    let commit_id = fx.repo.resolve_rev("main").unwrap();
    let reachable = fx.repo.traverse_commit(&commit_id, &cancel).unwrap();
    let full_size: u64 = reachable
        .iter()
        .map(|id| fx.repo.query_object_size(id).unwrap())
        .sum();

    let pair = RefPair::from_refs(&["main".to_string(), "main".to_string()]).unwrap();
    let stats = collect_stats(&fx.repo, &pair, &cancel).unwrap();
    assert_eq!(stats.objects_a, reachable.len());
    assert_eq!(stats.objects_b, reachable.len());
    assert_eq!(stats.common_objects, reachable.len());
    assert_eq!(stats.common_size, full_size);
}

#[test]
fn stats_between_distinct_commits() {
    let fx = two_commit_fixture();
    let cancel = CancellationToken::new();

    let pair = RefPair::from_refs(&["main".to_string()]).unwrap();
    let stats = collect_stats(&fx.repo, &pair, &cancel).unwrap();

    // v1: commit + root tree + sub tree + a.txt + b.txt = 5 objects.
    // v2: commit + root tree + sub tree (now empty) + a.txt + c.txt = 5.
    assert_eq!(stats.objects_a, 5);
    assert_eq!(stats.objects_b, 5);
    // Nothing but identity-level sharing: every file changed, both trees
    // changed, and the commits differ.
    assert_eq!(stats.common_objects, 0);
    assert_eq!(stats.common_size, 0);
}

#[test]
fn commit_against_live_directory() {
    let fx = two_commit_fixture();
    let work_ref = fx.work.display().to_string();

    // The working directory matches the latest commit exactly.
    let report = compare_output(&fx, &["main", &work_ref], CompareOptions::default());
    assert_eq!(report, "");

    // And differs from the parent commit.
    let report = compare_output(&fx, &["main^", &work_ref], CompareOptions::default());
    assert!(report.contains("M    a.txt"));
}

#[test]
fn dot_slash_reference_never_consults_the_store() {
    let fx = two_commit_fixture();
    // A ref named `main` exists, but `./main` is path-like and must
    // resolve to the literal path without any store interaction.
    let cancel = CancellationToken::new();
    let target = resolve_target(&fx.repo, "./main", &cancel).unwrap();
    assert_eq!(target.path(), Path::new("./main"));
    assert!(!target.is_checkout());
}

#[test]
fn path_like_reference_is_not_a_stats_operand() {
    let fx = two_commit_fixture();
    let cancel = CancellationToken::new();
    let pair = RefPair::from_refs(&["./main".to_string(), "main".to_string()]).unwrap();

    let err = collect_stats(&fx.repo, &pair, &cancel).unwrap_err();
    match err {
        RevDiffError::Resolution { reference, .. } => assert_eq!(reference, "./main"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn nonexistent_commit_aborts_without_output() {
    let fx = two_commit_fixture();
    let pair = RefPair::from_refs(&["ghost".to_string(), "main".to_string()]).unwrap();
    let cancel = CancellationToken::new();

    let mut out = Vec::new();
    let err = run_compare(
        &fx.repo,
        &pair,
        CompareOptions::default(),
        &cancel,
        &mut out,
    )
    .unwrap_err();

    assert!(matches!(err, RevDiffError::Resolution { .. }));
    assert!(out.is_empty());
}

#[test]
fn cancellation_aborts_without_output() {
    let fx = two_commit_fixture();
    let pair = RefPair::from_refs(&["main".to_string()]).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut out = Vec::new();
    let err = run_compare(
        &fx.repo,
        &pair,
        CompareOptions {
            stats: true,
            fs_diff: true,
        },
        &cancel,
        &mut out,
    )
    .unwrap_err();

    assert!(matches!(err, RevDiffError::Cancelled));
    assert!(out.is_empty());
}

#[test]
fn shared_objects_counted_once() {
    let dir = TempDir::new().unwrap();
    let repo = Repo::init(dir.path().join("repo")).unwrap();
    let work = dir.path().join("work");

    // Two commits sharing an unchanged file; the shared file object and
    // nothing else survives in both reachable sets.
    write(&work, "keep.txt", "stable content");
    write(&work, "churn.txt", "old");
    repo.commit_directory(&work, "main", None).unwrap();
    fs::write(work.join("churn.txt"), "new").unwrap();
    repo.commit_directory(&work, "main", None).unwrap();

    let cancel = CancellationToken::new();
    let pair = RefPair::from_refs(&["main".to_string()]).unwrap();
    let stats = collect_stats(&repo, &pair, &cancel).unwrap();

    assert_eq!(stats.objects_a, 4); // commit + tree + 2 files
    assert_eq!(stats.objects_b, 4);
    assert_eq!(stats.common_objects, 1);
    assert_eq!(stats.common_size, "stable content".len() as u64);
}
