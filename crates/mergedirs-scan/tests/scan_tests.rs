use std::fs;
use std::path::{Path, PathBuf};

use mergedirs_core::{MergeDirsOptions, MergeError, MergeTarget};
use mergedirs_scan::{GlobScanner, PatternMatcher, collect_merge_targets};
use tempfile::TempDir;

/// fixtures/
///   a/1.ts
///   b/2.ts
///   b/deep/3.ts
///   .hidden
///   empty/
fn fixtures() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("fixtures");
    fs::create_dir_all(root.join("a")).unwrap();
    fs::create_dir_all(root.join("b/deep")).unwrap();
    fs::create_dir_all(root.join("empty")).unwrap();
    fs::write(root.join("a/1.ts"), "one").unwrap();
    fs::write(root.join("b/2.ts"), "two").unwrap();
    fs::write(root.join("b/deep/3.ts"), "three").unwrap();
    fs::write(root.join(".hidden"), "dot").unwrap();
    dir
}

fn patterns(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn paths(items: &[&str]) -> Vec<PathBuf> {
    items.iter().map(PathBuf::from).collect()
}

#[test]
fn test_star_matches_files_dirs_and_dotfiles() {
    let dir = fixtures();
    let matched = GlobScanner::new()
        .matches(&patterns(&["fixtures/*"]), &[], dir.path())
        .unwrap();

    assert_eq!(
        matched,
        paths(&[
            "fixtures/.hidden",
            "fixtures/a",
            "fixtures/b",
            "fixtures/empty"
        ])
    );
}

#[test]
fn test_globstar_is_recursive() {
    let dir = fixtures();
    let matched = GlobScanner::new()
        .matches(&patterns(&["fixtures/**/*.ts"]), &[], dir.path())
        .unwrap();

    assert_eq!(
        matched,
        paths(&["fixtures/a/1.ts", "fixtures/b/2.ts", "fixtures/b/deep/3.ts"])
    );
}

#[test]
fn test_ignore_excludes_directory_and_contents() {
    let dir = fixtures();
    let matched = GlobScanner::new()
        .matches(
            &patterns(&["fixtures/**"]),
            &patterns(&["**/b"]),
            dir.path(),
        )
        .unwrap();

    assert!(matched.contains(&PathBuf::from("fixtures/a/1.ts")));
    assert!(matched.iter().all(|p| !p.starts_with("fixtures/b")));
}

#[test]
fn test_literal_path() {
    let dir = fixtures();
    let scanner = GlobScanner::new();

    let matched = scanner
        .matches(&patterns(&["./fixtures/a/1.ts"]), &[], dir.path())
        .unwrap();
    assert_eq!(matched, paths(&["fixtures/a/1.ts"]));

    let missing = scanner
        .matches(&patterns(&["fixtures/a/nope.ts"]), &[], dir.path())
        .unwrap();
    assert!(missing.is_empty());
}

#[test]
fn test_absolute_glob() {
    let dir = fixtures();
    let root = dir.path().canonicalize().unwrap();
    let base = root.join("fixtures").to_string_lossy().replace('\\', "/");

    let matched = GlobScanner::new()
        .matches(&[format!("{base}/b/**/*.ts")], &patterns(&["**/deep"]), &root)
        .unwrap();
    assert_eq!(matched, vec![root.join("fixtures/b/2.ts")]);

    let jobs = jobs_for(MergeTarget::new(format!("{base}/a/*"), "/out"), &root);
    assert_eq!(
        jobs,
        vec![(root.join("fixtures/a/1.ts"), PathBuf::from("/out/1.ts"))]
    );
}

#[test]
fn test_overlapping_patterns_are_deduplicated() {
    let dir = fixtures();
    let matched = GlobScanner::new()
        .matches(
            &patterns(&["fixtures/a/*", "fixtures/*/1.ts"]),
            &[],
            dir.path(),
        )
        .unwrap();

    assert_eq!(matched, paths(&["fixtures/a/1.ts"]));
}

#[test]
fn test_order_is_deterministic() {
    let dir = fixtures();
    let scanner = GlobScanner::new();
    let first = scanner
        .matches(&patterns(&["**"]), &[], dir.path())
        .unwrap();
    let second = scanner
        .matches(&patterns(&["**"]), &[], dir.path())
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_invalid_pattern_fails() {
    let dir = fixtures();
    let err = GlobScanner::new()
        .matches(&patterns(&["fixtures/[a"]), &[], dir.path())
        .unwrap_err();
    assert!(matches!(err, MergeError::InvalidPattern { .. }));
}

fn jobs_for(target: MergeTarget, root: &Path) -> Vec<(PathBuf, PathBuf)> {
    let options = MergeDirsOptions::new(vec![target]).resolve().unwrap();
    collect_merge_targets(&options.targets, root, &GlobScanner::new())
        .unwrap()
        .into_iter()
        .map(|job| (job.src, job.dest))
        .collect()
}

#[test]
fn test_collect_flatten() {
    let dir = fixtures();
    let jobs = jobs_for(
        MergeTarget::new("fixtures/**/*.ts", "/out"),
        dir.path(),
    );

    assert_eq!(
        jobs,
        vec![
            (PathBuf::from("fixtures/a/1.ts"), PathBuf::from("/out/1.ts")),
            (PathBuf::from("fixtures/b/2.ts"), PathBuf::from("/out/2.ts")),
            (PathBuf::from("fixtures/b/deep/3.ts"), PathBuf::from("/out/3.ts")),
        ]
    );
}

#[test]
fn test_collect_preserve() {
    let dir = fixtures();
    let jobs = jobs_for(
        MergeTarget::new("fixtures/**/*.ts", "/out").with_flatten(false),
        dir.path(),
    );

    assert_eq!(
        jobs,
        vec![
            (PathBuf::from("fixtures/a/1.ts"), PathBuf::from("/out/a/1.ts")),
            (PathBuf::from("fixtures/b/2.ts"), PathBuf::from("/out/b/2.ts")),
            (
                PathBuf::from("fixtures/b/deep/3.ts"),
                PathBuf::from("/out/b/deep/3.ts")
            ),
        ]
    );
}

#[test]
fn test_collect_uses_canonical_root() {
    let dir = fixtures();
    let options = MergeDirsOptions::new(vec![MergeTarget::new("fixtures/a", "/out")])
        .resolve()
        .unwrap();
    let jobs = collect_merge_targets(&options.targets, dir.path(), &GlobScanner::new()).unwrap();

    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].root, dir.path().canonicalize().unwrap());
    assert_eq!(jobs[0].source_path(), jobs[0].root.join("fixtures/a"));
}

#[test]
fn test_collect_unreadable_root() {
    let options = MergeDirsOptions::new(vec![MergeTarget::new("*", "/out")])
        .resolve()
        .unwrap();
    let err = collect_merge_targets(
        &options.targets,
        Path::new("/no/such/root"),
        &GlobScanner::new(),
    )
    .unwrap_err();
    assert!(matches!(err, MergeError::UnreadableRoot { .. }));
}
