use assert_cmd::prelude::*;
use git_heatmap::git::{GitRepo, WalkOptions};
use git_heatmap::{CommitIndex, DirectoryClassifier, PeriodPolicy};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn has_git() -> bool {
    Command::new("git").arg("--version").output().is_ok()
}

fn git(dir: &Path, args: &[&str]) {
    assert!(Command::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .unwrap()
        .success());
}

fn init_git_repo(dir: &Path) {
    git(dir, &["init"]);
    git(dir, &["config", "core.autocrlf", "false"]);
    git(dir, &["config", "core.safecrlf", "false"]);
    git(dir, &["config", "user.email", "you@example.com"]);
    git(dir, &["config", "user.name", "Your Name"]);
}

fn write_file(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut f = File::create(&path).unwrap();
    f.write_all(content.as_bytes()).unwrap();
    f.sync_all().unwrap();
}

fn git_at(dir: &Path, args: &[&str], date: &str) {
    assert!(Command::new("git")
        .args(args)
        .env("GIT_AUTHOR_DATE", date)
        .env("GIT_COMMITTER_DATE", date)
        .current_dir(dir)
        .status()
        .unwrap()
        .success());
}

fn commit_all(dir: &Path, message: &str, date: &str) {
    git(dir, &["add", "-A"]);
    git_at(dir, &["commit", "-m", message], date);
}

fn quiet_walk() -> WalkOptions {
    WalkOptions {
        progress: false,
        ..WalkOptions::default()
    }
}

/// Root adds lib/a.rb (10 lines); the second commit edits it and adds
/// docs/readme.md (5 lines); the third trims three lines from the readme.
fn three_commit_repo(dir: &Path) {
    init_git_repo(dir);
    let ten: String = (1..=10).map(|i| format!("line {i}\n")).collect();
    write_file(dir, "lib/a.rb", &ten);
    commit_all(dir, "root", "2023-06-05T10:00:00Z");

    let edited = ten.replace("line 3\n", "line three\n") + "line 11\n";
    write_file(dir, "lib/a.rb", &edited);
    write_file(dir, "docs/readme.md", "a\nb\nc\nd\ne\n");
    commit_all(dir, "edit", "2023-06-14T10:00:00Z");

    write_file(dir, "docs/readme.md", "a\nb\n");
    commit_all(dir, "trim", "2023-06-27T10:00:00Z");
}

#[test]
fn history_is_read_oldest_first_with_parent_diffs() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    three_commit_repo(dir.path());

    let repo = GitRepo::open(dir.path()).unwrap();
    let options = quiet_walk();
    let history = repo.history(&options).unwrap();
    assert_eq!(history.len(), 3);
    assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

    let root = &history[0];
    assert_eq!(root.changes.len(), 1);
    assert_eq!(root.changes[0].path, "lib/a.rb");
    assert_eq!((root.changes[0].added_lines, root.changes[0].deleted_lines), (10, 0));

    let trim = &history[2];
    assert_eq!(trim.changes.len(), 1);
    assert_eq!((trim.changes[0].added_lines, trim.changes[0].deleted_lines), (0, 3));
}

#[test]
fn index_buckets_three_commit_history() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    three_commit_repo(dir.path());

    let repo = GitRepo::open(dir.path()).unwrap();
    let name = repo.display_name();
    let mut index = CommitIndex::new(PeriodPolicy::Weekly, DirectoryClassifier::new(1));
    let options = quiet_walk();
    assert_eq!(index.add_repository(&repo, &options).unwrap(), 3);

    let buckets: Vec<_> = index
        .each_directory()
        .map(|(key, aggregate)| (key.path(), aggregate.size(), aggregate.totals().churn))
        .collect();
    assert_eq!(
        buckets,
        vec![
            (format!("{name}/docs"), 2, 8),
            (format!("{name}/lib"), 2, 13),
        ]
    );
    assert_eq!(index.commit_count(), 3);
    assert_eq!(index.authors().len(), 1);
    // Weeks of Jun 4, 11, 18 and 25.
    assert_eq!(index.each_period().count(), 4);

    // Walking the same repository again changes nothing.
    index.add_repository(&repo, &options).unwrap();
    assert_eq!(index.commit_count(), 3);
    assert_eq!(index.maximum(), 10);
}

#[test]
fn json_outputs_directories_and_periods() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    three_commit_repo(dir.path());

    let mut cmd = Command::cargo_bin("git-heatmap").unwrap();
    cmd.arg("--json")
        .args(["--depth", "1", "--period", "monthly"])
        .arg(dir.path());
    let out = cmd.assert().success().get_output().stdout.clone();
    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();

    assert_eq!(v["period"], "monthly");
    assert_eq!(v["commits"], 3);
    let periods = v["periods"].as_array().unwrap();
    assert_eq!(periods.len(), 1);
    let directories = v["directories"].as_array().unwrap();
    assert_eq!(directories.len(), 2);
    for row in directories {
        assert_eq!(row["cells"].as_array().unwrap().len(), periods.len());
    }
}

#[test]
fn html_is_written_to_output_path() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    three_commit_repo(dir.path());
    let output = dir.path().join("out.html");

    let mut cmd = Command::cargo_bin("git-heatmap").unwrap();
    cmd.arg("--quiet")
        .arg("--output")
        .arg(&output)
        .arg(dir.path());
    cmd.assert().success();

    let html = fs::read_to_string(&output).unwrap();
    assert!(html.contains("<table class=\"heatmap\">"));
    assert!(html.contains("/lib"));
}

#[test]
fn filter_excludes_subtree() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    three_commit_repo(dir.path());

    let mut cmd = Command::cargo_bin("git-heatmap").unwrap();
    cmd.args(["--json", "--depth", "1", "--filter", "docs:0"])
        .arg(dir.path());
    let out = cmd.assert().success().get_output().stdout.clone();
    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let directories = v["directories"].as_array().unwrap();
    assert_eq!(directories.len(), 1);
    assert!(directories[0]["path"].as_str().unwrap().ends_with("/lib"));
}

#[test]
fn unknown_period_is_rejected() {
    let dir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("git-heatmap").unwrap();
    cmd.args(["--period", "fortnightly"]).arg(dir.path());
    cmd.assert().failure();
}

#[test]
fn missing_repository_fails() {
    let dir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("git-heatmap").unwrap();
    cmd.arg("--json").arg(dir.path().join("does-not-exist"));
    cmd.assert().failure();
}

/// Root holds a text file and a binary blob; a side branch adds side.txt
/// while the mainline adds main.txt, then the side branch is merged with
/// `--no-ff`.
fn merge_repo(dir: &Path) {
    init_git_repo(dir);
    write_file(dir, "base.txt", "base\n");
    write_file(dir, "assets/img.bin", "\u{89}PNG\0\0\0data\n");
    commit_all(dir, "root", "2023-06-05T10:00:00Z");

    git(dir, &["checkout", "-b", "side"]);
    write_file(dir, "side.txt", "side\n");
    commit_all(dir, "side", "2023-06-06T10:00:00Z");

    git(dir, &["checkout", "-"]);
    write_file(dir, "main.txt", "main\nline\n");
    commit_all(dir, "main", "2023-06-07T10:00:00Z");

    git_at(dir, &["merge", "--no-ff", "side", "-m", "merge side"], "2023-06-08T10:00:00Z");
}

#[test]
fn merges_are_diffed_against_first_parent() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    merge_repo(dir.path());
    let repo = GitRepo::open(dir.path()).unwrap();

    let history = repo.history(&quiet_walk()).unwrap();
    assert_eq!(history.len(), 4);
    let merge = history.last().unwrap();
    assert_eq!(merge.changes.len(), 1);
    assert_eq!(merge.changes[0].path, "side.txt");
    assert_eq!((merge.changes[0].added_lines, merge.changes[0].deleted_lines), (1, 0));

    let without_merges = repo
        .history(&WalkOptions {
            include_merges: false,
            ..quiet_walk()
        })
        .unwrap();
    assert_eq!(without_merges.len(), 3);
    assert!(without_merges.iter().all(|c| c.id != merge.id));
}

#[test]
fn binary_files_are_skipped_unless_requested() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    merge_repo(dir.path());
    let repo = GitRepo::open(dir.path()).unwrap();

    let history = repo.history(&quiet_walk()).unwrap();
    let root = &history[0];
    let paths: Vec<_> = root.changes.iter().map(|c| c.path.as_str()).collect();
    assert_eq!(paths, vec!["base.txt"]);

    let history = repo
        .history(&WalkOptions {
            binary: true,
            ..quiet_walk()
        })
        .unwrap();
    let image = history[0]
        .changes
        .iter()
        .find(|c| c.path == "assets/img.bin")
        .unwrap();
    assert_eq!((image.added_lines, image.deleted_lines), (0, 0));
}

#[test]
fn moved_file_leaves_lines_in_old_directory() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    let twenty: String = (1..=20).map(|i| format!("line {i}\n")).collect();
    write_file(dir.path(), "lib/a.rb", &twenty);
    commit_all(dir.path(), "add", "2023-06-05T10:00:00Z");
    fs::create_dir_all(dir.path().join("src")).unwrap();
    git(dir.path(), &["mv", "lib/a.rb", "src/a.rb"]);
    commit_all(dir.path(), "move", "2023-06-06T10:00:00Z");

    let repo = GitRepo::open(dir.path()).unwrap();
    let history = repo.history(&quiet_walk()).unwrap();
    let moved: Vec<_> = history[1]
        .changes
        .iter()
        .map(|c| (c.path.as_str(), c.added_lines, c.deleted_lines))
        .collect();
    assert_eq!(moved, vec![("lib/a.rb", 0, 20), ("src/a.rb", 20, 0)]);

    let name = repo.display_name();
    let mut index = CommitIndex::new(PeriodPolicy::Weekly, DirectoryClassifier::new(1));
    index.add_repository(&repo, &quiet_walk()).unwrap();
    let lib = index
        .each_directory()
        .find(|(key, _)| key.path() == format!("{name}/lib"))
        .map(|(_, aggregate)| aggregate)
        .unwrap();
    assert_eq!(lib.size(), 2);
    assert_eq!(lib.totals().deletions, 20);
}
