use std::fs;
use sysdash_daemon::error::SearchError;
use sysdash_daemon::search::search;
use tempfile::tempdir;

#[test]
fn test_search_matches_files_and_dirs_case_insensitively() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("Reports").join("old")).unwrap();
    fs::write(dir.path().join("Reports").join("old").join("q1-REPORT.txt"), b"").unwrap();
    fs::write(dir.path().join("notes.md"), b"").unwrap();

    let mut found = search("report", dir.path(), 100).unwrap();
    found.sort();
    assert_eq!(
        found,
        vec![
            dir.path().join("Reports"),
            dir.path().join("Reports").join("old").join("q1-REPORT.txt"),
        ]
    );
}

#[test]
fn test_search_skips_hidden_directories() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join(".git").join("foo-dir")).unwrap();
    fs::write(dir.path().join(".git").join("foo.txt"), b"").unwrap();
    fs::write(dir.path().join("foo.rs"), b"").unwrap();
    fs::write(dir.path().join(".foo-hidden-file"), b"").unwrap();

    let found = search("foo", dir.path(), 100).unwrap();
    assert!(found.iter().all(|p| !p.starts_with(dir.path().join(".git"))));
    assert!(found.contains(&dir.path().join("foo.rs")));
    // Only directories are pruned; hidden files still match.
    assert!(found.contains(&dir.path().join(".foo-hidden-file")));
}

#[test]
fn test_search_stops_at_cap() {
    let dir = tempdir().unwrap();
    for d in 0..5 {
        let sub = dir.path().join(format!("dir{d}"));
        fs::create_dir(&sub).unwrap();
        for f in 0..40 {
            fs::write(sub.join(format!("foo{f}.log")), b"").unwrap();
        }
    }
    assert_eq!(search("foo", dir.path(), 100).unwrap().len(), 100);
    assert_eq!(search("foo", dir.path(), 7).unwrap().len(), 7);
    assert!(search("foo", dir.path(), 0).unwrap().is_empty());
}

#[test]
fn test_search_matches_a_directory_before_descending() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("foo-sub");
    fs::create_dir(&sub).unwrap();
    for f in 0..10 {
        fs::write(sub.join(format!("foo-inner{f}.txt")), b"").unwrap();
    }
    fs::write(dir.path().join("foo-top.txt"), b"").unwrap();

    // Files at a level come first, then its directories, then their contents.
    assert_eq!(
        search("foo", dir.path(), 2).unwrap(),
        vec![dir.path().join("foo-top.txt"), sub.clone()]
    );
    let third = search("foo", dir.path(), 3).unwrap();
    assert!(third[2].starts_with(&sub));
}

#[test]
fn test_search_hidden_root_is_still_walked() {
    let dir = tempdir().unwrap();
    let root = dir.path().join(".config");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("app.toml"), b"").unwrap();
    assert_eq!(search("APP", &root, 100).unwrap(), vec![root.join("app.toml")]);
}

#[test]
fn test_search_unreadable_root_is_an_error() {
    let dir = tempdir().unwrap();
    let err = search("x", &dir.path().join("missing"), 100).unwrap_err();
    assert!(matches!(err, SearchError::Unreadable { .. }));
}
