use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use chrono::{DateTime, Utc};
use walkdir::WalkDir;
use tracing::{debug, info};
use crate::config::{ClassifierConfig, EmptyDirPolicy};
use crate::error::{OldFolderError, Result};

/// An immediate child directory of the scanned root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: OsString,
    pub path: PathBuf,
}

/// Age verdict for a single candidate
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub candidate: Candidate,
    pub files_checked: usize,
    pub newest: Option<DateTime<Utc>>,
    pub is_old: bool,
}

pub struct AgeClassifier {
    config: ClassifierConfig,
}

impl AgeClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify the subdirectories of `root` against the current time
    pub fn classify(&self, root: &Path, years: f64) -> Result<Vec<Candidate>> {
        self.classify_at(root, years, Utc::now())
    }

    /// Classify the subdirectories of `root` against a given point in time.
    ///
    /// Returns the old candidates in directory listing order.
    pub fn classify_at(&self, root: &Path, years: f64, now: DateTime<Utc>) -> Result<Vec<Candidate>> {
        let cutoff = self.config.cutoff(now, years)?;
        ensure_root(root)?;

        let mut old = Vec::new();
        let mut total = 0;

        for candidate in list_subdirectories(root)? {
            total += 1;
            let verdict = self.judge(candidate, cutoff)?;

            debug!(
                name = %verdict.candidate.name.to_string_lossy(),
                files = verdict.files_checked,
                newest = ?verdict.newest,
                old = verdict.is_old,
                "classified subdirectory"
            );

            if verdict.is_old {
                old.push(verdict.candidate);
            }
        }

        info!(
            root = %root.display(),
            kind = %self.config.time_kind,
            %cutoff,
            total,
            old = old.len(),
            "classification finished"
        );

        Ok(old)
    }

    /// Decide whether every file under the candidate predates `cutoff`
    pub fn judge(&self, candidate: Candidate, cutoff: DateTime<Utc>) -> Result<Verdict> {
        let times = self.collect_times(&candidate.path)?;
        let newest = times.iter().max().copied();

        let is_old = if times.is_empty() {
            matches!(self.config.empty_dirs, EmptyDirPolicy::Old)
        } else {
            times.iter().all(|time| *time < cutoff)
        };

        Ok(Verdict {
            candidate,
            files_checked: times.len(),
            newest,
            is_old,
        })
    }

    /// Collect the configured timestamp of every file in the subtree
    fn collect_times(&self, dir: &Path) -> Result<Vec<DateTime<Utc>>> {
        let mut times = Vec::new();

        // Links are not descended into, but a file link is judged by its target
        let walker = WalkDir::new(dir).follow_links(false);

        for entry in walker {
            let entry = entry.map_err(|source| OldFolderError::Walk {
                path: dir.to_path_buf(),
                source,
            })?;

            if entry.file_type().is_dir() {
                continue;
            }

            let metadata = if entry.path_is_symlink() {
                let target = fs::metadata(entry.path())
                    .map_err(|e| OldFolderError::io("follow link", entry.path(), e))?;
                if target.is_dir() {
                    continue;
                }
                target
            } else {
                entry.metadata().map_err(|source| OldFolderError::Walk {
                    path: entry.path().to_path_buf(),
                    source,
                })?
            };

            let time = self
                .config
                .time_kind
                .read(&metadata)
                .map_err(|e| OldFolderError::io("read timestamp of", entry.path(), e))?;

            times.push(time);
        }

        Ok(times)
    }
}

/// Fail unless `root` exists and is a directory
pub fn ensure_root(root: &Path) -> Result<()> {
    if root.is_dir() {
        Ok(())
    } else {
        Err(OldFolderError::RootPathNotFound {
            path: root.to_path_buf(),
        })
    }
}

/// Names of every direct entry of `root`, files included
pub fn list_entry_names(root: &Path) -> Result<Vec<OsString>> {
    let mut names = Vec::new();
    let entries = fs::read_dir(root).map_err(|e| OldFolderError::io("read directory", root, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| OldFolderError::io("read directory", root, e))?;
        names.push(entry.file_name());
    }

    Ok(names)
}

/// Immediate child directories of `root`, in listing order.
///
/// Symlinks pointing at directories count as directories.
/// Dangling links are skipped.
pub fn list_subdirectories(root: &Path) -> Result<Vec<Candidate>> {
    let mut candidates = Vec::new();
    let entries = fs::read_dir(root).map_err(|e| OldFolderError::io("read directory", root, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| OldFolderError::io("read directory", root, e))?;
        let path = entry.path();

        if path.is_dir() {
            candidates.push(Candidate {
                name: entry.file_name(),
                path,
            });
        }
    }

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimeKind;
    use chrono::TimeZone;
    use filetime::{set_file_atime, set_file_mtime, FileTime};
    use tempfile::TempDir;

    const NOW: i64 = 1_602_058_053;
    const TWO_YEARS_AGO: i64 = NOW - 2 * 365 * 24 * 60 * 60;
    const LAST_MONTH: i64 = NOW - 30 * 24 * 60 * 60;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(NOW, 0).unwrap()
    }

    fn write_file(path: &Path, mtime: i64) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "content").unwrap();
        set_file_mtime(path, FileTime::from_unix_time(mtime, 0)).unwrap();
    }

    fn names(candidates: &[Candidate]) -> Vec<String> {
        let mut names: Vec<String> = candidates
            .iter()
            .map(|c| c.name.to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn old_directory_qualifies_and_recent_does_not() {
        let root = TempDir::new().unwrap();
        write_file(&root.path().join("old_files/report.txt"), TWO_YEARS_AGO);
        write_file(&root.path().join("new_files/today.txt"), NOW);

        let classifier = AgeClassifier::new(ClassifierConfig::default());
        let old = classifier.classify_at(root.path(), 1.0, now()).unwrap();

        assert_eq!(names(&old), vec!["old_files"]);
        assert_eq!(old[0].path, root.path().join("old_files"));
    }

    #[test]
    fn one_recent_file_deep_in_the_tree_keeps_the_directory() {
        let root = TempDir::new().unwrap();
        write_file(&root.path().join("project/a.txt"), TWO_YEARS_AGO);
        write_file(&root.path().join("project/src/b.txt"), TWO_YEARS_AGO);
        write_file(&root.path().join("project/src/deep/er/c.txt"), LAST_MONTH);

        let classifier = AgeClassifier::new(ClassifierConfig::default());
        let old = classifier.classify_at(root.path(), 1.0, now()).unwrap();

        assert!(old.is_empty());
    }

    #[test]
    fn cutoff_comparison_is_strict() {
        let root = TempDir::new().unwrap();
        let one_year_ago = NOW - 365 * 24 * 60 * 60;
        write_file(&root.path().join("edge/file.txt"), one_year_ago);

        let classifier = AgeClassifier::new(ClassifierConfig::default());
        let old = classifier.classify_at(root.path(), 1.0, now()).unwrap();
        assert!(old.is_empty());

        write_file(&root.path().join("edge/file.txt"), one_year_ago - 1);
        let old = classifier.classify_at(root.path(), 1.0, now()).unwrap();
        assert_eq!(names(&old), vec!["edge"]);
    }

    #[test]
    fn empty_directory_follows_policy() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("empty/nested")).unwrap();

        let vacuous = AgeClassifier::new(ClassifierConfig::default());
        let old = vacuous.classify_at(root.path(), 1.0, now()).unwrap();
        assert_eq!(names(&old), vec!["empty"]);

        let keep = AgeClassifier::new(ClassifierConfig::default().with_empty_dirs(EmptyDirPolicy::Keep));
        let old = keep.classify_at(root.path(), 1.0, now()).unwrap();
        assert!(old.is_empty());
    }

    #[test]
    fn files_in_root_are_not_candidates() {
        let root = TempDir::new().unwrap();
        write_file(&root.path().join("loose.txt"), TWO_YEARS_AGO);

        let classifier = AgeClassifier::new(ClassifierConfig::default());
        let old = classifier.classify_at(root.path(), 1.0, now()).unwrap();
        assert!(old.is_empty());
    }

    #[test]
    fn accessed_kind_reads_access_time() {
        let root = TempDir::new().unwrap();
        let file = root.path().join("docs/read_me.txt");
        write_file(&file, NOW);
        set_file_atime(&file, FileTime::from_unix_time(TWO_YEARS_AGO, 0)).unwrap();

        let by_access = AgeClassifier::new(ClassifierConfig::new(TimeKind::Accessed));
        let old = by_access.classify_at(root.path(), 1.0, now()).unwrap();
        assert_eq!(names(&old), vec!["docs"]);

        let by_modified = AgeClassifier::new(ClassifierConfig::new(TimeKind::Modified));
        assert!(by_modified.classify_at(root.path(), 1.0, now()).unwrap().is_empty());
    }

    #[test]
    fn created_kind_sees_fresh_files_as_recent() {
        let root = TempDir::new().unwrap();
        write_file(&root.path().join("fresh/new.txt"), TWO_YEARS_AGO);

        let classifier = AgeClassifier::new(ClassifierConfig::new(TimeKind::Created));
        let old = classifier.classify(root.path(), 1.0).unwrap();
        assert!(old.is_empty());
    }

    #[test]
    fn classification_is_repeatable() {
        let root = TempDir::new().unwrap();
        write_file(&root.path().join("a/1.txt"), TWO_YEARS_AGO);
        write_file(&root.path().join("b/2.txt"), LAST_MONTH);
        write_file(&root.path().join("c/3.txt"), TWO_YEARS_AGO);

        let classifier = AgeClassifier::new(ClassifierConfig::default());
        let first = classifier.classify_at(root.path(), 1.0, now()).unwrap();
        let second = classifier.classify_at(root.path(), 1.0, now()).unwrap();

        assert_eq!(first, second);
        assert_eq!(names(&first), vec!["a", "c"]);
    }

    #[test]
    fn missing_root_is_reported() {
        let root = TempDir::new().unwrap();
        let missing = root.path().join("nope");

        let classifier = AgeClassifier::new(ClassifierConfig::default());
        let err = classifier.classify_at(&missing, 1.0, now()).unwrap_err();
        assert!(matches!(err, OldFolderError::RootPathNotFound { path } if path == missing));
    }

    #[test]
    fn file_as_root_is_reported() {
        let root = TempDir::new().unwrap();
        let file = root.path().join("file.txt");
        fs::write(&file, "x").unwrap();

        assert!(matches!(
            ensure_root(&file),
            Err(OldFolderError::RootPathNotFound { .. })
        ));
    }

    #[test]
    fn verdict_reports_newest_timestamp() {
        let root = TempDir::new().unwrap();
        write_file(&root.path().join("mixed/a.txt"), TWO_YEARS_AGO);
        write_file(&root.path().join("mixed/b.txt"), LAST_MONTH);

        let classifier = AgeClassifier::new(ClassifierConfig::default());
        let candidate = Candidate {
            name: "mixed".into(),
            path: root.path().join("mixed"),
        };
        let cutoff = classifier.config().cutoff(now(), 1.0).unwrap();
        let verdict = classifier.judge(candidate, cutoff).unwrap();

        assert_eq!(verdict.files_checked, 2);
        assert_eq!(verdict.newest.map(|t| t.timestamp()), Some(LAST_MONTH));
        assert!(!verdict.is_old);
    }

    #[test]
    fn entry_names_include_files() {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("dir")).unwrap();
        fs::write(root.path().join("file"), "x").unwrap();

        let mut names = list_entry_names(root.path()).unwrap();
        names.sort();
        assert_eq!(names, vec![OsString::from("dir"), OsString::from("file")]);
    }

    #[cfg(unix)]
    #[test]
    fn file_links_are_judged_by_their_target() {
        use std::os::unix::fs::symlink;

        let root = TempDir::new().unwrap();
        let target = root.path().join("old_files/a.txt");
        write_file(&target, TWO_YEARS_AGO);
        // The link itself is brand new
        symlink(&target, root.path().join("old_files/link.txt")).unwrap();

        let classifier = AgeClassifier::new(ClassifierConfig::default());
        let old = classifier.classify_at(root.path(), 1.0, now()).unwrap();
        assert_eq!(names(&old), vec!["old_files"]);
    }

    #[cfg(unix)]
    #[test]
    fn directory_links_are_candidates_but_not_files() {
        use std::os::unix::fs::symlink;

        let root = TempDir::new().unwrap();
        write_file(&root.path().join("real/old.txt"), TWO_YEARS_AGO);
        symlink(root.path().join("real"), root.path().join("linked_dir")).unwrap();
        // A link to a recent directory inside an old one is not counted as a file
        write_file(&root.path().join("elsewhere/new.txt"), NOW);
        write_file(&root.path().join("holder/old.txt"), TWO_YEARS_AGO);
        symlink(root.path().join("elsewhere"), root.path().join("holder/recent_link")).unwrap();

        let classifier = AgeClassifier::new(ClassifierConfig::default());
        let old = classifier.classify_at(root.path(), 1.0, now()).unwrap();
        assert_eq!(names(&old), vec!["holder", "linked_dir", "real"]);
    }

    #[cfg(unix)]
    #[test]
    fn dangling_link_fails_classification() {
        use std::os::unix::fs::symlink;

        let root = TempDir::new().unwrap();
        write_file(&root.path().join("broken/a.txt"), TWO_YEARS_AGO);
        let link = root.path().join("broken/gone.txt");
        symlink(root.path().join("nowhere.txt"), &link).unwrap();

        let classifier = AgeClassifier::new(ClassifierConfig::default());
        let err = classifier.classify_at(root.path(), 1.0, now()).unwrap_err();
        assert!(matches!(err, OldFolderError::Io { path, .. } if path == link));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn non_utf8_names_are_kept_intact() {
        use std::os::unix::ffi::OsStrExt;

        let root = TempDir::new().unwrap();
        let raw = std::ffi::OsStr::from_bytes(b"old_\xff_files");
        write_file(&root.path().join(raw).join("a.txt"), TWO_YEARS_AGO);

        let classifier = AgeClassifier::new(ClassifierConfig::default());
        let old = classifier.classify_at(root.path(), 1.0, now()).unwrap();
        assert_eq!(old.len(), 1);
        assert_eq!(old[0].name.as_os_str(), raw);
        assert_eq!(old[0].path, root.path().join(raw));
    }
}
