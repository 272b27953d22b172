use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use tracing::{info, warn};
use crate::config::{ClassifierConfig, TimeKind};
use crate::error::{OldFolderError, Result};
use crate::prompt::Confirm;
use crate::scanner::{self, AgeClassifier, Candidate};

/// A single planned relocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveOperation {
    #[serde(serialize_with = "serialize_lossy")]
    pub name: OsString,
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Ordered moves computed before anything on disk changes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovePlan {
    pub root: PathBuf,
    pub storage: String,
    pub time_kind: TimeKind,
    pub operations: Vec<MoveOperation>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MoveSummary {
    pub moved: Vec<MoveOperation>,
    pub cross_device: usize,
}

/// How a run ended
#[derive(Debug)]
pub enum RunOutcome {
    NothingToMove { time_kind: TimeKind },
    Declined { plan: MovePlan },
    Completed { summary: MoveSummary },
}

pub struct Relocator {
    root: PathBuf,
    storage: String,
    years: f64,
    classifier: AgeClassifier,
}

impl MoveOperation {
    /// Folder name for display; invalid UTF-8 is replaced
    pub fn display_name(&self) -> Cow<'_, str> {
        self.name.to_string_lossy()
    }
}

fn serialize_lossy<S: Serializer>(name: &OsString, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&name.to_string_lossy())
}

impl MovePlan {
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn storage_path(&self) -> PathBuf {
        self.root.join(&self.storage)
    }
}

impl Relocator {
    pub fn new(root: impl Into<PathBuf>, years: f64, storage: impl Into<String>, config: ClassifierConfig) -> Self {
        Self {
            root: root.into(),
            storage: storage.into(),
            years,
            classifier: AgeClassifier::new(config),
        }
    }

    /// Validate the inputs and compute the move plan
    pub fn prepare(&self) -> Result<MovePlan> {
        self.prepare_at(Utc::now())
    }

    pub fn prepare_at(&self, now: DateTime<Utc>) -> Result<MovePlan> {
        scanner::ensure_root(&self.root)?;
        validate_storage_name(&self.storage)?;

        // Checked against every entry before any timestamp is read
        let existing = scanner::list_entry_names(&self.root)?;
        check_conflict(&self.root, &self.storage, &existing)?;

        let old = self.classifier.classify_at(&self.root, self.years, now)?;
        Ok(build_plan(
            &self.root,
            &self.storage,
            self.classifier.config().time_kind,
            old,
        ))
    }

    /// Drive one full run: plan, confirm, then move
    pub fn run(&self, confirm: &mut dyn Confirm) -> Result<RunOutcome> {
        let plan = self.prepare()?;
        finish(plan, confirm)
    }
}

/// Ask for confirmation on a prepared plan and execute it if accepted
pub fn finish(plan: MovePlan, confirm: &mut dyn Confirm) -> Result<RunOutcome> {
    if plan.is_empty() {
        return Ok(RunOutcome::NothingToMove {
            time_kind: plan.time_kind,
        });
    }

    if !confirm.confirm(&plan)? {
        info!(storage = %plan.storage, "move declined");
        return Ok(RunOutcome::Declined { plan });
    }

    let summary = execute(&plan)?;
    Ok(RunOutcome::Completed { summary })
}

/// Storage names must be one plain folder name
pub fn validate_storage_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    let single_normal = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );

    if single_normal && !name.contains(['/', '\\']) {
        Ok(())
    } else {
        Err(OldFolderError::InvalidStorageName {
            name: name.to_string(),
        })
    }
}

/// Refuse a storage name that already names an entry of the root
pub fn check_conflict(root: &Path, storage: &str, existing: &[OsString]) -> Result<()> {
    if existing.iter().any(|name| name.as_os_str() == OsStr::new(storage)) {
        return Err(OldFolderError::FolderAlreadyExists {
            name: storage.to_string(),
            root: root.to_path_buf(),
        });
    }
    Ok(())
}

/// Pair each old candidate with its place inside the storage folder
pub fn build_plan(root: &Path, storage: &str, time_kind: TimeKind, old: Vec<Candidate>) -> MovePlan {
    let storage_dir = root.join(storage);
    let operations = old
        .into_iter()
        .map(|candidate| MoveOperation {
            destination: storage_dir.join(&candidate.name),
            source: candidate.path,
            name: candidate.name,
        })
        .collect();

    MovePlan {
        root: root.to_path_buf(),
        storage: storage.to_string(),
        time_kind,
        operations,
    }
}

/// Perform every move in plan order, stopping at the first failure.
///
/// Moves that finished before a failure stay where they are.
pub fn execute(plan: &MovePlan) -> Result<MoveSummary> {
    let mut summary = MoveSummary::default();

    for operation in &plan.operations {
        let completed = summary.moved.len();
        let fail = |source: io::Error| OldFolderError::Move {
            from: operation.source.clone(),
            to: operation.destination.clone(),
            completed,
            source,
        };

        if let Some(parent) = operation.destination.parent() {
            if !parent.is_dir() {
                fs::create_dir_all(parent).map_err(fail)?;
            }
        }

        let copied = move_dir(&operation.source, &operation.destination).map_err(fail)?;
        if copied {
            summary.cross_device += 1;
        }

        info!(
            from = %operation.source.display(),
            to = %operation.destination.display(),
            "moved"
        );
        summary.moved.push(operation.clone());
    }

    Ok(summary)
}

/// Rename, or copy then delete when the rename crosses devices.
///
/// Returns `true` when the copy fallback was used.
fn move_dir(source: &Path, destination: &Path) -> io::Result<bool> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(false),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            warn!(from = %source.display(), "rename crosses devices, copying instead");
            let parent = destination
                .parent()
                .ok_or_else(|| io::Error::other("destination has no parent"))?;
            let options = fs_extra::dir::CopyOptions::new();
            fs_extra::dir::move_dir(source, parent, &options).map_err(io::Error::other)?;
            Ok(true)
        }
        Err(e) => Err(e),
    }
}
