use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use crate::config::{ClassifierConfig, EmptyDirPolicy, TimeKind};

#[derive(Parser, Debug)]
#[command(
    name = "oldfolder",
    about = "Move old subdirectories into a storage folder",
    version,
    long_about = "Moves subdirectories whose files have not been modified for a\n\
                  given number of years into a storage folder placed in the same\n\
                  directory. Moves can also be based on accessed or created time.\n\n\
                  Every file inside a subdirectory must be older than the cutoff\n\
                  for the subdirectory to be moved. Nothing is moved until you\n\
                  confirm the list."
)]
pub struct Cli {
    /// Path of the directory whose subdirectories are checked
    pub path: PathBuf,

    /// Number of years since files were last modified, accessed, or created
    pub number: f64,

    /// Name of the storage folder created inside PATH for old subdirectories
    pub storage: String,

    /// Time stat to base the move on
    #[arg(short = 't', long = "time-type", alias = "time_type", value_enum, default_value_t = TimeTypeCli::Modified)]
    pub time_type: TimeTypeCli,

    /// Leave subdirectories that contain no files where they are
    #[arg(long)]
    pub keep_empty: bool,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Show what would be moved without moving anything
    #[arg(long)]
    pub dry_run: bool,

    /// Print the plan as JSON (with --dry-run)
    #[arg(long, requires = "dry_run")]
    pub json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeTypeCli {
    /// Last modification time
    Modified,
    /// Last access time
    Accessed,
    /// Creation time (inode change time where unavailable)
    Created,
}

impl From<TimeTypeCli> for TimeKind {
    fn from(value: TimeTypeCli) -> Self {
        match value {
            TimeTypeCli::Modified => TimeKind::Modified,
            TimeTypeCli::Accessed => TimeKind::Accessed,
            TimeTypeCli::Created => TimeKind::Created,
        }
    }
}

impl Cli {
    /// Classifier settings selected on the command line
    pub fn classifier_config(&self) -> ClassifierConfig {
        let empty_dirs = if self.keep_empty {
            EmptyDirPolicy::Keep
        } else {
            EmptyDirPolicy::Old
        };
        ClassifierConfig::new(self.time_type.into()).with_empty_dirs(empty_dirs)
    }
}
