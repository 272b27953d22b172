//! oldfolder - move old subdirectories into a storage folder
//!
//! A subdirectory is old when every file beneath it has a modified,
//! accessed, or created time earlier than a cutoff. Old subdirectories are
//! listed, confirmed once, then moved into a storage folder next to them.

pub mod config;
pub mod error;
pub mod scanner;
pub mod archive;
pub mod prompt;
pub mod cli;

// Re-exports for easy access
pub use config::{ClassifierConfig, EmptyDirPolicy, TimeKind, SECONDS_PER_YEAR};
pub use error::{OldFolderError, Result};
pub use scanner::{AgeClassifier, Candidate, Verdict};
pub use archive::{MoveOperation, MovePlan, MoveSummary, Relocator, RunOutcome};
pub use prompt::{AssumeYes, Confirm, TerminalPrompt};
pub use cli::Cli;

pub mod colors {
    use colored::Color;

    pub const SUCCESS: Color = Color::TrueColor { r: 77, g: 255, b: 157 };
    pub const HEADER: Color = Color::TrueColor { r: 157, g: 77, b: 255 };
    pub const PATH: Color = Color::TrueColor { r: 77, g: 195, b: 255 };
    pub const WARNING: Color = Color::TrueColor { r: 255, g: 217, b: 61 };
}

/// Current version of oldfolder
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
