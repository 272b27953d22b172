use std::io::{self, BufRead, IsTerminal, Write};
use colored::*;
use dialoguer::{theme::ColorfulTheme, Input};
use crate::archive::MovePlan;
use crate::colors;
use crate::config::TimeKind;
use crate::error::{OldFolderError, Result};

pub const PROCEED_PROMPT: &str = "Would you like to proceed?: Y/N";

/// Source of the single yes/no decision taken before moving anything
pub trait Confirm {
    fn confirm(&mut self, plan: &MovePlan) -> Result<bool>;
}

impl<F> Confirm for F
where
    F: FnMut(&MovePlan) -> bool,
{
    fn confirm(&mut self, plan: &MovePlan) -> Result<bool> {
        Ok(self(plan))
    }
}

/// Shows the plan on stdout and reads the answer from standard input.
///
/// Interactive terminals get a dialoguer prompt; piped input is read a line at a time.
pub struct TerminalPrompt;

/// Writes the plan and prompt to `output` and reads one answer line from `input`
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

/// Accepts every plan without asking
pub struct AssumeYes;

impl Confirm for TerminalPrompt {
    fn confirm(&mut self, plan: &MovePlan) -> Result<bool> {
        if !io::stdin().is_terminal() {
            let mut lines = LinePrompt::new(io::stdin().lock(), io::stdout());
            return lines.confirm(plan);
        }

        print!("{}", plan_listing(plan));

        let answer: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt(PROCEED_PROMPT)
            .allow_empty(true)
            .interact_text()
            .map_err(|source| OldFolderError::Prompt { source })?;

        Ok(is_affirmative(&answer))
    }
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, plan: &MovePlan) -> io::Result<String> {
        write!(self.output, "{}{} ", plan_listing(plan), PROCEED_PROMPT)?;
        self.output.flush()?;

        // End of input reads as an empty answer
        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        Ok(answer)
    }
}

impl<R: BufRead, W: Write> Confirm for LinePrompt<R, W> {
    fn confirm(&mut self, plan: &MovePlan) -> Result<bool> {
        let answer = self
            .ask(plan)
            .map_err(|source| OldFolderError::ReadAnswer { source })?;
        Ok(is_affirmative(&answer))
    }
}

impl Confirm for AssumeYes {
    fn confirm(&mut self, plan: &MovePlan) -> Result<bool> {
        print!("{}", plan_listing(plan));
        println!("{} Proceeding without confirmation (--yes)", "ℹ️".cyan());
        Ok(true)
    }
}

/// `y` or `yes` in any case
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_uppercase().as_str(), "Y" | "YES")
}

/// Header plus one tab-indented line per subdirectory to move
pub fn plan_listing(plan: &MovePlan) -> String {
    let mut out = format!(
        "Based on the {} times of the files contained within them,\n\
         the subdirectories that will be moved to the {} folder are:\n",
        plan.time_kind,
        plan.storage.color(colors::PATH)
    );
    for operation in &plan.operations {
        out.push_str(&format!("\t {}\n", operation.display_name()));
    }
    out
}

pub fn nothing_to_move(time_kind: TimeKind) -> String {
    format!(
        "All subdirectories contain files with {time_kind} times\n\
         in the specified period so the operation was aborted"
    )
}

pub const COMPLETE: &str = "Operation complete";
pub const ABORTED: &str = "Operation aborted";
