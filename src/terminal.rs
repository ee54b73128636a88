//! Interactive terminal front-end: prompts on an input stream, writes to an output
//! stream. Generic over both so tests can drive it with in-memory buffers.

use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::fs_ops::clean_input;
use crate::relocate::{Frontend, Question, TargetChoice};

pub struct TerminalFrontend<R, W> {
    input: R,
    output: W,
    /// Answer every question with yes and never show menus (`--yes`).
    assume_yes: bool,
}

/// Parse a yes/no answer. Empty input picks `default`; anything unrecognised is `None`.
pub fn parse_yes_no(answer: &str, default: bool) -> Option<bool> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

impl<R: BufRead, W: Write> TerminalFrontend<R, W> {
    pub fn new(input: R, output: W, assume_yes: bool) -> Self {
        Self {
            input,
            output,
            assume_yes,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// One line of input without the newline; `None` at end of input.
    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let n = self.input.read_line(&mut line).context("read from terminal")?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{text}").context("write to terminal")
    }

    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{prompt}").context("write to terminal")?;
        self.output.flush().context("flush terminal")?;
        self.read_line()
    }

    /// Ask until the answer parses. End of input counts as "no".
    pub fn ask_yes_no(&mut self, prompt: &str, default: bool) -> Result<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            let Some(answer) = self.ask(&format!("{prompt} {hint}: "))? else {
                return Ok(false);
            };
            match parse_yes_no(&answer, default) {
                Some(v) => return Ok(v),
                None => self.say("Please answer y or n.")?,
            }
        }
    }

    /// Ask for a directory; empty input (or end of input) takes `default`.
    pub fn prompt_for_path(&mut self, label: &str, default: &Path) -> Result<PathBuf> {
        if self.assume_yes {
            return Ok(default.to_path_buf());
        }
        let answer = self.ask(&format!("{label} [{}]: ", default.display()))?;
        Ok(match answer {
            Some(a) if !a.trim().is_empty() => clean_input(&a),
            _ => default.to_path_buf(),
        })
    }
}

impl<R: BufRead, W: Write> Frontend for TerminalFrontend<R, W> {
    fn confirm(&mut self, question: &Question) -> Result<bool> {
        self.say("")?;
        for line in question.details() {
            self.say(&line)?;
        }
        if self.assume_yes {
            self.say(&format!("{} [yes]", question.prompt()))?;
            return Ok(true);
        }
        self.ask_yes_no(&question.prompt(), question.default_answer())
    }

    fn choose_existing_target(&mut self, target: &Path) -> Result<TargetChoice> {
        if self.assume_yes {
            self.say(&format!(
                "Target {} already exists; pass --overwrite or --link-only to proceed without prompts.",
                target.display()
            ))?;
            return Ok(TargetChoice::Abort);
        }
        self.say("")?;
        self.say("The target directory already exists. Options:")?;
        self.say("1) Enter a different target directory")?;
        self.say("2) Delete the target, then copy (overwrite)")?;
        self.say("3) Skip copying; delete the source and link it to the existing target")?;
        self.say("4) Exit")?;
        loop {
            let Some(answer) = self.ask("Choose [1-4]: ")? else {
                return Ok(TargetChoice::Abort);
            };
            match answer.trim() {
                "1" => return Ok(TargetChoice::Reenter),
                "2" => return Ok(TargetChoice::Overwrite),
                "3" => return Ok(TargetChoice::LinkOnly),
                "4" => return Ok(TargetChoice::Abort),
                _ => self.say("Invalid choice, try again.")?,
            }
        }
    }

    fn reenter_target(&mut self, current: &Path) -> Result<Option<PathBuf>> {
        if self.assume_yes {
            return Ok(None);
        }
        let answer = self.ask(&format!("Target directory [{}]: ", current.display()))?;
        Ok(match answer {
            None => None,
            Some(a) if a.trim().is_empty() => Some(current.to_path_buf()),
            Some(a) => Some(clean_input(&a)),
        })
    }
}
