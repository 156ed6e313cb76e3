use anyhow::{bail, Result};
use std::io::{BufRead, Write};

/// Invalid answers tolerated before giving up
pub const MAX_PROMPT_ATTEMPTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportMode {
    /// One CSV file per folder
    Separate,
    /// All folders in one CSV file
    Combined,
}

impl ExportMode {
    fn from_choice(choice: &str) -> Option<Self> {
        match choice.trim() {
            "1" => Some(ExportMode::Separate),
            "2" => Some(ExportMode::Combined),
            _ => None,
        }
    }
}

/// Ask which export mode to use, re-prompting on invalid answers
pub fn prompt_export_mode<R: BufRead, W: Write>(
    mut input: R,
    mut output: W,
    max_attempts: usize,
) -> Result<ExportMode> {
    let mut invalid = 0;
    while invalid < max_attempts {
        writeln!(output, "Choose an option:")?;
        writeln!(output, "1. Generate separate CSV for each folder")?;
        writeln!(output, "2. Combine all folders into one CSV")?;
        writeln!(output)?;
        write!(output, "Enter your choice (1 or 2): ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            bail!("No export mode chosen (input closed)");
        }

        if let Some(mode) = ExportMode::from_choice(&line) {
            return Ok(mode);
        }
        invalid += 1;
        writeln!(output, "\nInvalid choice. Please enter 1 or 2.\n")?;
    }
    bail!("No valid export mode chosen after {} attempts", invalid)
}
