use super::open_file;
use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Document to check
    pub file: PathBuf,
}

pub fn check(args: CheckArgs, config_dir: &Path) -> Result<()> {
    println!("🔍 {} {}", "Checking".green().bold(), args.file.display());

    let (session, _) = open_file(&args.file, config_dir)?;
    let document = session.document()?;

    let original = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Reading {}", args.file.display()))?;
    let canonical = document.serialize();

    if canonical == original {
        println!("   {} canonical text", "✓".green());
    } else {
        println!(
            "   {} not in canonical form (saving will reformat it)",
            "⚠".yellow()
        );
    }

    let missing = document.root().missing_required();
    for path in &missing {
        println!("   {} missing required field {}", "✗".red(), path.bold());
    }

    if missing.is_empty() {
        println!("   {} all required fields set", "✓".green());
        Ok(())
    } else {
        Err(anyhow!(
            "{} required field(s) missing in {}",
            missing.len(),
            args.file.display()
        ))
    }
}
