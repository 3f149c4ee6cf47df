use super::open_file;
use anyhow::Result;
use clap::Args;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Document to print
    pub file: PathBuf,
}

pub fn show(args: ShowArgs, config_dir: &Path) -> Result<()> {
    let (session, _) = open_file(&args.file, config_dir)?;
    print!("{}", session.document()?.serialize());
    Ok(())
}
