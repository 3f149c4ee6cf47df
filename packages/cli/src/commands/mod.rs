pub mod check;
pub mod edit;
pub mod show;

pub use check::{check, CheckArgs};
pub use edit::{edit, EditArgs};
pub use show::{show, ShowArgs};

use anyhow::{anyhow, Context, Result};
use ddf_editor::{Config, DocumentSession, EditorError, FileStorage};
use ddf_parser::format_error;
use std::path::Path;

/// Open `file` in a session configured from `config_dir`
pub(crate) fn open_file(file: &Path, config_dir: &Path) -> Result<(DocumentSession, FileStorage)> {
    let config = Config::load(config_dir)
        .with_context(|| format!("Loading config from {}", config_dir.display()))?;
    let registry = config.build_registry(config_dir)?;

    let resource_type = registry
        .for_path(file)
        .ok_or_else(|| anyhow!("No resource type registered for {}", file.display()))?;

    let mut session =
        DocumentSession::with_resource_type(resource_type).with_history_config(config.history_config());
    let mut storage = FileStorage::new(file);

    if let Err(err) = session.open(&mut storage) {
        return Err(describe_open_error(file, err));
    }
    Ok((session, storage))
}

/// Parse errors are rendered with source context
fn describe_open_error(file: &Path, err: EditorError) -> anyhow::Error {
    if let EditorError::Open { source, .. } = &err {
        if let EditorError::Parse(parse_error) = source.as_ref() {
            if let Ok(text) = std::fs::read_to_string(file) {
                return anyhow!(format_error(
                    &text,
                    &file.display().to_string(),
                    parse_error
                ));
            }
        }
    }
    anyhow::Error::from(err)
}
