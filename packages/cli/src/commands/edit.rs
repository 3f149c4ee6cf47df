use super::open_file;
use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgMatches, Args};
use colored::Colorize;
use ddf_editor::{Document, FieldPath, Mutation, Value};
use ddf_parser::{parse_value, FieldType};
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Document to edit
    pub file: PathBuf,

    /// Set a field or element: `name=hud`, `textures[0].path="b.png"`
    #[arg(long = "set", value_name = "PATH=VALUE")]
    pub set: Vec<String>,

    /// Append to a repeated field: `tags=ui`
    #[arg(long = "append", value_name = "PATH=VALUE")]
    pub append: Vec<String>,

    /// Unset a field
    #[arg(long = "clear", value_name = "PATH")]
    pub clear: Vec<String>,

    /// Remove an element of a repeated field: `textures[2]`
    #[arg(long = "remove", value_name = "PATH[INDEX]")]
    pub remove: Vec<String>,

    /// Print the result instead of saving
    #[arg(long)]
    pub dry_run: bool,
}

/// One command-line edit, before it is resolved against the document
#[derive(Debug, Clone, PartialEq)]
enum Edit {
    Set(FieldPath, String),
    Append(FieldPath, String),
    Clear(FieldPath),
    Remove(FieldPath),
}

impl EditArgs {
    /// Edits in the order they were given on the command line
    fn edits(&self, matches: &ArgMatches) -> Result<Vec<Edit>> {
        let mut edits = Vec::new();
        for (index, arg) in indexed(matches, "set", &self.set) {
            let (path, value) = split_assignment(arg)?;
            edits.push((index, Edit::Set(path, value)));
        }
        for (index, arg) in indexed(matches, "append", &self.append) {
            let (path, value) = split_assignment(arg)?;
            edits.push((index, Edit::Append(path, value)));
        }
        for (index, arg) in indexed(matches, "clear", &self.clear) {
            edits.push((index, Edit::Clear(arg.parse()?)));
        }
        for (index, arg) in indexed(matches, "remove", &self.remove) {
            edits.push((index, Edit::Remove(arg.parse()?)));
        }
        edits.sort_by_key(|(index, _)| *index);
        Ok(edits.into_iter().map(|(_, edit)| edit).collect())
    }
}

/// Pair each value of a repeatable flag with its position in argv
fn indexed<'a>(matches: &ArgMatches, id: &str, values: &'a [String]) -> impl Iterator<Item = (usize, &'a String)> {
    let indices: Vec<usize> = matches
        .indices_of(id)
        .map(|indices| indices.collect())
        .unwrap_or_default();
    indices.into_iter().zip(values)
}

pub fn edit(args: EditArgs, matches: &ArgMatches, config_dir: &Path) -> Result<()> {
    let edits = args.edits(matches)?;
    if edits.is_empty() {
        bail!("Nothing to do: pass --set, --append, --clear or --remove");
    }

    let (mut session, mut storage) = open_file(&args.file, config_dir)?;

    session.begin_batch(format!("ddf edit ({} changes)", edits.len()))?;
    for edit in &edits {
        let mutation = to_mutation(session.document()?, edit)?;
        let label = mutation.describe();
        session
            .apply(mutation)
            .with_context(|| format!("{} failed", label))?;
        println!("   {} {}", "✓".green(), label);
    }
    session.end_batch()?;

    if args.dry_run {
        print!("{}", session.document()?.serialize());
        return Ok(());
    }

    session.save(&mut storage)?;
    println!(
        "💾 {} {}",
        "Saved".green().bold(),
        args.file.display()
    );
    Ok(())
}

fn split_assignment(arg: &str) -> Result<(FieldPath, String)> {
    let (path, value) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected PATH=VALUE, got '{}'", arg))?;
    Ok((path.trim().parse()?, value.to_string()))
}

fn to_mutation(document: &Document, edit: &Edit) -> Result<Mutation> {
    let path = match edit {
        Edit::Set(path, _) | Edit::Append(path, _) | Edit::Clear(path) | Edit::Remove(path) => path,
    };
    let (target, field, index) = path
        .split_field()
        .ok_or_else(|| anyhow!("'{}' does not name a field", path))?;
    let field = field.to_string();

    let mutation = match (edit, index) {
        (Edit::Set(_, text), None) => Mutation::SetField {
            value: field_value(document, &target, &field, text)?,
            target,
            field,
        },
        (Edit::Set(_, text), Some(index)) => Mutation::SetElement {
            value: field_value(document, &target, &field, text)?,
            target,
            field,
            index,
        },
        (Edit::Append(_, text), None) => Mutation::AppendElement {
            value: field_value(document, &target, &field, text)?,
            target,
            field,
        },
        (Edit::Clear(_), None) => Mutation::ClearField { target, field },
        (Edit::Remove(_), Some(index)) => Mutation::RemoveElement {
            target,
            field,
            index,
        },
        (Edit::Remove(_), None) => bail!("--remove needs an index, e.g. {}[0]", path),
        (_, Some(_)) => bail!("'{}' must name a field, not an element", path),
    };
    Ok(mutation)
}

/// Parse `text` as a value of `field`; bare text is accepted for string fields
fn field_value(document: &Document, target: &FieldPath, field: &str, text: &str) -> Result<Value> {
    let message = document.message_at(target)?;
    let schema = message.field_schema(field)?;

    let trimmed = text.trim();
    if matches!(schema.ty, FieldType::String) && !trimmed.starts_with(|c: char| c == '"' || c == '\'') {
        return Ok(Value::String(text.to_string()));
    }

    parse_value(trimmed, schema).with_context(|| format!("Invalid value for {}: {}", field, text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ddf_editor::ResourceType;
    use clap::FromArgMatches;
    use ddf_parser::MessageSchema;

    fn document() -> Document {
        let texture = MessageSchema::builder("Texture")
            .required("path", 1, FieldType::String)
            .optional("width", 2, FieldType::UInt32)
            .build()
            .unwrap();
        let schema = MessageSchema::builder("TextureSet")
            .required("name", 1, FieldType::String)
            .repeated("textures", 2, FieldType::Message(texture))
            .build()
            .unwrap();
        let resource_type = ResourceType::new("Texture Set", "texture_set", schema);
        Document::load(
            "ui.texture_set",
            r#"name: "ui" textures { path: "a.png" }"#,
            &resource_type,
        )
        .unwrap()
    }

    fn edit_for(argv: &[&str]) -> Vec<Edit> {
        let command = EditArgs::augment_args(clap::Command::new("edit"));
        let matches = command
            .try_get_matches_from(["edit", "ui.texture_set"].iter().chain(argv))
            .unwrap();
        let args = EditArgs::from_arg_matches(&matches).unwrap();
        args.edits(&matches).unwrap()
    }

    #[test]
    fn test_set_bare_string() {
        let doc = document();
        let edits = edit_for(&["--set", "name=hud"]);
        assert_eq!(
            to_mutation(&doc, &edits[0]).unwrap(),
            Mutation::set_field(FieldPath::root(), "name", "hud")
        );
    }

    #[test]
    fn test_set_nested_scalar() {
        let doc = document();
        let edits = edit_for(&["--set", "textures[0].width=256"]);
        assert_eq!(
            to_mutation(&doc, &edits[0]).unwrap(),
            Mutation::set_field(FieldPath::parse("textures[0]").unwrap(), "width", Value::UInt(256))
        );
    }

    #[test]
    fn test_append_message_body() {
        let doc = document();
        let edits = edit_for(&["--append", r#"textures={ path: "b.png" }"#]);
        match to_mutation(&doc, &edits[0]).unwrap() {
            Mutation::AppendElement { value, .. } => {
                let texture = value.as_message().unwrap();
                assert_eq!(texture.get("path").and_then(Value::as_str), Some("b.png"));
            }
            other => panic!("expected append, got {:?}", other),
        }
    }

    #[test]
    fn test_remove_requires_index() {
        let doc = document();
        let edits = edit_for(&["--remove", "textures"]);
        assert!(to_mutation(&doc, &edits[0]).is_err());

        let edits = edit_for(&["--remove", "textures[0]"]);
        assert_eq!(
            to_mutation(&doc, &edits[0]).unwrap(),
            Mutation::remove(FieldPath::root(), "textures", 0)
        );
    }

    #[test]
    fn test_invalid_value_reported() {
        let doc = document();
        let edits = edit_for(&["--set", "textures[0].width=-1"]);
        assert!(to_mutation(&doc, &edits[0]).is_err());
    }

    #[test]
    fn test_edits_keep_command_line_order() {
        let edits = edit_for(&[
            "--remove", "textures[0]",
            "--set", "name=x",
            "--append", "textures={ path: \"c.png\" }",
            "--clear", "name",
        ]);
        assert!(matches!(edits[0], Edit::Remove(..)));
        assert!(matches!(edits[1], Edit::Set(..)));
        assert!(matches!(edits[2], Edit::Append(..)));
        assert!(matches!(edits[3], Edit::Clear(..)));
    }

    #[test]
    fn test_malformed_assignment() {
        assert!(split_assignment("name").is_err());
        assert!(split_assignment("a..b=1").is_err());
    }
}
