//! Resource types map file extensions to the message schema their files hold.

use ddf_parser::{Message, MessageSchema};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ResourceType {
    /// Display name, used as the session title
    pub name: String,

    /// Extension without the leading dot, lowercase
    pub extension: String,

    pub schema: Arc<MessageSchema>,
}

impl ResourceType {
    pub fn new(name: impl Into<String>, extension: &str, schema: Arc<MessageSchema>) -> Self {
        Self {
            name: name.into(),
            extension: normalize_extension(extension),
            schema,
        }
    }

    /// Empty message of this type, ready to be filled by the parser
    pub fn new_builder(&self) -> Message {
        Message::new(self.schema.clone())
    }
}

fn normalize_extension(extension: &str) -> String {
    extension.trim_start_matches('.').to_ascii_lowercase()
}

#[derive(Debug, Clone, Default)]
pub struct ResourceTypeRegistry {
    types: HashMap<String, Arc<ResourceType>>,
}

impl ResourceTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type, replacing any previous one for the same extension
    pub fn register(&mut self, resource_type: ResourceType) -> Option<Arc<ResourceType>> {
        self.types
            .insert(resource_type.extension.clone(), Arc::new(resource_type))
    }

    pub fn get(&self, extension: &str) -> Option<Arc<ResourceType>> {
        self.types.get(&normalize_extension(extension)).cloned()
    }

    /// Look up by the extension of a file path
    pub fn for_path(&self, path: &Path) -> Option<Arc<ResourceType>> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.get(ext))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ResourceType>> {
        self.types.values()
    }
}
