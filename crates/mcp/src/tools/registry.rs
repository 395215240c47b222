// Tool registry: the catalog of callable tools, keyed by name

use crate::protocol::ToolSchema;
use crate::tools::schema::{Arguments, ParamSchema};
use crate::tools::ToolKind;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// A registered tool: its public description and the handler behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub schema: ParamSchema,
    pub handler: ToolKind,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: ParamSchema,
        handler: ToolKind,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
            handler,
        }
    }

    pub fn validate(&self, arguments: &Value) -> Result<Arguments, Vec<String>> {
        self.schema.validate(arguments)
    }

    /// Discovery form of this tool.
    pub fn tool_schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.schema.to_json_schema(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("tool '{0}' is already registered")]
    DuplicateTool(String),

    #[error("tool '{name}' has a malformed schema: {}", .problems.join("; "))]
    MalformedSchema { name: String, problems: Vec<String> },
}

/// Tool registry. Populated once at startup and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, ToolDefinition>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every tool of every domain.
    pub fn with_catalog() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for definition in super::catalog() {
            registry.register(definition)?;
        }
        tracing::debug!(tools = registry.len(), "Tool catalog registered");
        Ok(registry)
    }

    /// Register a tool. Names are unique and schemas must be well formed.
    pub fn register(&mut self, definition: ToolDefinition) -> Result<(), RegistryError> {
        if definition.name.trim().is_empty() {
            return Err(RegistryError::MalformedSchema {
                name: definition.name,
                problems: vec!["tool name is empty".to_string()],
            });
        }
        if self.tools.contains_key(&definition.name) {
            return Err(RegistryError::DuplicateTool(definition.name));
        }

        let problems = definition.schema.problems();
        if !problems.is_empty() {
            return Err(RegistryError::MalformedSchema {
                name: definition.name,
                problems,
            });
        }

        self.tools.insert(definition.name.clone(), definition);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    /// All definitions, sorted by name.
    pub fn list_definitions(&self) -> Vec<&ToolDefinition> {
        self.tools.values().collect()
    }

    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        self.tools.values().map(ToolDefinition::tool_schema).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
