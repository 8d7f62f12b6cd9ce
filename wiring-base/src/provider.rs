use wiring::{Definition, ParameterDefinition, Resolvable, StdError, Value};

use crate::Config;

/// Source of container definitions.
pub trait DefinitionProvider {
    /// Returns `(identifier, definition)` pairs in a stable order.
    fn definitions(&self) -> Result<Vec<(String, Definition)>, StdError>;
}

/// Provider backed by an ordered list of entries.
///
/// Entries that are definitions are provided as they are. Any other entry is
/// wrapped in a [`ParameterDefinition`] and returned verbatim, so a
/// definition nested in a sequence stays an unresolved [`Definition`] object.
///
/// # Examples
///
/// ```rust
/// use wiring::{Definition, ReferenceDefinition};
/// use wiring_base::{ArrayDefinitionProvider, DefinitionProvider};
///
/// let provider = ArrayDefinitionProvider::new()
///     .with("dsn", "sqlite::memory:")
///     .with("database.dsn", ReferenceDefinition::new("dsn"));
///
/// let definitions = provider.definitions().unwrap();
/// assert!(matches!(definitions[0].1, Definition::Parameter(_)));
/// assert!(matches!(definitions[1].1, Definition::Reference(_)));
/// ```
#[derive(Clone, Debug, Default)]
pub struct ArrayDefinitionProvider {
    entries: Vec<(String, Resolvable)>,
}

impl ArrayDefinitionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: impl Into<String>, entry: impl Into<Resolvable>) -> Self {
        self.entries.push((id.into(), entry.into()));
        self
    }

    /// Creates parameters from the keys of a config section.
    ///
    /// A missing section gives an empty provider. The section must be a JSON
    /// object.
    pub fn from_config(config: &Config, section: &str) -> Result<Self, StdError> {
        let values: Option<serde_json::Map<String, serde_json::Value>> = config.get(section)?;
        let entries = values
            .unwrap_or_default()
            .into_iter()
            .map(|(id, value)| (id, Resolvable::Value(json_to_value(value))))
            .collect();
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DefinitionProvider for ArrayDefinitionProvider {
    fn definitions(&self) -> Result<Vec<(String, Definition)>, StdError> {
        Ok(self
            .entries
            .iter()
            .map(|(id, entry)| {
                let definition = match entry {
                    Resolvable::Definition(definition) => Definition::clone(definition),
                    other => ParameterDefinition::new(opaque_value(other)).into(),
                };
                (id.clone(), definition)
            })
            .collect())
    }
}

/// Converts an entry into a parameter value. Definitions nested in sequences
/// are stored as objects and never resolved.
fn opaque_value(entry: &Resolvable) -> Value {
    match entry {
        Resolvable::Value(value) => value.clone(),
        Resolvable::Sequence(items) => Value::Sequence(items.iter().map(opaque_value).collect()),
        Resolvable::Definition(definition) => Value::object(Definition::clone(definition)),
    }
}

/// Converts a JSON value into a runtime value.
///
/// Integers that do not fit `i64` become floats.
pub fn json_to_value(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(v) => Value::Bool(v),
        serde_json::Value::Number(v) => match v.as_i64() {
            Some(v) => Value::Int(v),
            None => Value::Float(v.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(v) => Value::String(v),
        serde_json::Value::Array(v) => Value::Sequence(v.into_iter().map(json_to_value).collect()),
        serde_json::Value::Object(v) => Value::Map(
            v.into_iter()
                .map(|(key, value)| (key, json_to_value(value)))
                .collect(),
        ),
    }
}
