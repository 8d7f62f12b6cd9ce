use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::mem::take;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wiring::{
    CustomDefinition, DEFAULT_MAX_DEPTH, Definition, DefinitionResolver, Handler, HandlerContext,
    Lookup, ResolveError, StdError, TypeRegistry, Value,
};

use crate::{Config, ConfigSection, DefinitionProvider};

/// Resolver settings read from the `resolver` config section.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

impl ConfigSection for ResolverConfig {
    fn key() -> &'static str {
        "resolver"
    }
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("Entry \"{0}\" is already defined")]
    DuplicateEntry(String),
    #[error("Definition provider failed: {0}")]
    Provider(#[source] StdError),
    #[error("Invalid container config: {0}")]
    Config(#[source] StdError),
}

/// Container mapping identifiers to definitions.
///
/// Entries are materialized on first lookup and cached for the lifetime of
/// the container, so every later lookup returns the same value. References
/// nested in a definition are looked up through the same container.
///
/// # Examples
///
/// ```rust
/// use wiring::{ReferenceDefinition, TypeRegistry};
/// use wiring_base::Container;
///
/// let container = Container::builder()
///     .add_entry("dsn", "sqlite::memory:")
///     .add_definition("database.dsn", ReferenceDefinition::new("dsn"))
///     .build(TypeRegistry::new())
///     .unwrap();
///
/// let dsn = container.get("database.dsn").unwrap();
/// assert_eq!(dsn.as_str(), Some("sqlite::memory:"));
/// ```
pub struct Container {
    resolver: DefinitionResolver,
    definitions: HashMap<String, Definition>,
    entries: DashMap<String, Value>,
}

impl Container {
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::default()
    }

    /// Returns the entry, materializing its definition on first lookup.
    pub fn get(&self, id: &str) -> Result<Value, ResolveError> {
        self.scope().get(id)
    }

    pub fn has(&self, id: &str) -> bool {
        self.entries.contains_key(id) || self.definitions.contains_key(id)
    }

    /// Resolves a definition that is not part of the container against its
    /// entries. The result is not cached.
    pub fn resolve(&self, definition: &Definition) -> Result<Value, ResolveError> {
        self.resolver.resolve(definition, &self.scope())
    }

    /// Returns true if the entry holds a value already.
    pub fn is_materialized(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn resolver(&self) -> &DefinitionResolver {
        &self.resolver
    }

    fn scope(&self) -> ResolutionScope<'_> {
        ResolutionScope {
            container: self,
            stack: RefCell::new(Vec::new()),
        }
    }
}

impl Lookup for Container {
    fn get(&self, id: &str) -> Result<Value, ResolveError> {
        Container::get(self, id)
    }

    fn has(&self, id: &str) -> bool {
        Container::has(self, id)
    }
}

/// Lookup handle for one top-level resolution.
///
/// Tracks the entries being materialized to detect reference cycles.
struct ResolutionScope<'a> {
    container: &'a Container,
    stack: RefCell<Vec<String>>,
}

impl Lookup for ResolutionScope<'_> {
    fn get(&self, id: &str) -> Result<Value, ResolveError> {
        if let Some(value) = self.container.entries.get(id) {
            return Ok(value.clone());
        }
        let Some(definition) = self.container.definitions.get(id) else {
            return Err(ResolveError::EntryNotFound(id.to_owned()));
        };
        {
            let mut stack = self.stack.borrow_mut();
            if let Some(position) = stack.iter().position(|v| v == id) {
                let mut chain = stack[position..].to_vec();
                chain.push(id.to_owned());
                return Err(ResolveError::CircularReference(chain));
            }
            stack.push(id.to_owned());
        }
        let result = self.container.resolver.resolve(definition, self);
        self.stack.borrow_mut().pop();
        let value = result?;
        tracing::debug!(id, kind = definition.kind(), "Materialized entry");
        // A concurrent lookup may have stored the entry first.
        Ok(self
            .container
            .entries
            .entry(id.to_owned())
            .or_insert(value)
            .clone())
    }

    fn has(&self, id: &str) -> bool {
        self.container.has(id)
    }
}

/// Builder for [`Container`].
#[derive(Default)]
pub struct ContainerBuilder {
    entries: Vec<(String, Value)>,
    definitions: Vec<(String, Definition)>,
    providers: Vec<Box<dyn DefinitionProvider>>,
    handlers: Vec<(String, Handler)>,
    resolver_config: ResolverConfig,
}

impl ContainerBuilder {
    /// Adds an entry holding a value that needs no resolution.
    pub fn add_entry(&mut self, id: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.entries.push((id.into(), value.into()));
        self
    }

    pub fn add_definition(
        &mut self,
        id: impl Into<String>,
        definition: impl Into<Definition>,
    ) -> &mut Self {
        self.definitions.push((id.into(), definition.into()));
        self
    }

    /// Adds every definition of `provider`. Providers are read by
    /// [`ContainerBuilder::build`].
    pub fn add_provider<T>(&mut self, provider: T) -> &mut Self
    where
        T: DefinitionProvider + 'static,
    {
        self.providers.push(Box::new(provider));
        self
    }

    /// Registers the resolution rule for custom definitions of `kind`.
    pub fn with_handler<F>(&mut self, kind: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(&CustomDefinition, &HandlerContext<'_>) -> Result<Value, ResolveError>
            + Send
            + Sync
            + 'static,
    {
        self.handlers.push((kind.into(), Arc::new(handler)));
        self
    }

    pub fn with_resolver_config(&mut self, config: ResolverConfig) -> &mut Self {
        self.resolver_config = config;
        self
    }

    /// Applies the `resolver` section of `config`, if present.
    pub fn with_config(&mut self, config: &Config) -> Result<&mut Self, ContainerError> {
        if let Some(resolver_config) = config
            .section::<ResolverConfig>()
            .map_err(ContainerError::Config)?
        {
            self.resolver_config = resolver_config;
        }
        Ok(self)
    }

    /// Builds the container, reading all providers.
    ///
    /// Identifiers must be unique across entries, definitions and providers.
    pub fn build(
        &mut self,
        registry: impl Into<Arc<TypeRegistry>>,
    ) -> Result<Container, ContainerError> {
        let mut resolver =
            DefinitionResolver::new(registry).with_max_depth(self.resolver_config.max_depth);
        for (kind, handler) in take(&mut self.handlers) {
            resolver = resolver.with_shared_handler(kind, handler);
        }

        let mut ids = HashSet::new();
        let mut definitions = take(&mut self.definitions);
        for provider in take(&mut self.providers) {
            definitions.extend(provider.definitions().map_err(ContainerError::Provider)?);
        }
        let entries = DashMap::new();
        for (id, value) in take(&mut self.entries) {
            reserve_id(&mut ids, &id)?;
            entries.insert(id, value);
        }
        let definitions = definitions
            .into_iter()
            .map(|(id, definition)| reserve_id(&mut ids, &id).map(|_| (id, definition)))
            .collect::<Result<HashMap<_, _>, _>>()?;

        tracing::debug!(
            entries = entries.len(),
            definitions = definitions.len(),
            max_depth = resolver.max_depth(),
            "Container built"
        );
        Ok(Container {
            resolver,
            definitions,
            entries,
        })
    }
}

fn reserve_id(ids: &mut HashSet<String>, id: &str) -> Result<(), ContainerError> {
    if !ids.insert(id.to_owned()) {
        return Err(ContainerError::DuplicateEntry(id.to_owned()));
    }
    Ok(())
}
