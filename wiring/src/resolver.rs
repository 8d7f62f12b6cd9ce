use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    CustomDefinition, Definition, FactoryCallDefinition, Lookup, ObjectDefinition, Resolvable,
    ResolveError, TypeRegistry, Value,
};

/// Default limit for nested definitions and sequences, see
/// [`DefinitionResolver::with_max_depth`].
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Resolution rule for a [`CustomDefinition`] kind.
pub type Handler = Arc<
    dyn Fn(&CustomDefinition, &HandlerContext<'_>) -> Result<Value, ResolveError> + Send + Sync,
>;

/// State of the resolution a custom handler runs in.
///
/// Values resolved through the context share the registry and the depth
/// limit of the resolution that reached the custom definition.
pub struct HandlerContext<'a> {
    resolver: &'a DefinitionResolver,
    lookup: &'a dyn Lookup,
    depth: usize,
}

impl<'a> HandlerContext<'a> {
    /// Looks up an entry by identifier.
    pub fn get(&self, id: &str) -> Result<Value, ResolveError> {
        self.lookup.get(id)
    }

    /// Resolves a value carried by the custom definition one level below it.
    pub fn resolve(&self, value: &Resolvable) -> Result<Value, ResolveError> {
        self.resolver.resolve_sub_at(value, self.lookup, self.depth + 1)
    }

    pub fn lookup(&self) -> &'a dyn Lookup {
        self.lookup
    }

    pub fn resolver(&self) -> &'a DefinitionResolver {
        self.resolver
    }

    /// Depth of the custom definition being resolved.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// Turns definitions into values.
///
/// The resolver holds no per-call state, so a single instance can serve any
/// number of concurrent resolutions. Every call constructs fresh objects;
/// caching resolved entries is up to the caller.
///
/// # Examples
///
/// ```rust
/// use std::collections::HashMap;
/// use wiring::{DefinitionResolver, ReferenceDefinition, TypeRegistry, Value};
///
/// let entries = HashMap::from([("dsn".to_string(), Value::from("sqlite::memory:"))]);
/// let resolver = DefinitionResolver::new(TypeRegistry::new());
///
/// let value = resolver
///     .resolve(&ReferenceDefinition::new("dsn").into(), &entries)
///     .unwrap();
/// assert_eq!(value.as_str(), Some("sqlite::memory:"));
/// ```
#[derive(Clone)]
pub struct DefinitionResolver {
    registry: Arc<TypeRegistry>,
    handlers: HashMap<String, Handler>,
    max_depth: usize,
}

impl DefinitionResolver {
    pub fn new(registry: impl Into<Arc<TypeRegistry>>) -> Self {
        Self {
            registry: registry.into(),
            handlers: HashMap::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Limits how deep definitions and sequences may nest inside one
    /// definition. Definitions reached through the lookup service start
    /// counting from zero again.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Registers the resolution rule for custom definitions of `kind`.
    pub fn with_handler<F>(self, kind: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&CustomDefinition, &HandlerContext<'_>) -> Result<Value, ResolveError>
            + Send
            + Sync
            + 'static,
    {
        self.with_shared_handler(kind, Arc::new(handler))
    }

    /// Registers an already shared [`Handler`] for custom definitions of `kind`.
    pub fn with_shared_handler(mut self, kind: impl Into<String>, handler: Handler) -> Self {
        self.handlers.insert(kind.into(), handler);
        self
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Resolves a definition, using `lookup` for references.
    pub fn resolve(
        &self,
        definition: &Definition,
        lookup: &dyn Lookup,
    ) -> Result<Value, ResolveError> {
        self.resolve_at(definition, lookup, 0)
    }

    /// Resolves a value that may be a plain value, a sequence or a nested
    /// definition.
    pub fn resolve_sub_definition(
        &self,
        value: &Resolvable,
        lookup: &dyn Lookup,
    ) -> Result<Value, ResolveError> {
        self.resolve_sub_at(value, lookup, 0)
    }

    fn resolve_at(
        &self,
        definition: &Definition,
        lookup: &dyn Lookup,
        depth: usize,
    ) -> Result<Value, ResolveError> {
        self.check_depth(depth)?;
        tracing::trace!(kind = definition.kind(), depth, "Resolving definition");
        match definition {
            Definition::Reference(reference) => lookup.get(reference.target()),
            Definition::Parameter(parameter) => Ok(parameter.value().clone()),
            Definition::Object(object) => self.resolve_object(object, lookup, depth),
            Definition::FactoryCall(factory_call) => {
                self.resolve_factory_call(factory_call, lookup, depth)
            }
            Definition::Custom(custom) => match self.handlers.get(custom.kind()) {
                Some(handler) => handler(
                    custom,
                    &HandlerContext {
                        resolver: self,
                        lookup,
                        depth,
                    },
                ),
                None => Err(ResolveError::UnsupportedDefinition(Box::new(
                    definition.clone(),
                ))),
            },
        }
    }

    fn resolve_sub_at(
        &self,
        value: &Resolvable,
        lookup: &dyn Lookup,
        depth: usize,
    ) -> Result<Value, ResolveError> {
        match value {
            Resolvable::Sequence(items) => {
                self.check_depth(depth)?;
                self.resolve_all(items, lookup, depth).map(Value::Sequence)
            }
            Resolvable::Definition(definition) => self.resolve_at(definition, lookup, depth),
            Resolvable::Value(value) => Ok(value.clone()),
        }
    }

    /// Resolves the members of one argument list, which sit one level below `depth`.
    fn resolve_all(
        &self,
        items: &[Resolvable],
        lookup: &dyn Lookup,
        depth: usize,
    ) -> Result<Vec<Value>, ResolveError> {
        items
            .iter()
            .map(|item| self.resolve_sub_at(item, lookup, depth + 1))
            .collect()
    }

    fn resolve_object(
        &self,
        definition: &ObjectDefinition,
        lookup: &dyn Lookup,
        depth: usize,
    ) -> Result<Value, ResolveError> {
        let registration = self
            .registry
            .get(definition.type_name())
            .ok_or_else(|| ResolveError::UnknownType(definition.type_name().to_owned()))?;
        let arguments = self.resolve_all(definition.constructor_arguments(), lookup, depth)?;
        tracing::debug!(
            type_name = definition.type_name(),
            arguments = arguments.len(),
            "Constructing object"
        );
        let mut instance = registration.construct(arguments)?;
        for assignment in definition.property_assignments() {
            let value = self.resolve_sub_at(assignment.value(), lookup, depth + 1)?;
            registration.assign(&mut *instance, assignment.property_name(), value)?;
        }
        for call in definition.method_calls() {
            let arguments = self.resolve_all(call.arguments(), lookup, depth)?;
            registration.call_exclusive(&mut *instance, call.method_name(), arguments)?;
        }
        Ok(Value::Object(registration.into_object(instance)))
    }

    fn resolve_factory_call(
        &self,
        definition: &FactoryCallDefinition,
        lookup: &dyn Lookup,
        depth: usize,
    ) -> Result<Value, ResolveError> {
        let method = definition.method_name();
        let arguments = self.resolve_all(definition.arguments(), lookup, depth)?;
        match definition.factory() {
            Resolvable::Value(Value::String(type_name)) => {
                self.call_static(type_name, method, arguments)
            }
            Resolvable::Definition(factory) => match factory.as_ref() {
                Definition::Reference(reference) => {
                    let target = reference.target();
                    match lookup.get(target)? {
                        Value::Object(object) => {
                            let registration = self
                                .registry
                                .get_by_type_id(object.instance_type_id())
                                .ok_or_else(|| {
                                    ResolveError::UnknownType(object.type_name().to_owned())
                                })?;
                            tracing::debug!(
                                factory = target,
                                method,
                                "Calling factory instance method"
                            );
                            registration.call_shared(object.as_any(), method, arguments)
                        }
                        Value::String(type_name) => {
                            self.call_static(&type_name, method, arguments)
                        }
                        other => Err(ResolveError::InvalidDefinition(format!(
                            "Entry \"{target}\" does not hold a valid factory for {method}(), found {}",
                            other.kind()
                        ))),
                    }
                }
                other => Err(ResolveError::InvalidDefinition(format!(
                    "Factory of {method}() must be a type name or a reference, found {} definition",
                    other.kind()
                ))),
            },
            other => Err(ResolveError::InvalidDefinition(format!(
                "Factory of {method}() must be a type name or a reference, found {}",
                match other {
                    Resolvable::Value(value) => value.kind(),
                    _ => "sequence",
                }
            ))),
        }
    }

    fn call_static(
        &self,
        type_name: &str,
        method: &str,
        arguments: Vec<Value>,
    ) -> Result<Value, ResolveError> {
        let registration = self
            .registry
            .get(type_name)
            .ok_or_else(|| ResolveError::UnknownType(type_name.to_owned()))?;
        tracing::debug!(type_name, method, "Calling static factory method");
        registration.call_static(method, arguments)
    }

    fn check_depth(&self, depth: usize) -> Result<(), ResolveError> {
        if depth > self.max_depth {
            return Err(ResolveError::DepthExceeded(self.max_depth));
        }
        Ok(())
    }
}
