//! Registry of constructible types.
//!
//! Object and factory-call definitions name types and members by string. The
//! registry maps those names to typed constructors, property setters and
//! methods supplied by the host application, so the set of constructible types
//! is closed and known up front.
//!
//! # Examples
//!
//! ```rust
//! use wiring::{Arguments, TypeBuilder, TypeRegistry, Value};
//!
//! struct Greeter {
//!     greeting: String,
//! }
//!
//! let mut registry = TypeRegistry::new();
//! registry.add_type(
//!     TypeBuilder::<Greeter>::new("Greeter")
//!         .constructor(|mut args: Arguments| {
//!             let greeting = args.arg::<String>()?;
//!             args.finish()?;
//!             Ok(Greeter { greeting })
//!         })
//!         .method("greet", |this: &Greeter, mut args: Arguments| {
//!             let name = args.arg::<String>()?;
//!             args.finish()?;
//!             Ok(Value::from(format!("{} {name}", this.greeting)))
//!         }),
//! );
//!
//! assert!(registry.has_type("Greeter"));
//! ```

use std::any::{Any, TypeId, type_name};
use std::collections::{HashMap, hash_map};
use std::marker::PhantomData;

use crate::{Object, ResolveError, StdError, Value};
use crate::value::FromValue;

type AnyInstance = dyn Any + Send + Sync;
type Constructor = Box<dyn Fn(Arguments) -> Result<Box<AnyInstance>, StdError> + Send + Sync>;
type PropertySetter = Box<dyn Fn(&mut AnyInstance, Value) -> Result<(), StdError> + Send + Sync>;
type StaticMethod = Box<dyn Fn(Arguments) -> Result<Value, StdError> + Send + Sync>;
type SharedMethod = Box<dyn Fn(&AnyInstance, Arguments) -> Result<Value, StdError> + Send + Sync>;
type ExclusiveMethod =
    Box<dyn Fn(&mut AnyInstance, Arguments) -> Result<Value, StdError> + Send + Sync>;

enum Method {
    Static(StaticMethod),
    Shared(SharedMethod),
    Exclusive(ExclusiveMethod),
}

/// Positional arguments passed to a registered constructor or method.
///
/// Arguments are consumed front to back. Asking for an argument that was not
/// supplied is an error, and [`Arguments::finish`] rejects leftovers.
#[derive(Debug)]
pub struct Arguments {
    values: std::vec::IntoIter<Value>,
    position: usize,
}

impl Arguments {
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values: values.into_iter(),
            position: 0,
        }
    }

    /// Number of arguments not consumed yet.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Takes the next argument converted to `T`.
    pub fn arg<T>(&mut self) -> Result<T, StdError>
    where
        T: FromValue,
    {
        let position = self.position;
        let value = self
            .values
            .next()
            .ok_or_else(|| format!("Missing argument #{position}"))?;
        self.position += 1;
        T::from_value(value).map_err(|err| format!("Argument #{position}: {err}").into())
    }

    /// Takes the next argument if one is left.
    pub fn optional_arg<T>(&mut self) -> Result<Option<T>, StdError>
    where
        T: FromValue,
    {
        if self.is_empty() {
            return Ok(None);
        }
        self.arg().map(Some)
    }

    /// Takes all remaining arguments.
    pub fn rest(self) -> Vec<Value> {
        self.values.collect()
    }

    /// Fails if any argument was left unconsumed.
    pub fn finish(self) -> Result<(), StdError> {
        match self.values.len() {
            0 => Ok(()),
            n => Err(format!("{n} unexpected argument(s) after #{}", self.position).into()),
        }
    }
}

/// Type that knows how to register itself.
///
/// Usually implemented with `#[register]` on an impl block or with
/// `#[derive(Register)]`.
pub trait Register: Any + Send + Sync + Sized {
    /// Identifier used by object and factory-call definitions.
    const NAME: &'static str;

    fn register(ty: TypeBuilder<Self>) -> TypeBuilder<Self>;
}

/// Typed builder for a [`TypeRegistry`] entry.
pub struct TypeBuilder<T> {
    registration: TypeRegistration,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypeBuilder<T>
where
    T: Any + Send + Sync,
{
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            registration: TypeRegistration {
                name: name.into(),
                type_id: TypeId::of::<T>(),
                rust_name: type_name::<T>(),
                constructor: None,
                properties: HashMap::new(),
                methods: HashMap::new(),
            },
            _marker: PhantomData,
        }
    }

    pub fn constructor<F>(mut self, func: F) -> Self
    where
        F: Fn(Arguments) -> Result<T, StdError> + Send + Sync + 'static,
    {
        self.registration.constructor = Some(Box::new(move |args| {
            func(args).map(|v| Box::new(v) as Box<AnyInstance>)
        }));
        self
    }

    pub fn property<F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut T, Value) -> Result<(), StdError> + Send + Sync + 'static,
    {
        self.registration.properties.insert(
            name.into(),
            Box::new(move |instance, value| func(downcast_mut::<T>(instance)?, value)),
        );
        self
    }

    /// Registers a method without receiver.
    pub fn static_method<F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Arguments) -> Result<Value, StdError> + Send + Sync + 'static,
    {
        self.registration
            .methods
            .insert(name.into(), Method::Static(Box::new(func)));
        self
    }

    /// Registers a method taking `&T`.
    pub fn method<F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&T, Arguments) -> Result<Value, StdError> + Send + Sync + 'static,
    {
        self.registration.methods.insert(
            name.into(),
            Method::Shared(Box::new(move |instance, args| {
                func(downcast_ref::<T>(instance)?, args)
            })),
        );
        self
    }

    /// Registers a method taking `&mut T`.
    ///
    /// Such methods can only be called while an object definition is being
    /// resolved, never on an instance shared through a container.
    pub fn method_mut<F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut T, Arguments) -> Result<Value, StdError> + Send + Sync + 'static,
    {
        self.registration.methods.insert(
            name.into(),
            Method::Exclusive(Box::new(move |instance, args| {
                func(downcast_mut::<T>(instance)?, args)
            })),
        );
        self
    }
}

fn downcast_ref<T>(instance: &AnyInstance) -> Result<&T, StdError>
where
    T: Any,
{
    instance
        .downcast_ref::<T>()
        .ok_or_else(|| format!("Instance is not a {}", type_name::<T>()).into())
}

fn downcast_mut<T>(instance: &mut AnyInstance) -> Result<&mut T, StdError>
where
    T: Any,
{
    instance
        .downcast_mut::<T>()
        .ok_or_else(|| format!("Instance is not a {}", type_name::<T>()).into())
}

/// Type-erased registry entry produced by a [`TypeBuilder`].
pub struct TypeRegistration {
    name: String,
    type_id: TypeId,
    rust_name: &'static str,
    constructor: Option<Constructor>,
    properties: HashMap<String, PropertySetter>,
    methods: HashMap<String, Method>,
}

impl TypeRegistration {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_constructor(&self) -> bool {
        self.constructor.is_some()
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub(crate) fn construct(&self, arguments: Vec<Value>) -> Result<Box<AnyInstance>, ResolveError> {
        let constructor = self
            .constructor
            .as_ref()
            .ok_or_else(|| ResolveError::NotConstructible(self.name.clone()))?;
        constructor(Arguments::new(arguments)).map_err(|err| self.invocation_error("new", err))
    }

    pub(crate) fn into_object(&self, instance: Box<AnyInstance>) -> Object {
        Object::from_boxed(instance, self.type_id, self.rust_name)
    }

    pub(crate) fn assign(
        &self,
        instance: &mut AnyInstance,
        property: &str,
        value: Value,
    ) -> Result<(), ResolveError> {
        let setter = self
            .properties
            .get(property)
            .ok_or_else(|| ResolveError::UnknownProperty {
                type_name: self.name.clone(),
                property: property.to_owned(),
            })?;
        setter(instance, value).map_err(|err| self.invocation_error(property, err))
    }

    /// Calls a method without an instance.
    pub(crate) fn call_static(
        &self,
        method: &str,
        arguments: Vec<Value>,
    ) -> Result<Value, ResolveError> {
        let args = Arguments::new(arguments);
        let result = match self.method(method)? {
            Method::Static(func) => func(args),
            Method::Shared(_) | Method::Exclusive(_) => {
                return Err(ResolveError::InvalidDefinition(format!(
                    "Method {}::{method} requires an instance",
                    self.name
                )));
            }
        };
        result.map_err(|err| self.invocation_error(method, err))
    }

    /// Calls a method on an instance shared with other owners.
    pub(crate) fn call_shared(
        &self,
        instance: &AnyInstance,
        method: &str,
        arguments: Vec<Value>,
    ) -> Result<Value, ResolveError> {
        let args = Arguments::new(arguments);
        let result = match self.method(method)? {
            Method::Static(func) => func(args),
            Method::Shared(func) => func(instance, args),
            Method::Exclusive(_) => {
                return Err(ResolveError::InvalidDefinition(format!(
                    "Method {}::{method} requires exclusive access to the instance",
                    self.name
                )));
            }
        };
        result.map_err(|err| self.invocation_error(method, err))
    }

    /// Calls a method on an instance that is still being built.
    pub(crate) fn call_exclusive(
        &self,
        instance: &mut AnyInstance,
        method: &str,
        arguments: Vec<Value>,
    ) -> Result<Value, ResolveError> {
        let args = Arguments::new(arguments);
        let result = match self.method(method)? {
            Method::Static(func) => func(args),
            Method::Shared(func) => func(instance, args),
            Method::Exclusive(func) => func(instance, args),
        };
        result.map_err(|err| self.invocation_error(method, err))
    }

    fn method(&self, name: &str) -> Result<&Method, ResolveError> {
        self.methods
            .get(name)
            .ok_or_else(|| ResolveError::UnknownMethod {
                type_name: self.name.clone(),
                method: name.to_owned(),
            })
    }

    fn invocation_error(&self, member: &str, source: StdError) -> ResolveError {
        ResolveError::Invocation {
            type_name: self.name.clone(),
            member: member.to_owned(),
            source,
        }
    }
}

/// Closed set of types that definitions may construct or call into.
#[derive(Default)]
pub struct TypeRegistry {
    types: HashMap<String, TypeRegistration>,
    names: HashMap<TypeId, String>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a type implementing [`Register`] under [`Register::NAME`].
    ///
    /// # Panics
    ///
    /// Panics if a type with the same name or the same Rust type is already registered.
    pub fn add<T>(&mut self) -> &mut Self
    where
        T: Register,
    {
        self.add_type(T::register(TypeBuilder::new(T::NAME)))
    }

    /// Registers a type from an explicit builder.
    ///
    /// # Panics
    ///
    /// Panics if a type with the same name or the same Rust type is already registered.
    pub fn add_type<T>(&mut self, builder: TypeBuilder<T>) -> &mut Self
    where
        T: Any + Send + Sync,
    {
        let registration = builder.registration;
        if self.names.contains_key(&registration.type_id) {
            panic!("Type {} already registered", registration.rust_name);
        }
        match self.types.entry(registration.name.clone()) {
            hash_map::Entry::Occupied(_) => panic!("Type {} already registered", registration.name),
            hash_map::Entry::Vacant(v) => {
                self.names.insert(registration.type_id, registration.name.clone());
                v.insert(registration);
            }
        };
        self
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&TypeRegistration> {
        self.types.get(name)
    }

    /// Finds the registration of the Rust type wrapped by an object.
    pub fn get_by_type_id(&self, type_id: TypeId) -> Option<&TypeRegistration> {
        self.names.get(&type_id).and_then(|name| self.types.get(name))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
