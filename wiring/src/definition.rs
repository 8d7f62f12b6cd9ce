//! Definition data model.
//!
//! Definitions describe how to obtain a value without obtaining it. They are
//! plain data: every resolution step lives in [`DefinitionResolver`].
//!
//! [`DefinitionResolver`]: crate::DefinitionResolver

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::Value;

/// Description of how to obtain a container value.
///
/// # Examples
///
/// ```rust
/// use wiring::{Definition, ObjectDefinition, ReferenceDefinition};
///
/// let definition: Definition = ObjectDefinition::new("Mailer")
///     .add_constructor_argument(ReferenceDefinition::new("transport"))
///     .add_property_assignment("sender", "noreply@example.com")
///     .add_method_call("set_retries", [3i64.into()])
///     .into();
///
/// assert_eq!(definition.kind(), "object");
/// ```
#[derive(Clone, Debug)]
pub enum Definition {
    Parameter(ParameterDefinition),
    Reference(ReferenceDefinition),
    Object(ObjectDefinition),
    FactoryCall(FactoryCallDefinition),
    Custom(CustomDefinition),
}

impl Definition {
    pub fn kind(&self) -> &'static str {
        match self {
            Definition::Parameter(_) => "parameter",
            Definition::Reference(_) => "reference",
            Definition::Object(_) => "object",
            Definition::FactoryCall(_) => "factory call",
            Definition::Custom(_) => "custom",
        }
    }
}

/// A value appearing at an argument, property or factory position.
///
/// Sequences and nested definitions are resolved recursively, plain values are
/// used as they are.
#[derive(Clone, Debug)]
pub enum Resolvable {
    Value(Value),
    Sequence(Vec<Resolvable>),
    Definition(Box<Definition>),
}

impl Resolvable {
    /// Returns the plain value if nothing inside needs resolution.
    pub fn to_plain_value(&self) -> Option<Value> {
        match self {
            Resolvable::Value(v) => Some(v.clone()),
            Resolvable::Sequence(items) => items
                .iter()
                .map(Resolvable::to_plain_value)
                .collect::<Option<Vec<_>>>()
                .map(Value::Sequence),
            Resolvable::Definition(_) => None,
        }
    }
}

/// Constant value, returned verbatim.
#[derive(Clone, Debug)]
pub struct ParameterDefinition {
    value: Value,
}

impl ParameterDefinition {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// Alias of another container entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceDefinition {
    target: String,
}

impl ReferenceDefinition {
    /// # Panics
    ///
    /// Panics if `target` is empty.
    pub fn new(target: impl Into<String>) -> Self {
        let target = target.into();
        assert!(!target.is_empty(), "Reference target must not be empty");
        Self { target }
    }

    /// Identifier of the referenced container entry.
    pub fn target(&self) -> &str {
        &self.target
    }
}

/// Instance of a registered type built from constructor arguments, then
/// configured through property assignments and method calls.
///
/// Property assignments run in insertion order after construction, method
/// calls run in insertion order after all property assignments.
#[derive(Clone, Debug)]
pub struct ObjectDefinition {
    type_name: String,
    constructor_arguments: Vec<Resolvable>,
    property_assignments: Vec<PropertyAssignment>,
    method_calls: Vec<MethodCall>,
}

impl ObjectDefinition {
    /// # Panics
    ///
    /// Panics if `type_name` is empty.
    pub fn new(type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        assert!(!type_name.is_empty(), "Object type name must not be empty");
        Self {
            type_name,
            constructor_arguments: Vec::new(),
            property_assignments: Vec::new(),
            method_calls: Vec::new(),
        }
    }

    pub fn add_constructor_argument(mut self, argument: impl Into<Resolvable>) -> Self {
        self.constructor_arguments.push(argument.into());
        self
    }

    /// Replaces all constructor arguments.
    pub fn set_constructor_arguments<I>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = Resolvable>,
    {
        self.constructor_arguments = arguments.into_iter().collect();
        self
    }

    pub fn add_property_assignment(
        mut self,
        property_name: impl Into<String>,
        value: impl Into<Resolvable>,
    ) -> Self {
        self.property_assignments
            .push(PropertyAssignment::new(property_name, value));
        self
    }

    pub fn add_method_call<I>(mut self, method_name: impl Into<String>, arguments: I) -> Self
    where
        I: IntoIterator<Item = Resolvable>,
    {
        self.method_calls.push(MethodCall::new(method_name, arguments));
        self
    }

    /// Identifier of the registered type to construct.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn constructor_arguments(&self) -> &[Resolvable] {
        &self.constructor_arguments
    }

    pub fn property_assignments(&self) -> &[PropertyAssignment] {
        &self.property_assignments
    }

    pub fn method_calls(&self) -> &[MethodCall] {
        &self.method_calls
    }
}

#[derive(Clone, Debug)]
pub struct PropertyAssignment {
    property_name: String,
    value: Resolvable,
}

impl PropertyAssignment {
    /// # Panics
    ///
    /// Panics if `property_name` is empty.
    pub fn new(property_name: impl Into<String>, value: impl Into<Resolvable>) -> Self {
        let property_name = property_name.into();
        assert!(!property_name.is_empty(), "Property name must not be empty");
        Self {
            property_name,
            value: value.into(),
        }
    }

    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    pub fn value(&self) -> &Resolvable {
        &self.value
    }
}

#[derive(Clone, Debug)]
pub struct MethodCall {
    method_name: String,
    arguments: Vec<Resolvable>,
}

impl MethodCall {
    /// # Panics
    ///
    /// Panics if `method_name` is empty.
    pub fn new<I>(method_name: impl Into<String>, arguments: I) -> Self
    where
        I: IntoIterator<Item = Resolvable>,
    {
        let method_name = method_name.into();
        assert!(!method_name.is_empty(), "Method name must not be empty");
        Self {
            method_name,
            arguments: arguments.into_iter().collect(),
        }
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    pub fn arguments(&self) -> &[Resolvable] {
        &self.arguments
    }
}

/// Call of a factory method.
///
/// The factory is either a type name, which makes the call static, or a
/// [`ReferenceDefinition`] to a container entry holding the factory instance.
/// Any other factory shape is rejected when the definition is resolved.
#[derive(Clone, Debug)]
pub struct FactoryCallDefinition {
    factory: Resolvable,
    method_name: String,
    arguments: Vec<Resolvable>,
}

impl FactoryCallDefinition {
    /// # Panics
    ///
    /// Panics if `method_name` is empty.
    pub fn new(factory: impl Into<Resolvable>, method_name: impl Into<String>) -> Self {
        let method_name = method_name.into();
        assert!(
            !method_name.is_empty(),
            "Factory method name must not be empty"
        );
        Self {
            factory: factory.into(),
            method_name,
            arguments: Vec::new(),
        }
    }

    /// Replaces all arguments passed to the factory method.
    pub fn set_arguments<I>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = Resolvable>,
    {
        self.arguments = arguments.into_iter().collect();
        self
    }

    pub fn add_argument(mut self, argument: impl Into<Resolvable>) -> Self {
        self.arguments.push(argument.into());
        self
    }

    pub fn factory(&self) -> &Resolvable {
        &self.factory
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    pub fn arguments(&self) -> &[Resolvable] {
        &self.arguments
    }
}

/// Definition of a kind the core does not know about.
///
/// Resolving it requires a handler registered for its kind, see
/// [`DefinitionResolver::with_handler`](crate::DefinitionResolver::with_handler).
#[derive(Clone)]
pub struct CustomDefinition {
    kind: String,
    payload: Arc<dyn Any + Send + Sync>,
}

impl CustomDefinition {
    pub fn new<T>(kind: impl Into<String>, payload: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            kind: kind.into(),
            payload: Arc::new(payload),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn payload<T>(&self) -> Option<&T>
    where
        T: Any,
    {
        self.payload.downcast_ref::<T>()
    }
}

impl fmt::Debug for CustomDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomDefinition")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

macro_rules! impl_definition_variant {
    ($($variant:ident($ty:ty)),*) => {
        $(
            impl From<$ty> for Definition {
                fn from(value: $ty) -> Self {
                    Definition::$variant(value)
                }
            }

            impl From<$ty> for Resolvable {
                fn from(value: $ty) -> Self {
                    Resolvable::Definition(Box::new(Definition::$variant(value)))
                }
            }
        )*
    };
}

impl_definition_variant!(
    Parameter(ParameterDefinition),
    Reference(ReferenceDefinition),
    Object(ObjectDefinition),
    FactoryCall(FactoryCallDefinition),
    Custom(CustomDefinition)
);

impl From<Definition> for Resolvable {
    fn from(value: Definition) -> Self {
        Resolvable::Definition(Box::new(value))
    }
}

impl From<Vec<Resolvable>> for Resolvable {
    fn from(value: Vec<Resolvable>) -> Self {
        Resolvable::Sequence(value)
    }
}

impl From<Value> for Resolvable {
    fn from(value: Value) -> Self {
        Resolvable::Value(value)
    }
}

macro_rules! impl_resolvable_scalar {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Resolvable {
                fn from(value: $ty) -> Self {
                    Resolvable::Value(value.into())
                }
            }
        )*
    };
}

impl_resolvable_scalar!((), bool, i32, i64, u32, f64, &str, String);
