//! Runtime values produced by definition resolution.
//!
//! A [`Value`] is what a resolved definition evaluates to: a scalar, an ordered
//! sequence, a string-keyed map, or an [`Object`] holding a constructed service
//! instance. Host types convert into values with [`From`] and back out with
//! [`FromValue`].

use std::any::{Any, TypeId, type_name};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Dynamically typed value handed between definitions, the resolver and
/// registered host types.
///
/// # Examples
///
/// ```rust
/// use wiring::Value;
///
/// let value = Value::from(vec!["a", "b"]);
/// assert_eq!(value.kind(), "sequence");
/// assert_eq!(Value::from("text").as_str(), Some("text"));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Sequence(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Object(Object),
}

impl Value {
    /// Wraps a host value into a shared [`Object`].
    pub fn object<T>(value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self::Object(Object::new(value))
    }

    /// Short human readable name of the value shape, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Sequence(_) => "sequence",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(v) => Some(v),
            _ => None,
        }
    }

    /// Borrows the object instance as `T` if this value is an object of that type.
    pub fn downcast_ref<T>(&self) -> Option<&T>
    where
        T: Any,
    {
        self.as_object().and_then(|v| v.downcast_ref())
    }
}

/// Shared, type-erased service instance.
///
/// Cloning an object clones the handle, not the instance. Two objects compare
/// equal only when they point at the same instance.
#[derive(Clone)]
pub struct Object {
    inner: Arc<dyn Any + Send + Sync>,
    type_id: TypeId,
    type_name: &'static str,
}

impl Object {
    pub fn new<T>(value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self::from_arc(Arc::new(value))
    }

    pub fn from_arc<T>(value: Arc<T>) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            inner: value,
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }

    pub(crate) fn from_boxed(
        value: Box<dyn Any + Send + Sync>,
        type_id: TypeId,
        type_name: &'static str,
    ) -> Self {
        Self {
            inner: Arc::from(value),
            type_id,
            type_name,
        }
    }

    /// Type id of the wrapped instance.
    pub fn instance_type_id(&self) -> TypeId {
        self.type_id
    }

    /// Rust type name of the wrapped instance.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T>(&self) -> bool
    where
        T: Any,
    {
        self.inner.is::<T>()
    }

    pub fn downcast_ref<T>(&self) -> Option<&T>
    where
        T: Any,
    {
        self.inner.downcast_ref::<T>()
    }

    pub fn downcast<T>(&self) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        self.inner.clone().downcast::<T>().ok()
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn as_any(&self) -> &(dyn Any + Send + Sync) {
        &*self.inner
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Object").field(&self.type_name).finish()
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Int(i64::from(value))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}

impl<T> From<Arc<T>> for Value
where
    T: Any + Send + Sync,
{
    fn from(value: Arc<T>) -> Self {
        Value::Object(Object::from_arc(value))
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<T> From<Vec<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Vec<T>) -> Self {
        Value::Sequence(value.into_iter().map(Into::into).collect())
    }
}

impl<T> From<BTreeMap<String, T>> for Value
where
    T: Into<Value>,
{
    fn from(value: BTreeMap<String, T>) -> Self {
        Value::Map(value.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

/// Error returned when a [`Value`] cannot be converted into a host type.
#[derive(Debug, Error)]
pub enum ValueError {
    #[error("expected {expected}, found {found}")]
    Mismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("integer {value} is out of range for {target}")]
    OutOfRange { value: i64, target: &'static str },
}

/// Conversion from a resolved [`Value`] into a host type.
///
/// Registered constructors, property setters and methods receive their
/// arguments through this trait.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, ValueError>;
}

fn mismatch<T>(expected: &'static str, value: &Value) -> Result<T, ValueError> {
    let found = match value {
        Value::Object(object) => object.type_name(),
        _ => value.kind(),
    };
    Err(ValueError::Mismatch { expected, found })
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        Ok(value)
    }
}

impl FromValue for Object {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Object(v) => Ok(v),
            other => mismatch("object", &other),
        }
    }
}

impl<T> FromValue for Arc<T>
where
    T: Any + Send + Sync,
{
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match &value {
            Value::Object(object) => match object.downcast::<T>() {
                Some(v) => Ok(v),
                None => mismatch(type_name::<T>(), &value),
            },
            _ => mismatch(type_name::<T>(), &value),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Bool(v) => Ok(v),
            other => mismatch("bool", &other),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::String(v) => Ok(v),
            other => mismatch("string", &other),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value.as_f64() {
            Some(v) => Ok(v),
            None => mismatch("float", &value),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        f64::from_value(value).map(|v| v as f32)
    }
}

macro_rules! impl_from_value_int {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self, ValueError> {
                    match value {
                        Value::Int(v) => <$ty>::try_from(v).map_err(|_| ValueError::OutOfRange {
                            value: v,
                            target: stringify!($ty),
                        }),
                        other => mismatch("int", &other),
                    }
                }
            }
        )*
    };
}

impl_from_value_int!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl<T> FromValue for Option<T>
where
    T: FromValue,
{
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T> FromValue for Vec<T>
where
    T: FromValue,
{
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Sequence(items) => items.into_iter().map(T::from_value).collect(),
            other => mismatch("sequence", &other),
        }
    }
}

impl<T> FromValue for BTreeMap<String, T>
where
    T: FromValue,
{
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Map(items) => items
                .into_iter()
                .map(|(k, v)| T::from_value(v).map(|v| (k, v)))
                .collect(),
            other => mismatch("map", &other),
        }
    }
}
