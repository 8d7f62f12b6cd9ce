use std::collections::{BTreeMap, HashMap};

use wiring::{
    Arguments, DefinitionResolver, FactoryCallDefinition, FromValue, ObjectDefinition,
    ResolveError, TypeBuilder, TypeRegistry, Value, ValueError,
};

struct Counter {
    start: i64,
    step: i64,
    label: Option<String>,
}

fn counter_type() -> TypeBuilder<Counter> {
    TypeBuilder::<Counter>::new("Counter")
        .constructor(|mut args: Arguments| {
            let start = args.arg()?;
            let step = args.optional_arg()?.unwrap_or(1);
            args.finish()?;
            Ok(Counter {
                start,
                step,
                label: None,
            })
        })
        .property("label", |counter: &mut Counter, value: Value| {
            counter.label = Option::<String>::from_value(value)?;
            Ok(())
        })
        .method("next", |counter: &Counter, args: Arguments| {
            args.finish()?;
            Ok(Value::from(counter.start + counter.step))
        })
        .method_mut("advance", |counter: &mut Counter, mut args: Arguments| {
            let times: i64 = args.arg()?;
            args.finish()?;
            counter.start += counter.step * times;
            Ok(Value::Null)
        })
        .static_method("sum", |args: Arguments| {
            let total = args
                .rest()
                .into_iter()
                .map(i64::from_value)
                .sum::<Result<i64, ValueError>>()?;
            Ok(Value::from(total))
        })
}

struct Opaque;

fn registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry
        .add_type(counter_type())
        .add_type(TypeBuilder::<Opaque>::new("Opaque"));
    registry
}

#[test]
fn test_registry_lookup() {
    let registry = registry();
    assert_eq!(registry.len(), 2);
    assert!(!registry.is_empty());
    assert!(registry.has_type("Counter"));
    assert!(!registry.has_type("Missing"));

    let counter = registry.get("Counter").unwrap();
    assert_eq!(counter.name(), "Counter");
    assert!(counter.has_constructor());
    assert!(counter.has_property("label"));
    assert!(counter.has_method("next"));
    assert!(counter.has_method("advance"));
    assert!(counter.has_method("sum"));
    assert!(!counter.has_method("label"));

    let by_id = registry
        .get_by_type_id(std::any::TypeId::of::<Counter>())
        .unwrap();
    assert_eq!(by_id.name(), "Counter");
    assert!(!registry.get("Opaque").unwrap().has_constructor());
}

#[test]
#[should_panic(expected = "Type Counter already registered")]
fn test_duplicate_type_name() {
    let mut registry = registry();
    registry.add_type(TypeBuilder::<String>::new("Counter"));
}

#[test]
#[should_panic(expected = "already registered")]
fn test_duplicate_rust_type() {
    let mut registry = registry();
    registry.add_type(TypeBuilder::<Counter>::new("OtherCounter"));
}

#[test]
fn test_arguments() {
    let mut args = Arguments::new(vec![Value::from(1), Value::from("two"), Value::Null]);
    assert_eq!(args.len(), 3);
    assert_eq!(args.arg::<i64>().unwrap(), 1);
    assert_eq!(args.arg::<String>().unwrap(), "two");
    assert_eq!(args.optional_arg::<Option<i64>>().unwrap(), Some(None));
    assert!(args.is_empty());
    assert_eq!(args.optional_arg::<i64>().unwrap(), None);
    assert!(args.finish().is_ok());
}

#[test]
fn test_argument_errors() {
    let mut args = Arguments::new(vec![]);
    let err = args.arg::<i64>().unwrap_err();
    assert_eq!(err.to_string(), "Missing argument #0");

    let mut args = Arguments::new(vec![Value::from("x")]);
    let err = args.arg::<i64>().unwrap_err();
    assert!(err.to_string().starts_with("Argument #0:"), "{err}");

    let args = Arguments::new(vec![Value::from(1), Value::from(2)]);
    assert!(args.finish().is_err());
}

#[test]
fn test_value_conversions() {
    assert_eq!(u8::from_value(Value::from(255)).unwrap(), 255);
    assert!(matches!(
        u8::from_value(Value::from(256)),
        Err(ValueError::OutOfRange { value: 256, .. })
    ));
    assert!(matches!(
        bool::from_value(Value::from("true")),
        Err(ValueError::Mismatch { expected: "bool", found: "string" })
    ));

    let map = BTreeMap::from([("a".to_owned(), Value::from(1))]);
    let converted = BTreeMap::<String, i64>::from_value(Value::Map(map)).unwrap();
    assert_eq!(converted.get("a"), Some(&1));

    let sequence = Vec::<String>::from_value(Value::from(vec!["a", "b"])).unwrap();
    assert_eq!(sequence, ["a", "b"]);
}

#[test]
fn test_builder_members_through_resolver() {
    let resolver = DefinitionResolver::new(registry());
    let entries: HashMap<String, Value> = HashMap::new();

    let definition = ObjectDefinition::new("Counter")
        .add_constructor_argument(10)
        .add_constructor_argument(5)
        .add_property_assignment("label", "ticks")
        .add_method_call("advance", [2.into()]);
    let value = resolver.resolve(&definition.into(), &entries).unwrap();
    let counter = value.downcast_ref::<Counter>().unwrap();
    assert_eq!(counter.start, 20);
    assert_eq!(counter.label.as_deref(), Some("ticks"));

    let definition = FactoryCallDefinition::new("Counter", "sum")
        .set_arguments([1.into(), 2.into(), 3.into()]);
    let value = resolver.resolve(&definition.into(), &entries).unwrap();
    assert_eq!(value, Value::from(6));
}

#[test]
fn test_type_without_constructor() {
    let resolver = DefinitionResolver::new(registry());
    let entries: HashMap<String, Value> = HashMap::new();
    let result = resolver.resolve(&ObjectDefinition::new("Opaque").into(), &entries);
    assert!(matches!(
        result,
        Err(ResolveError::NotConstructible(name)) if name == "Opaque"
    ));
}
