use wiring::{
    CustomDefinition, Definition, FactoryCallDefinition, ObjectDefinition, ParameterDefinition,
    ReferenceDefinition, Resolvable, Value,
};

#[test]
fn test_definition_kinds() {
    let definitions: Vec<(Definition, &str)> = vec![
        (ParameterDefinition::new(1).into(), "parameter"),
        (ReferenceDefinition::new("a").into(), "reference"),
        (ObjectDefinition::new("A").into(), "object"),
        (FactoryCallDefinition::new("A", "create").into(), "factory call"),
        (CustomDefinition::new("env", ()).into(), "custom"),
    ];
    for (definition, kind) in definitions {
        assert_eq!(definition.kind(), kind);
    }
}

#[test]
fn test_object_definition_builder() {
    let definition = ObjectDefinition::new("Mailer")
        .add_constructor_argument("smtp")
        .add_property_assignment("sender", ReferenceDefinition::new("sender"))
        .add_property_assignment("retries", 3)
        .add_method_call("set_logger", [ReferenceDefinition::new("logger").into()])
        .add_method_call("enable", []);

    assert_eq!(definition.type_name(), "Mailer");
    assert_eq!(definition.constructor_arguments().len(), 1);

    let properties: Vec<_> = definition
        .property_assignments()
        .iter()
        .map(|assignment| assignment.property_name())
        .collect();
    assert_eq!(properties, ["sender", "retries"]);
    assert!(matches!(
        definition.property_assignments()[0].value(),
        Resolvable::Definition(definition)
            if matches!(&**definition,Definition::Reference(r) if r.target() == "sender")
    ));

    let methods: Vec<_> = definition
        .method_calls()
        .iter()
        .map(|call| (call.method_name(), call.arguments().len()))
        .collect();
    assert_eq!(methods, [("set_logger", 1), ("enable", 0)]);
}

#[test]
fn test_set_constructor_arguments_replaces_existing() {
    let definition = ObjectDefinition::new("A")
        .add_constructor_argument(1)
        .set_constructor_arguments(["a".into(), "b".into()]);
    let arguments: Vec<_> = definition
        .constructor_arguments()
        .iter()
        .map(|argument| argument.to_plain_value())
        .collect();
    assert_eq!(
        arguments,
        [Some(Value::from("a")), Some(Value::from("b"))]
    );
}

#[test]
fn test_factory_call_definition_builder() {
    let definition = FactoryCallDefinition::new(ReferenceDefinition::new("factory"), "create")
        .add_argument("first")
        .add_argument(ReferenceDefinition::new("second"));
    assert_eq!(definition.method_name(), "create");
    assert_eq!(definition.arguments().len(), 2);
    assert!(matches!(definition.factory(), Resolvable::Definition(_)));

    let definition = definition.set_arguments([]);
    assert!(definition.arguments().is_empty());

    let definition = FactoryCallDefinition::new("Factory", "static_create");
    assert_eq!(
        definition.factory().to_plain_value(),
        Some(Value::from("Factory"))
    );
}

#[test]
fn test_parameter_definition_keeps_value() {
    let definition = ParameterDefinition::new(vec!["a", "b"]);
    assert_eq!(
        definition.value(),
        &Value::Sequence(vec![Value::from("a"), Value::from("b")])
    );
}

#[test]
fn test_plain_value_of_resolvables() {
    let plain = Resolvable::from(vec![Resolvable::from(1), vec![Resolvable::from("x")].into()]);
    assert_eq!(
        plain.to_plain_value(),
        Some(Value::Sequence(vec![Value::from(1), Value::from(vec!["x"])]))
    );

    let nested = Resolvable::from(vec![
        Resolvable::from(1),
        ReferenceDefinition::new("x").into(),
    ]);
    assert_eq!(nested.to_plain_value(), None);
}

#[test]
fn test_custom_definition_payload() {
    let definition = CustomDefinition::new("env", String::from("HOME"));
    assert_eq!(definition.kind(), "env");
    assert_eq!(definition.payload::<String>().map(String::as_str), Some("HOME"));
    assert!(definition.payload::<i64>().is_none());
}

#[test]
#[should_panic(expected = "Reference target must not be empty")]
fn test_empty_reference_target() {
    ReferenceDefinition::new("");
}

#[test]
#[should_panic(expected = "Object type name must not be empty")]
fn test_empty_object_type_name() {
    ObjectDefinition::new("");
}

#[test]
#[should_panic(expected = "Factory method name must not be empty")]
fn test_empty_factory_method_name() {
    FactoryCallDefinition::new("Factory", "");
}

#[test]
#[should_panic(expected = "Property name must not be empty")]
fn test_empty_property_name() {
    ObjectDefinition::new("A").add_property_assignment("", 1);
}

#[test]
#[should_panic(expected = "Method name must not be empty")]
fn test_empty_method_call_name() {
    ObjectDefinition::new("A").add_method_call("", [Resolvable::from(1)]);
}
