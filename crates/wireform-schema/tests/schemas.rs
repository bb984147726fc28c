//! End-to-end behaviour of bound schemas: validation, representation,
//! composition, authoring checks and the message bridge.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use wireform_schema::{
    Attribute, AttributeSource, CharField, Choice, ChoiceField, ConfigError, Context, DeclareField,
    EngineConfig, FloatField, IntegerField, ListField, Message, MethodField, NestedField,
    RepresentationError, RpcStatus, Schema, SchemaDef, SchemaError, StatusCode, ValidationError,
};

fn address() -> Arc<SchemaDef> {
    SchemaDef::builder("Address")
        .field("city", CharField::new().required(true))
        .field("zip", CharField::new().max_length(5))
        .build()
        .unwrap()
}

fn person() -> Arc<SchemaDef> {
    SchemaDef::builder("Person")
        .field("name", CharField::new().required(true))
        .field(
            "role",
            ChoiceField::new([Choice::pair(1, "admin"), Choice::pair(2, "staff")]),
        )
        .field("home", NestedField::new(&address()))
        .field("score", FloatField::new().default_value(0.5))
        .build()
        .unwrap()
}

#[test]
fn choice_keys_resolve_from_text() {
    let ok = Schema::new(&person()).request_data(json!({"name": "ada", "role": "2"}));
    assert!(ok.is_valid());
    assert_eq!(
        ok.validated_data().unwrap(),
        &json!({"name": "ada", "role": 2, "score": 0.5})
    );

    let bad = Schema::new(&person()).request_data(json!({"name": "ada", "role": "9"}));
    assert!(!bad.is_valid());
    assert_eq!(
        bad.errors().unwrap().unwrap().to_json(),
        json!({"role": ["\"9\" is not a valid choice."]})
    );
}

#[test]
fn partial_skips_absent_fields_at_every_depth() {
    let full = Schema::new(&person()).request_data(json!({"home": {}}));
    assert!(!full.is_valid());
    assert_eq!(
        full.errors().unwrap().unwrap().to_json(),
        json!({
            "name": ["This field is required."],
            "home": {"city": ["This field is required."]},
        })
    );

    let partial = Schema::new(&person())
        .partial(true)
        .request_data(json!({"home": {"zip": "123"}}));
    assert!(partial.is_valid());
    assert_eq!(
        partial.validated_data().unwrap(),
        &json!({"home": {"zip": "123"}})
    );
}

#[test]
fn dotted_sources_read_and_write_nested_paths() {
    let def = SchemaDef::builder("Flat")
        .field("city", CharField::new().source("profile.city"))
        .field("name", CharField::new())
        .build()
        .unwrap();

    let schema = Schema::new(&def).request_data(json!({"city": "Paris", "name": "ada"}));
    assert!(schema.is_valid());
    assert_eq!(
        schema.validated_data().unwrap(),
        &json!({"profile": {"city": "Paris"}, "name": "ada"})
    );

    let model = json!({"profile": {"city": "Rome"}, "name": "grace"});
    let out = Schema::new(&def).instance(&model);
    assert_eq!(out.data().unwrap(), json!({"city": "Rome", "name": "grace"}));
}

#[test]
fn explicit_null_survives_both_directions() {
    let def = SchemaDef::builder("Nick")
        .field("nickname", CharField::new().allow_null(true))
        .build()
        .unwrap();

    let schema = Schema::new(&def).request_data(json!({"nickname": null}));
    assert!(schema.is_valid());
    assert_eq!(schema.validated_data().unwrap(), &json!({"nickname": null}));

    let model = json!({"nickname": null});
    assert_eq!(
        Schema::new(&def).instance(&model).data().unwrap(),
        json!({"nickname": null})
    );

    let strict = SchemaDef::builder("Strict")
        .field("nickname", CharField::new())
        .build()
        .unwrap();
    let rejected = Schema::new(&strict).request_data(json!({"nickname": null}));
    assert!(!rejected.is_valid());
    assert_eq!(rejected.errors().unwrap().unwrap().codes(), vec!["null"]);
}

#[test]
fn representation_fills_defaults_and_reports_missing_required() {
    let model = json!({"name": "ada"});
    let out = Schema::new(&person()).instance(&model);
    assert_eq!(out.data().unwrap(), json!({"name": "ada", "score": 0.5}));

    let nameless = json!({"role": 1});
    let out = Schema::new(&person()).instance(&nameless);
    assert!(matches!(
        out.data(),
        Err(SchemaError::Representation(RepresentationError::MissingAttribute { ref field, .. }))
            if field == "name"
    ));
}

#[test]
fn validated_data_represents_back_to_itself() {
    let payload = json!({"name": "ada", "role": 1, "home": {"city": "Oslo", "zip": "0150"}, "score": 2.5});
    let schema = Schema::new(&person()).request_data(payload.clone());
    assert!(schema.is_valid());
    let validated = schema.validated_data().unwrap().clone();
    let again = Schema::new(&person()).instance(&validated);
    assert_eq!(again.data().unwrap(), payload);
}

struct Pet {
    kind: Value,
}

impl AttributeSource for Pet {
    fn attribute(&self, name: &str) -> Option<Attribute<'_>> {
        (name == "kind").then(|| Attribute::Borrowed(&self.kind))
    }
}

struct Owner {
    name: String,
    pets: Vec<Pet>,
}

impl AttributeSource for Owner {
    fn attribute(&self, name: &str) -> Option<Attribute<'_>> {
        match name {
            "name" => Some(Attribute::Value(json!(self.name))),
            "pets" => Some(Attribute::Objects(
                self.pets.iter().map(|p| p as &dyn AttributeSource).collect(),
            )),
            "shout" => Some(Attribute::Callable(Box::new(move || {
                Attribute::Value(json!(self.name.to_uppercase()))
            }))),
            _ => None,
        }
    }

    fn type_name(&self) -> &str {
        "Owner"
    }
}

#[test]
fn attribute_sources_are_represented_like_mappings() {
    let pet = SchemaDef::builder("Pet")
        .field("kind", CharField::new())
        .build()
        .unwrap();
    let owner_def = SchemaDef::builder("Owner")
        .field("name", CharField::new())
        .field("loud", CharField::new().source("shout"))
        .field("pets", NestedField::many(&pet))
        .field("count", MethodField::new())
        .method("get_count", |instance, _| {
            Ok(json!(instance
                .get("pets")
                .map_or(0, |pets| match pets {
                    wireform_schema::Instance::Objects(objects) => objects.len(),
                    _ => 0,
                })))
        })
        .build()
        .unwrap();

    let owner = Owner {
        name: "ada".to_string(),
        pets: vec![Pet { kind: json!("cat") }, Pet { kind: json!("owl") }],
    };
    let schema = Schema::new(&owner_def).instance(&owner as &dyn AttributeSource);
    assert_eq!(
        schema.data().unwrap(),
        json!({
            "name": "ada",
            "loud": "ADA",
            "pets": [{"kind": "cat"}, {"kind": "owl"}],
            "count": 2,
        })
    );
}

#[test]
fn method_fields_see_the_context() {
    let def = SchemaDef::builder("Greeting")
        .field("name", CharField::new())
        .field("greeting", MethodField::new().method_name("greet"))
        .method("greet", |instance, context: &Context| {
            let prefix = context.get("prefix").and_then(Value::as_str).unwrap_or("hi");
            let name = instance
                .get("name")
                .and_then(|n| n.into_value())
                .unwrap_or(Value::Null);
            Ok(json!(format!("{prefix} {}", name.as_str().unwrap_or("?"))))
        })
        .build()
        .unwrap();

    let mut context = Context::new();
    context.insert("prefix".to_string(), json!("hello"));
    let model = json!({"name": "ada"});
    let schema = Schema::new(&def).instance(&model).context(context);
    assert_eq!(
        schema.data().unwrap(),
        json!({"name": "ada", "greeting": "hello ada"})
    );
}

#[test]
fn hooks_rewrite_and_reject() {
    let def = SchemaDef::builder("Signup")
        .field("email", CharField::new().required(true))
        .field("password", CharField::new().required(true))
        .field("confirm", CharField::new().required(true))
        .clean_field("email", |value, _| {
            Ok(json!(value.as_str().unwrap_or_default().to_lowercase()))
        })
        .clean(|mut data, _| {
            if data.get("password") != data.get("confirm") {
                return Err(ValidationError::message("invalid", "Passwords differ."));
            }
            data.remove("confirm");
            Ok(data)
        })
        .post_process("email", |_, value, _| {
            Ok(json!(format!("<{}>", value.as_str().unwrap_or_default())))
        })
        .clean_representation(|mut data, _| {
            data.remove("password");
            data
        })
        .build()
        .unwrap();

    let ok = Schema::new(&def)
        .request_data(json!({"email": "ADA@X.IO", "password": "p", "confirm": "p"}));
    assert!(ok.is_valid());
    assert_eq!(
        ok.validated_data().unwrap(),
        &json!({"email": "ada@x.io", "password": "p"})
    );

    let differ = Schema::new(&def)
        .request_data(json!({"email": "a@x.io", "password": "p", "confirm": "q"}));
    assert!(!differ.is_valid());
    assert_eq!(
        differ.errors().unwrap().unwrap().to_json(),
        json!(["Passwords differ."])
    );

    let model = json!({"email": "a@x.io", "password": "secret", "confirm": "secret"});
    assert_eq!(
        Schema::new(&def).instance(&model).data().unwrap(),
        json!({"email": "<a@x.io>", "confirm": "secret"})
    );
}

#[test]
fn extends_keeps_parent_order_and_overrides_in_place() {
    let base = SchemaDef::builder("Base")
        .field("id", IntegerField::new().required(true))
        .field("name", CharField::new())
        .build()
        .unwrap();
    let child = SchemaDef::builder("Child")
        .extends(&base)
        .field("name", CharField::new().max_length(3))
        .field("email", CharField::new())
        .build()
        .unwrap();

    let names: Vec<&str> = child.fields().keys().map(String::as_str).collect();
    assert_eq!(names, vec!["id", "name", "email"]);

    let schema = Schema::new(&child).request_data(json!({"id": 1, "name": "long"}));
    assert!(!schema.is_valid());
    assert_eq!(schema.errors().unwrap().unwrap().codes(), vec!["max_length"]);
    assert!(Schema::new(&base)
        .request_data(json!({"id": 1, "name": "long"}))
        .is_valid());
}

#[test]
fn authoring_mistakes_fail_at_build() {
    let duplicate = SchemaDef::builder("Dup")
        .field("a", CharField::new())
        .field("a", IntegerField::new())
        .build();
    assert!(matches!(duplicate, Err(ConfigError::DuplicateField { ref field, .. }) if field == "a"));

    let redundant = SchemaDef::builder("Src")
        .field("name", CharField::new().source("name"))
        .build();
    assert!(matches!(redundant, Err(ConfigError::RedundantSource { .. })));

    let method_name = SchemaDef::builder("Meth")
        .field("title", MethodField::new().method_name("get_title"))
        .method("get_title", |_, _| Ok(Value::Null))
        .build();
    assert!(matches!(
        method_name,
        Err(ConfigError::RedundantMethodName { ref method, .. }) if method == "get_title"
    ));

    let missing = SchemaDef::builder("Meth")
        .field("title", MethodField::new())
        .build();
    assert!(matches!(
        missing,
        Err(ConfigError::MissingMethod { ref method, .. }) if method == "get_title"
    ));
}

#[derive(Debug, Deserialize, PartialEq)]
struct PersonMessage {
    name: String,
    #[serde(default)]
    role: Option<i64>,
}

impl Message for PersonMessage {
    const TYPE_NAME: &'static str = "people.v1.Person";
}

#[derive(Debug, Deserialize)]
struct Other {}

impl Message for Other {
    const TYPE_NAME: &'static str = "other.v1.Other";
}

#[test]
fn message_bridge() {
    let model = json!({"name": "ada", "role": 2, "score": 1.0});

    let undeclared = Schema::new(&person()).instance(&model);
    assert!(matches!(
        undeclared.message::<PersonMessage>(),
        Err(SchemaError::Config(ConfigError::MissingMessageType { .. }))
    ));

    let declared = SchemaDef::builder("PersonOut")
        .extends(&person())
        .message::<PersonMessage>()
        .build()
        .unwrap();
    let schema = Schema::new(&declared).instance(&model);
    assert_eq!(
        schema.message::<PersonMessage>().unwrap(),
        PersonMessage {
            name: "ada".to_string(),
            role: Some(2)
        }
    );
    assert!(matches!(
        schema.message::<Other>(),
        Err(SchemaError::Config(ConfigError::MessageTypeMismatch { .. }))
    ));

    let models = json!([{"name": "a"}, {"name": "b", "role": 1}]);
    let many = Schema::many(&declared).instance(&models);
    let messages = many.messages::<PersonMessage>().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].role, Some(1));
}

#[test]
fn failures_carry_rpc_status() {
    let schema = Schema::new(&person()).request_data(json!({}));
    let err = schema.validate().unwrap_err();
    assert_eq!(err.status(), StatusCode::InvalidArgument);
    let details: Value = serde_json::from_str(&err.details()).unwrap();
    assert_eq!(details, json!({"name": ["This field is required."]}));

    let unvalidated = Schema::new(&person()).request_data(json!({}));
    let err = unvalidated.errors().unwrap_err();
    assert_eq!(err.status(), StatusCode::Internal);
}

#[test]
fn engine_messages_override_defaults() {
    let config = EngineConfig::from_yaml_str("messages:\n  required: Missing.\n").unwrap();
    let def = SchemaDef::builder("Conf")
        .config(Arc::new(config))
        .field("a", CharField::new().required(true))
        .field(
            "b",
            CharField::new()
                .required(true)
                .error_message("required", "Need b."),
        )
        .build()
        .unwrap();
    let schema = Schema::new(&def).request_data(json!({}));
    assert!(!schema.is_valid());
    assert_eq!(
        schema.errors().unwrap().unwrap().to_json(),
        json!({"a": ["Missing."], "b": ["Need b."]})
    );
}

#[test]
fn nested_definitions_keep_their_own_messages() {
    let config = EngineConfig::from_yaml_str("messages:\n  required: City missing.\n").unwrap();
    let place = SchemaDef::builder("Place")
        .config(Arc::new(config))
        .field("city", CharField::new().required(true))
        .build()
        .unwrap();
    let def = SchemaDef::builder("Trip")
        .field("name", CharField::new().required(true))
        .field("to", NestedField::new(&place))
        .build()
        .unwrap();
    let schema = Schema::new(&def).request_data(json!({"to": {}}));
    assert!(!schema.is_valid());
    assert_eq!(
        schema.errors().unwrap().unwrap().to_json(),
        json!({"name": ["This field is required."], "to": {"city": ["City missing."]}})
    );
}

#[test]
fn list_fields_collect_item_errors() {
    let def = SchemaDef::builder("Tags")
        .field(
            "tags",
            ListField::of(CharField::new().max_length(3)).allow_empty(false),
        )
        .build()
        .unwrap();
    let schema = Schema::new(&def).request_data(json!({"tags": ["ok", "toolong", "no", "nope"]}));
    assert!(!schema.is_valid());
    let errors = schema.errors().unwrap().unwrap();
    let tags = errors.field("tags").unwrap();
    assert!(tags.item(1).is_some());
    assert!(tags.item(3).is_some());
    assert!(tags.item(0).is_none());
    assert!(tags.item(2).is_none());

    let empty = Schema::new(&def).request_data(json!({"tags": []}));
    assert!(!empty.is_valid());
    assert_eq!(empty.errors().unwrap().unwrap().codes(), vec!["empty"]);
}
