//! Form-level mapping behavior: the pipeline end to end, defaults,
//! idempotence, tag restriction, error modes, and the unclaimed-key
//! policies.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;

use forma::prelude::*;

fn mem(data: serde_json::Value) -> MemorySource {
    MemorySource::from(data)
}

fn value(data: serde_json::Value) -> Value {
    Value::from_json(data)
}

fn sub_schema() -> Arc<Schema> {
    Schema::builder()
        .field("sfield1", float().default(12.0))
        .field(
            "sfield2",
            tuple([string().into(), integer().min(10).into()]).default(Value::Null),
        )
        .build()
        .into()
}

fn my_schema() -> Arc<Schema> {
    Schema::builder()
        .field(
            "field1",
            integer().min(10).max(100).on_munge(|_, _, v| {
                Munged::Value(Value::Int(v.as_int().expect("parsed integer") + 1))
            }),
        )
        .field("field2", boolean().src("ff2").default(Value::Null))
        .field("field3", subform(sub_schema()).src("payload"))
        .build()
        .into()
}

#[test]
fn basic_mapping() {
    let source = mem(json!({
        "field1": 55,
        "ff2": "t",
        "payload": {
            "sfield2": ["somestring", "456"],
        },
    }));
    let form = Form::parse(my_schema(), &source).unwrap();
    assert_eq!(
        form.to_value(),
        value(json!({
            "field1": 56,
            "field2": true,
            "field3": {
                "sfield1": 12.0,
                "sfield2": ["somestring", 456],
            },
        }))
    );
}

#[test]
fn zero_errors_means_every_required_field_is_present() {
    let schema: Arc<Schema> = Schema::builder()
        .field("name", string())
        .field("port", integer().default(8080))
        .build()
        .into();
    let mut form = Form::new(Arc::clone(&schema));
    let errors = form.map(&mem(json!({"name": "slurp", "junk": 1})), &MapOptions::default());
    assert!(errors.is_empty());
    for field in schema.fields() {
        if field.is_required() {
            assert!(form.get(field.name()).is_some(), "{} missing", field.name());
        }
    }
    // No extra keys beyond declared fields.
    let declared: Vec<&str> = schema.fields().iter().map(|f| f.name()).collect();
    assert!(form.iter().all(|(name, _)| declared.contains(&name.as_str())));
}

#[test]
fn missing_required_field_is_one_missing_error() {
    let schema = Schema::builder().field("name", string()).build();
    let mut form = Form::new(schema);
    let errors = form.map(&mem(json!({})), &MapOptions::default());
    assert_eq!(errors.len(), 1);
    let error = &errors.as_slice()[0];
    assert!(error.is_missing());
    assert_eq!(error.path.to_string(), "name");
    assert_eq!(form.get("name"), None);
}

#[test]
fn mapping_reports_every_violation_in_one_pass() {
    let schema = Schema::builder()
        .field("a", integer().min(10))
        .field("b", string())
        .field("c", boolean())
        .build();
    let mut form = Form::new(schema);
    let errors = form.map(&mem(json!({"a": 3, "c": "maybe"})), &MapOptions::default());
    let rendered: Vec<String> = errors.iter().map(ToString::to_string).collect();
    assert_eq!(
        rendered,
        vec![
            "a - \"3\" must be >= 10",
            "b is missing",
            "c - \"maybe\" is not a boolean",
        ]
    );
}

#[test]
fn raise_mode_stops_at_the_first_error() {
    let schema = Schema::builder()
        .field("a", integer().min(10))
        .field("b", string())
        .build();
    let mut form = Form::new(schema);
    let errors = form.map(
        &mem(json!({"a": 3})),
        &MapOptions::default().error(ErrorMode::Raise),
    );
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.as_slice()[0].path.to_string(), "a");
}

#[test]
fn remapping_is_idempotent_and_reset_recomputes() {
    let source = mem(json!({
        "field1": 55,
        "ff2": "t",
        "payload": {"sfield2": ["x", "456"]},
    }));
    let mut form = Form::new(my_schema());
    assert!(form.map(&source, &MapOptions::default()).is_empty());
    let first = form.to_value();

    // Without reset, assigned fields are left alone.
    assert!(form.map(&source, &MapOptions::default()).is_empty());
    assert_eq!(form.to_value(), first);

    // With reset, everything recomputes to the same record.
    assert!(form.map(&source, &MapOptions::default().reset(true)).is_empty());
    assert_eq!(form.to_value(), first);
}

#[test]
fn choices_violation_names_the_value_and_the_choices() {
    let schema = Schema::builder()
        .field("method", string().choices(["GET", "POST"]))
        .build();
    let mut form = Form::new(schema);
    let errors = form.map(&mem(json!({"method": "PATCH"})), &MapOptions::default());
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors.as_slice()[0].to_string(),
        "method - \"PATCH\" is not one of \"GET\", \"POST\""
    );
}

#[test]
fn null_handling_follows_nullability() {
    let schema = Schema::builder()
        .field("strict_one", integer())
        .field("soft_one", integer().default(Value::Null))
        .build();
    let mut form = Form::new(schema);
    let errors = form.map(
        &mem(json!({"strict_one": null, "soft_one": null})),
        &MapOptions::default(),
    );
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.as_slice()[0].to_string(), "strict_one - not nullable");
    assert_eq!(form.get("soft_one"), Some(&Value::Null));
}

#[test]
fn translations_apply_before_choice_validation() {
    let schema = Schema::builder()
        .field(
            "hiya",
            string()
                .choices(["one", "two"])
                .translate("one", 1)
                .translate("two", 2),
        )
        .build();
    let form = Form::parse(schema, &mem(json!({"hiya": "one"}))).unwrap();
    assert_eq!(form.get("hiya"), Some(&Value::Int(1)));
}

#[test]
fn ignored_literals_fall_back_to_the_default() {
    let schema = Schema::builder()
        .field("mode", string().ignore("").default("auto"))
        .build();
    let form = Form::parse(schema, &mem(json!({"mode": ""}))).unwrap();
    assert_eq!(form.get("mode"), Some(&Value::Str("auto".into())));
}

#[test]
fn munge_defer_and_discard_are_distinct_outcomes() {
    // Defer routes to the default, silently.
    let deferring = Schema::builder()
        .field(
            "a",
            string().default("fallback").on_munge(|_, _, _| Munged::Defer),
        )
        .build();
    let mut form = Form::new(deferring);
    let errors = form.map(&mem(json!({"a": "anything"})), &MapOptions::default());
    assert!(errors.is_empty());
    assert_eq!(form.get("a"), Some(&Value::Str("fallback".into())));

    // Discard drops the field entirely — no value, no implicit error.
    let discarding = Schema::builder()
        .field(
            "a",
            string().default("fallback").on_munge(|_, _, _| Munged::Discard),
        )
        .build();
    let mut form = Form::new(discarding);
    let errors = form.map(&mem(json!({"a": "anything"})), &MapOptions::default());
    assert!(errors.is_empty());
    assert_eq!(form.get("a"), None);
}

#[test]
fn filter_hook_rejection_routes_to_default_not_error() {
    let schema = Schema::builder()
        .field(
            "factor",
            integer()
                .default(1)
                .on_filter(|_, _, value| value.as_int().is_some_and(|n| n < 10)),
        )
        .build();
    let form = Form::parse(schema, &mem(json!({"factor": 50}))).unwrap();
    assert_eq!(form.get("factor"), Some(&Value::Int(1)));
}

#[test]
fn default_factories_never_share_state_between_records() {
    let schema: Arc<Schema> = Schema::builder()
        .field("items", list(string()).default_fn(|| Value::List(Vec::new())))
        .build()
        .into();
    let mut first = Form::parse(Arc::clone(&schema), &mem(json!({}))).unwrap();
    let second = Form::parse(Arc::clone(&schema), &mem(json!({}))).unwrap();

    first.set(
        "items",
        Value::List(vec![Value::Str("mutated".into())]),
    );
    assert_eq!(second.get("items"), Some(&Value::List(Vec::new())));
}

#[test]
fn tags_restrict_a_pass_and_reset_respects_them() {
    let schema = Schema::builder()
        .field("a", integer().tag("fast"))
        .field("b", integer().tag("slow"))
        .build();
    let mut form = Form::new(schema);
    let errors = form.map(
        &mem(json!({"a": 1, "b": 2})),
        &MapOptions::default().tags(["fast"]),
    );
    assert!(errors.is_empty());
    assert_eq!(form.get("a"), Some(&Value::Int(1)));
    assert_eq!(form.get("b"), None);

    // A tagged reset clears only the matching fields.
    let errors = form.map(
        &mem(json!({"a": 7, "b": 8})),
        &MapOptions::default().tags(["fast"]).reset(true),
    );
    assert!(errors.is_empty());
    assert_eq!(form.get("a"), Some(&Value::Int(7)));
    assert_eq!(form.get("b"), None);
}

#[test]
fn constant_and_context_fields_bypass_the_source() {
    let schema = Schema::builder()
        .field("version", integer().constant(3))
        .field("endpoint", string().src("service.host").from_context())
        .build();
    let mut form = Form::new(schema);
    let errors = form.map(
        &mem(json!({})),
        &MapOptions::default().var("service", value(json!({"host": "web-1"}))),
    );
    assert!(errors.is_empty());
    assert_eq!(form.get("version"), Some(&Value::Int(3)));
    assert_eq!(form.get("endpoint"), Some(&Value::Str("web-1".into())));
}

#[test]
fn context_field_without_a_variable_is_invalid() {
    let schema = Schema::builder()
        .field("endpoint", string().src("service.host").from_context())
        .build();
    let mut form = Form::new(schema);
    let errors = form.map(&mem(json!({})), &MapOptions::default());
    assert_eq!(errors.len(), 1);
    assert!(errors.as_slice()[0].is_invalid());
}

#[test]
fn envelope_field_maps_the_whole_source() {
    let schema = Schema::builder().field("container", any().src_whole()).build();
    let form = Form::parse(schema, &mem(json!({"field1": 55, "field2": true}))).unwrap();
    assert_eq!(
        form.to_value(),
        value(json!({"container": {"field1": 55, "field2": true}}))
    );
}

#[test]
fn envelope_subform_maps_the_whole_source() {
    let inner: Arc<Schema> = Schema::builder()
        .field("field1", integer().min(10).max(100))
        .field("field2", boolean().default(Value::Null))
        .build()
        .into();
    let schema = Schema::builder()
        .field("container", subform(inner).src_whole())
        .build();
    let form = Form::parse(schema, &mem(json!({"field1": 55, "field2": true}))).unwrap();
    assert_eq!(
        form.to_value(),
        value(json!({"container": {"field1": 55, "field2": true}}))
    );
}

#[test]
fn unmapped_policies() {
    let sub: Arc<Schema> = Schema::builder().field("za", float()).build().into();
    let schema: Arc<Schema> = Schema::builder()
        .field("z", subform(sub).unmapped(Unmapped::Capture))
        .field(
            "a",
            string().on_munge(|_, _, v| {
                let text: String = v.as_str().unwrap_or_default().chars().rev().collect();
                Munged::Value(Value::Str(text))
            }),
        )
        .field(
            "b",
            integer().on_munge(|_, _, v| {
                Munged::Value(Value::Int(v.as_int().expect("parsed integer") * 100))
            }),
        )
        .build()
        .into();

    let source = mem(json!({
        "a": "aeee",
        "b": 1,
        "c": {"cc": [1, 2, 3, 4]},
        "d": "blah",
        "e": ["a", "b", "c"],
        "f": 123.23,
        "z": {
            "za": 123132.123,
            "zb": "",
            "zc": 12312,
            "zd": {"zba": 12312},
        },
    }));

    let expected_z = json!({
        "za": 123132.123,
        "zb": "",
        "zc": 12312,
        "zd": {"zba": 12312},
    });
    let expected_ignored = value(json!({
        "z": expected_z,
        "a": "eeea",
        "b": 100,
    }));
    let expected_captured = value(json!({
        "z": expected_z,
        "a": "eeea",
        "b": 100,
        "c": {"cc": [1, 2, 3, 4]},
        "d": "blah",
        "e": ["a", "b", "c"],
        "f": 123.23,
    }));

    let mut form = Form::new(Arc::clone(&schema));
    assert!(form.map(&source, &MapOptions::default()).is_empty());
    assert_eq!(form.to_value(), expected_ignored);

    for unmapped in [
        Unmapped::Capture,
        Unmapped::with_value(any()),
        Unmapped::with_pair(string(), any()),
    ] {
        let mut form = Form::new(Arc::clone(&schema));
        assert!(form.map(&source, &MapOptions::default().unmapped(unmapped)).is_empty());
        assert_eq!(form.to_value(), expected_captured);
    }
}

#[test]
fn capture_extracts_through_a_regex_or_defers() {
    let schema: Arc<Schema> = Schema::builder()
        .field(
            "slug",
            string()
                .capture(r"^/posts/(?P<slug>[a-z-]+)$", None)
                .default("none"),
        )
        .build()
        .into();

    let form = Form::parse(Arc::clone(&schema), &mem(json!({"slug": "/posts/hello-world"})))
        .unwrap();
    assert_eq!(form.get("slug"), Some(&Value::Str("hello-world".into())));

    // No match defers to the default rather than failing.
    let form = Form::parse(schema, &mem(json!({"slug": "/about"}))).unwrap();
    assert_eq!(form.get("slug"), Some(&Value::Str("none".into())));
}

#[test]
fn number_pattern_parses_a_leading_match() {
    let schema: Arc<Schema> = Schema::builder()
        .field("port", integer().pattern(r"\d+"))
        .build()
        .into();

    let form = Form::parse(Arc::clone(&schema), &mem(json!({"port": "8080/tcp"}))).unwrap();
    assert_eq!(form.get("port"), Some(&Value::Int(8080)));

    let mut form = Form::new(schema);
    let errors = form.map(&mem(json!({"port": "tcp/8080"})), &MapOptions::default());
    assert_eq!(errors.len(), 1);
    assert!(errors.as_slice()[0].to_string().contains("does not match pattern"));
}

#[test]
fn filter_selects_tagged_fields_and_recurses() {
    let sub: Arc<Schema> = Schema::builder()
        .field("kept", integer().tag("export"))
        .field("dropped", integer())
        .build()
        .into();
    let schema = Schema::builder()
        .field("meta", subform(sub).tag("export"))
        .field("secret", string().tag("internal"))
        .field("plain", string())
        .build();
    let form = Form::parse(
        schema,
        &mem(json!({
            "meta": {"kept": 1, "dropped": 2},
            "secret": "hush",
            "plain": "text",
        })),
    )
    .unwrap();

    let exported = form.filter(&["export"], false);
    assert_eq!(exported.to_value(), value(json!({"meta": {"kept": 1}})));

    let without_internal = form.filter(&["internal"], true);
    assert_eq!(
        without_internal.to_value(),
        value(json!({"meta": {"kept": 1, "dropped": 2}, "plain": "text"}))
    );
}
