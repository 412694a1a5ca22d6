//! Mapping whole schemas against the non-trivial sources: config text,
//! strict JSON, tuple-style positional sources, and unions.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;

use forma::prelude::*;

fn value(data: serde_json::Value) -> Value {
    Value::from_json(data)
}

// ============================================================================
// CONFIG TEXT
// ============================================================================

const SLURP_CONF: &str = "\
[DEFAULT]
state_dir = /var/lib/slurp

[slurp]
backfill = f
read_size = 1024
includes = /etc/slurp/conf.d/*.conf /etc/slurp/conf.d/*.py
auth[user] = slurp
auth[pass] = hunter2
";

fn slurp_schema() -> Arc<Schema> {
    Schema::builder()
        .field("state_dir", string())
        .field("backfill", boolean().default(true))
        .field("read_size", integer().min(1))
        .field("includes", list(string()).promote_scalar())
        .field("auth", dict(string(), string()).required_keys(["user"]))
        .build()
        .into()
}

#[test]
fn config_section_maps_to_a_typed_record() {
    let source = ConfigSource::parse(SLURP_CONF).unwrap().section("slurp");
    let form = Form::parse(slurp_schema(), &source).unwrap();
    assert_eq!(
        form.to_value(),
        value(json!({
            "state_dir": "/var/lib/slurp",
            "backfill": false,
            "read_size": 1024,
            "includes": ["/etc/slurp/conf.d/*.conf", "/etc/slurp/conf.d/*.py"],
            "auth": {"user": "slurp", "pass": "hunter2"},
        }))
    );
}

#[test]
fn config_subform_maps_a_section_from_the_root() {
    let schema = Schema::builder()
        .field("slurp", subform(slurp_schema()))
        .build();
    let source = ConfigSource::parse(SLURP_CONF).unwrap();
    let form = Form::parse(schema, &source).unwrap();
    let slurp = form.get("slurp").and_then(Value::as_map).unwrap();
    assert_eq!(slurp.get("read_size"), Some(&Value::Int(1024)));
}

// ============================================================================
// JSON TEXT
// ============================================================================

#[test]
fn lenient_json_coerces_and_strict_json_refuses() {
    let schema: Arc<Schema> = Schema::builder()
        .field("count", integer())
        .build()
        .into();
    let text = r#"{"count": 3.0}"#;

    let lenient = JsonSource::new(text).unwrap();
    let form = Form::parse(Arc::clone(&schema), &lenient).unwrap();
    assert_eq!(form.get("count"), Some(&Value::Int(3)));

    let strict = JsonSource::new(text).unwrap().strict();
    let mut form = Form::new(schema);
    let errors = form.map(&strict, &MapOptions::default());
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.as_slice()[0].to_string(), "count - \"3\" is not an integer");
}

#[test]
fn json_dotted_keys_reach_nested_objects() {
    let schema = Schema::builder()
        .field("read_size", integer().src("slurp.read_size"))
        .build();
    let source = JsonSource::new(r#"{"slurp": {"read_size": 1024}}"#).unwrap();
    let form = Form::parse(schema, &source).unwrap();
    assert_eq!(form.get("read_size"), Some(&Value::Int(1024)));
}

// ============================================================================
// POSITIONAL SOURCES
// ============================================================================

#[test]
fn aliases_map_tuple_style_sources_by_name() {
    let schema = Schema::builder()
        .field("host", string())
        .field("port", integer())
        .build();
    let source = MemorySource::new(Value::List(vec![
        Value::Str("localhost".into()),
        Value::Int(8080),
    ]))
    .with_aliases(["host", "port"]);
    let form = Form::parse(schema, &source).unwrap();
    assert_eq!(
        form.to_value(),
        value(json!({"host": "localhost", "port": 8080}))
    );
}

// ============================================================================
// UNIONS
// ============================================================================

fn layered(merge: Merge) -> UnionSource {
    let overrides = MemorySource::from(json!({
        "read_size": 4096,
        "includes": ["override.conf"],
    }));
    let defaults = MemorySource::from(json!({
        "read_size": 1024,
        "strict": true,
        "includes": ["default.conf", "extra.conf"],
    }));
    UnionSource::new(vec![Box::new(overrides), Box::new(defaults)]).merge(merge)
}

#[test]
fn union_first_takes_only_the_first_resolving_source() {
    let schema = Schema::builder()
        .field("read_size", integer())
        .field("strict", boolean().default(false))
        .build();
    let form = Form::parse(schema, &layered(Merge::First)).unwrap();
    assert_eq!(
        form.to_value(),
        value(json!({"read_size": 4096, "strict": false}))
    );
}

#[test]
fn union_last_takes_the_last_resolving_source() {
    let schema = Schema::builder()
        .field("read_size", integer())
        .field("strict", boolean().default(false))
        .build();
    let form = Form::parse(schema, &layered(Merge::Last)).unwrap();
    assert_eq!(
        form.to_value(),
        value(json!({"read_size": 1024, "strict": true}))
    );
}

#[test]
fn union_combine_unions_keys_and_concatenates_sequences() {
    let schema = Schema::builder()
        .field("read_size", integer())
        .field("strict", boolean())
        .field("includes", list(string()))
        .build();
    let form = Form::parse(schema, &layered(Merge::Combine)).unwrap();
    assert_eq!(
        form.to_value(),
        value(json!({
            "read_size": 4096,
            "strict": true,
            "includes": ["override.conf", "default.conf", "extra.conf"],
        }))
    );
}

#[test]
fn union_combine_through_a_dict_field_unions_with_first_wins() {
    let first = MemorySource::from(json!({"auth": {"user": "slurp", "realm": "dev"}}));
    let second = MemorySource::from(json!({"auth": {"user": "other", "pass": "hunter2"}}));
    let schema: Arc<Schema> = Schema::builder()
        .field("auth", dict(string(), string()))
        .build()
        .into();

    let combined = UnionSource::new(vec![Box::new(first.clone()), Box::new(second.clone())])
        .merge(Merge::Combine);
    let form = Form::parse(Arc::clone(&schema), &combined).unwrap();
    assert_eq!(
        form.get("auth"),
        Some(&value(json!({"user": "slurp", "realm": "dev", "pass": "hunter2"})))
    );

    let first_only = UnionSource::new(vec![Box::new(first), Box::new(second)]).merge(Merge::First);
    let form = Form::parse(schema, &first_only).unwrap();
    assert_eq!(
        form.get("auth"),
        Some(&value(json!({"user": "slurp", "realm": "dev"})))
    );
}

#[test]
fn union_layers_config_text_under_json_overrides() {
    let overrides = JsonSource::new(r#"{"read_size": 8192}"#).unwrap();
    let defaults = ConfigSource::parse(SLURP_CONF).unwrap().section("slurp");
    let source = UnionSource::new(vec![Box::new(overrides), Box::new(defaults)])
        .merge(Merge::Combine);
    let form = Form::parse(slurp_schema(), &source).unwrap();
    assert_eq!(form.get("read_size"), Some(&Value::Int(8192)));
    assert_eq!(form.get("state_dir"), Some(&Value::Str("/var/lib/slurp".into())));
}
