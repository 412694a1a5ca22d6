//! Composite field behavior: lists, tuples, dicts, nested and polymorphic
//! sub-forms, grouped key families, and cross-field references.

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

// ============================================================================
// LISTS AND TUPLES
// ============================================================================

#[test]
fn list_round_trips_length_and_order() {
    let schema = Schema::builder()
        .field("peeps", list(string()))
        .build();
    let form = Form::parse(schema, &mem(json!({"peeps": ["ana", "bo", "cy"]}))).unwrap();
    assert_eq!(form.get("peeps"), Some(&value(json!(["ana", "bo", "cy"]))));
}

#[test]
fn list_length_bounds_are_validated() {
    let schema = Schema::builder()
        .field("peeps", list(string()).min(2).max(3))
        .build();
    let mut form = Form::new(schema);
    let errors = form.map(&mem(json!({"peeps": ["solo"]})), &MapOptions::default());
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors.as_slice()[0].to_string(),
        "peeps - must have 2 or more items"
    );
}

#[test]
fn list_collects_element_errors_at_indexed_paths() {
    let schema = Schema::builder()
        .field("sizes", list(integer()))
        .build();
    let mut form = Form::new(schema);
    let errors = form.map(&mem(json!({"sizes": [1, "nope", 3]})), &MapOptions::default());
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.as_slice()[0].path.to_string(), "sizes[1]");
    // Failing elements are skipped, the rest keep their order.
    assert_eq!(form.get("sizes"), Some(&value(json!([1, 3]))));
}

#[test]
fn scalar_promotion_wraps_a_single_value() {
    let schema = Schema::builder()
        .field("includes", list(string()).promote_scalar())
        .build();
    let form = Form::parse(schema, &mem(json!({"includes": "only.conf"}))).unwrap();
    assert_eq!(form.get("includes"), Some(&value(json!(["only.conf"]))));
}

#[test]
fn tuple_arity_mismatch_is_exactly_one_error_and_no_partial() {
    let schema = Schema::builder()
        .field("pair", tuple([string().into(), integer().into()]))
        .build();
    let mut form = Form::new(schema);
    let errors = form.map(&mem(json!({"pair": ["lonely"]})), &MapOptions::default());
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors.as_slice()[0].to_string(),
        "pair - must have exactly 2 items"
    );
    assert_eq!(form.get("pair"), None);
}

#[test]
fn tuple_positions_are_independently_typed() {
    let schema = Schema::builder()
        .field("pair", tuple([string().into(), integer().min(10).into()]))
        .build();
    let form = Form::parse(schema, &mem(json!({"pair": ["x", "456"]}))).unwrap();
    assert_eq!(form.get("pair"), Some(&value(json!(["x", 456]))));
}

// ============================================================================
// DICTS
// ============================================================================

#[test]
fn dict_maps_keys_and_values_through_their_fields() {
    let schema = Schema::builder()
        .field(
            "headers",
            dict(
                string().on_munge(|_, _, v| {
                    Munged::Value(Value::Str(v.as_str().unwrap_or_default().to_uppercase()))
                }),
                string(),
            ),
        )
        .build();
    let form = Form::parse(
        schema,
        &mem(json!({"headers": {"accept": "json", "host": "web"}})),
    )
    .unwrap();
    assert_eq!(
        form.get("headers"),
        Some(&value(json!({"ACCEPT": "json", "HOST": "web"})))
    );
}

#[test]
fn dict_key_filter_skips_keys_before_resolution() {
    let schema = Schema::builder()
        .field(
            "opts",
            dict(string(), any()).key_filter(|key| !key.starts_with('_')),
        )
        .build();
    let form = Form::parse(
        schema,
        &mem(json!({"opts": {"keep": 1, "_private": 2}})),
    )
    .unwrap();
    assert_eq!(form.get("opts"), Some(&value(json!({"keep": 1}))));
}

#[test]
fn dict_required_and_max_keys() {
    let schema: Arc<Schema> = Schema::builder()
        .field(
            "conn",
            dict(string(), any()).required_keys(["host"]).max_keys(2),
        )
        .build()
        .into();

    let mut form = Form::new(Arc::clone(&schema));
    let errors = form.map(&mem(json!({"conn": {"port": 80}})), &MapOptions::default());
    assert_eq!(
        errors.as_slice()[0].to_string(),
        "conn - missing required keys host"
    );

    let mut form = Form::new(schema);
    let errors = form.map(
        &mem(json!({"conn": {"host": "a", "port": 80, "tls": true}})),
        &MapOptions::default(),
    );
    assert_eq!(
        errors.as_slice()[0].to_string(),
        "conn - cannot have more than 2 key(s)"
    );
}

// ============================================================================
// NESTED FORMS
// ============================================================================

#[test]
fn nested_error_paths_stay_in_sync_with_traversal() {
    let item: Arc<Schema> = Schema::builder().field("name", string()).build().into();
    let schema = Schema::builder()
        .field("items", list(subform(item)))
        .build();
    let mut form = Form::new(schema);
    let errors = form.map(
        &mem(json!({"items": [{"name": "ok"}, {}]})),
        &MapOptions::default(),
    );
    assert_eq!(errors.len(), 1);
    let error = &errors.as_slice()[0];
    assert!(error.is_missing());
    assert_eq!(error.path.to_string(), "items[1].name");
}

#[test]
fn cross_field_format_resolves_siblings_on_demand() {
    let sub: Arc<Schema> = Schema::builder()
        .field("link", string().format("/my/{id}", [("id", "id")]))
        .field("id", integer())
        .build()
        .into();
    let schema: Arc<Schema> = Schema::builder()
        .field("items", list(subform(sub)))
        .field("checksum", string())
        .build()
        .into();
    let source = mem(json!({
        "items": [{"id": 213123}, {"id": 567657}],
        "checksum": "123123213",
    }));
    let form = Form::parse(Arc::clone(&schema), &source).unwrap();
    assert_eq!(
        form.to_value(),
        value(json!({
            "items": [
                {"link": "/my/213123", "id": 213123},
                {"link": "/my/567657", "id": 567657},
            ],
            "checksum": "123123213",
        }))
    );

    // A mapped form round-trips through itself as a source.
    let clone = Form::parse(schema, &mem(form.to_value().to_json())).unwrap();
    assert_eq!(clone.to_value(), form.to_value());
}

// ============================================================================
// POLYMORPHIC FORMS
// ============================================================================

fn cat_schema() -> Arc<Schema> {
    Schema::builder()
        .field("kind", string())
        .field("sound", string().default("meow"))
        .field("name", string())
        .build()
        .into()
}

fn dog_schema() -> Arc<Schema> {
    Schema::builder()
        .field("kind", string())
        .field("sound", string().default("woof"))
        .field("name", string())
        .build()
        .into()
}

fn animal_schema() -> Arc<Schema> {
    Schema::builder()
        .field(
            "animal",
            poly("kind")
                .variant("cat", cat_schema())
                .variant("dog", dog_schema())
                .src_whole(),
        )
        .build()
        .into()
}

#[test]
fn discriminator_selects_and_fully_maps_the_variant() {
    let form = Form::parse(
        animal_schema(),
        &mem(json!({"kind": "cat", "name": "whiskers"})),
    )
    .unwrap();
    assert_eq!(
        form.get("animal"),
        Some(&value(json!({"kind": "cat", "sound": "meow", "name": "whiskers"})))
    );

    let form = Form::parse(animal_schema(), &mem(json!({"kind": "dog", "name": "fido"}))).unwrap();
    assert_eq!(
        form.get("animal"),
        Some(&value(json!({"kind": "dog", "sound": "woof", "name": "fido"})))
    );
}

#[test]
fn unknown_discriminator_is_one_error_and_no_partial_record() {
    let mut form = Form::new(animal_schema());
    let errors = form.map(&mem(json!({"kind": "fish"})), &MapOptions::default());
    assert_eq!(errors.len(), 1);
    let error = &errors.as_slice()[0];
    assert!(error.is_invalid());
    assert_eq!(error.to_string(), "kind - \"fish\" is not one of \"cat\", \"dog\"");
    assert!(form.is_empty());
}

#[test]
fn cast_probes_without_mapping() {
    let dispatch = poly("kind")
        .variant("cat", cat_schema())
        .variant("dog", dog_schema());
    let schema = dispatch.cast(&mem(json!({"kind": "dog"}))).unwrap();
    let form = Form::parse(schema, &mem(json!({"kind": "dog", "name": "fido"}))).unwrap();
    assert_eq!(form.get("sound"), Some(&Value::Str("woof".into())));

    let missing = dispatch.cast(&mem(json!({"kind": "fish"})));
    assert!(matches!(missing, Err(SchemaError::UnknownVariant(v)) if v == "fish"));
}

// ============================================================================
// GROUPS
// ============================================================================

#[test]
fn group_maps_operator_style_key_families() {
    let schema = Schema::builder()
        .field(
            "a",
            group()
                .literal("a", integer())
                .pattern(r"^a\[(?P<op>in|!in)\]$", list(integer()))
                .pattern(
                    r"^a\.(?P<op>between)$",
                    tuple([integer().into(), integer().into()]),
                ),
        )
        .field(
            "b",
            group()
                .literal("b", string())
                .pattern(r"^b\[(?P<op>=|!=)\]$", string()),
        )
        .field(
            "c",
            group()
                .literal("c", integer())
                .default_fn(|| Value::List(Vec::new())),
        )
        .build();
    let form = Form::parse(
        schema,
        &mem(json!({
            "a[in]": [1, 2, 3],
            "a[!in]": [123, 34, 133],
            "a.between": [23, 234],
            "b[!=]": "wings",
        })),
    )
    .unwrap();

    assert_eq!(
        form.get("a"),
        Some(&value(json!([
            ["a[in]", "in", [1, 2, 3]],
            ["a[!in]", "!in", [123, 34, 133]],
            ["a.between", "between", [23, 234]],
        ])))
    );
    assert_eq!(form.get("b"), Some(&value(json!([["b[!=]", "!=", "wings"]]))));
    // No key family matched: the default factory answers.
    assert_eq!(form.get("c"), Some(&Value::List(Vec::new())));
}

#[test]
fn group_literal_match_captures_null_op() {
    let schema = Schema::builder()
        .field("a", group().literal("a", integer()))
        .build();
    let form = Form::parse(schema, &mem(json!({"a": 7}))).unwrap();
    assert_eq!(form.get("a"), Some(&value(json!([["a", null, 7]]))));
}

// ============================================================================
// DATETIMES
// ============================================================================

#[test]
fn datetime_parses_and_orders() {
    let schema: Arc<Schema> = Schema::builder()
        .field("seen_at", datetime("iso8601"))
        .build()
        .into();
    let form = Form::parse(
        Arc::clone(&schema),
        &mem(json!({"seen_at": "2014-03-01T08:00:00"})),
    )
    .unwrap();
    assert!(matches!(form.get("seen_at"), Some(Value::DateTime(_))));

    let mut form = Form::new(schema);
    let errors = form.map(&mem(json!({"seen_at": "yesterday"})), &MapOptions::default());
    assert_eq!(errors.len(), 1);
    assert!(errors.as_slice()[0].to_string().contains("yesterday"));
}

#[test]
fn datetime_bounds_are_validated() {
    let noon = chrono::NaiveDateTime::parse_from_str("2014-03-01T12:00:00", "%Y-%m-%dT%H:%M:%S")
        .unwrap();
    let schema = Schema::builder()
        .field("seen_at", datetime("iso8601").after(noon))
        .build();
    let mut form = Form::new(schema);
    let errors = form.map(
        &mem(json!({"seen_at": "2014-03-01T08:00:00"})),
        &MapOptions::default(),
    );
    assert_eq!(errors.len(), 1);
    assert!(errors.as_slice()[0].to_string().contains("must be after"));
}
