//! Validate an API-request-shaped JSON payload and print either the
//! mapped record or every collected violation.
//!
//! ```sh
//! cargo run --bin json_request
//! ```

use forma::prelude::*;

const GOOD: &str = r#"{
    "method": "POST",
    "path": "/jobs",
    "read_size": 4096,
    "labels": ["batch", "low-priority"]
}"#;

const BAD: &str = r#"{
    "method": "PATCH",
    "read_size": 0,
    "labels": "batch"
}"#;

fn request_schema() -> Schema {
    Schema::builder()
        .field("method", string().choices(["GET", "POST"]))
        .field("path", string().pattern(r"^/"))
        .field("read_size", integer().range(1, 1 << 20).default(1024))
        .field("labels", list(string()).promote_scalar().default_fn(|| {
            Value::List(Vec::new())
        }))
        .build()
}

fn run(label: &str, text: &str) {
    let source = JsonSource::new(text).expect("demo payloads are valid JSON");
    let mut form = Form::new(request_schema());
    let errors = form.map(&source, &MapOptions::default());
    if errors.is_empty() {
        println!("{label}: ok -> {form}");
    } else {
        println!("{label}: {} violation(s)", errors.len());
        for error in &errors {
            println!("  {error}");
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    run("good payload", GOOD);
    run("bad payload", BAD);
}
