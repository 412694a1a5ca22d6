//! Layer JSON overrides on top of an INI-style config file and map the
//! union into one typed record.
//!
//! ```sh
//! cargo run --bin layered_config
//! ```

use forma::prelude::*;

const BASE: &str = "\
[DEFAULT]
state_dir = /var/lib/slurp

[slurp]
backfill = f
read_size = 1024
includes = /etc/slurp/conf.d/*.conf /etc/slurp/conf.d/*.py
auth[user] = slurp
auth[pass] = hunter2
";

const OVERRIDES: &str = r#"{"read_size": 8192, "backfill": true}"#;

fn slurp_schema() -> Schema {
    Schema::builder()
        .field("state_dir", string())
        .field("backfill", boolean().default(false))
        .field("read_size", integer().min(1))
        .field("includes", list(string()).promote_scalar())
        .field("auth", dict(string(), string()).required_keys(["user"]))
        .build()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let overrides = JsonSource::new(OVERRIDES)
        .expect("demo overrides are valid JSON")
        .with_location("overrides.json");
    let base = ConfigSource::parse(BASE)
        .expect("demo config is well-formed")
        .section("slurp")
        .with_location("slurp.conf");
    let source = UnionSource::new(vec![Box::new(overrides), Box::new(base)])
        .merge(Merge::Combine);

    match Form::parse(slurp_schema(), &source) {
        Ok(form) => println!("effective config: {form}"),
        Err(error) => eprintln!("config rejected: {error}"),
    }
}
