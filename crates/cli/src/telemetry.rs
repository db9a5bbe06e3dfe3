//! Tracing subscriber setup.

use std::env::var;

use tracing_subscriber::fmt::layer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{registry, EnvFilter};

const DEFAULT_DIRECTIVES: &str = "almanac=info,almanac_infra=info,almanac_core=info";

/// Install the global subscriber. `RUST_LOG` overrides the default filter
/// and `ALMANAC_LOG_FORMAT=json` switches to JSON lines.
pub fn init() -> anyhow::Result<()> {
    let directives = match var("RUST_LOG") {
        Ok(value) if !value.trim().is_empty() => value,
        _ => DEFAULT_DIRECTIVES.to_owned(),
    };
    let filter = EnvFilter::builder().parse(directives)?;

    let json = var("ALMANAC_LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));
    if json {
        registry().with(filter).with(layer().json().with_current_span(true)).try_init()?;
    } else {
        registry().with(filter).with(layer().with_target(false)).try_init()?;
    }
    Ok(())
}
