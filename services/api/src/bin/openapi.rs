//! services/api/src/bin/openapi.rs
//!
//! Dumps the OpenAPI document of the todo API.
//!
//! `openapi [PATH]` writes to `PATH` (default `openapi.json`); `-` prints to stdout.

use std::io::Write;

use api_lib::web::rest::ApiDoc;
use utoipa::OpenApi;

fn document() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info.title = "Todo API".to_string();
    doc.info.version = env!("CARGO_PKG_VERSION").to_string();
    doc
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let target = std::env::args().nth(1).unwrap_or_else(|| "openapi.json".to_string());
    let json = document().to_pretty_json()?;

    if target == "-" {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
    } else {
        std::fs::write(&target, json)?;
        eprintln!("wrote {} ({} paths)", target, document().paths.paths.len());
    }
    Ok(())
}
