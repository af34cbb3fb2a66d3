//! Model-file inspection and client-module generation.
//!
//! The input is ordinary Rust source (parsed, never compiled): record
//! structs with native annotations, enum columns, a module-level
//! `DATASOURCE` descriptor, and key methods interpreted symbolically
//! against a sentinel receiver. The output is the text of a client module
//! that depends only on the `crumpet` runtime.

mod expand;

pub mod schema;
pub use schema::inspect;

use crumpet_core::Result;

/// The generated client module.
#[derive(Debug, Clone)]
pub struct GeneratedModule {
    /// Module source text. Identical inspection input yields byte-identical
    /// text.
    pub code: String,

    /// Model names, sorted, as emitted.
    pub model_names: Vec<String>,
}

const HEADER: &str = "\
// Generated by crumpet. Do not edit by hand.
#![allow(dead_code, unused_imports, clippy::all)]
";

/// Inspects the given model sources and renders the client module.
///
/// The emitted text is the deterministic token-stream rendering; running
/// it through a formatter is the driver's concern.
pub fn generate(sources: &[&str]) -> Result<GeneratedModule> {
    let schema = schema::inspect(sources)?;
    let code = format!("{HEADER}\n{}\n", expand::module(&schema));

    let mut model_names: Vec<String> = schema.models.iter().map(|m| m.name.clone()).collect();
    model_names.sort();

    Ok(GeneratedModule { code, model_names })
}
