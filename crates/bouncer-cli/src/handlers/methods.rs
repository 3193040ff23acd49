//! Methods command handler

use crate::error::Result;
use crate::output::OutputWriter;
use crate::cli::OutputFormat;
use bouncer_core::Method;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct MethodInfo {
    name: &'static str,
    path: String,
    description: &'static str,
    accepts_field_mask: bool,
}

/// List every call with its description
pub fn handle_methods(output: &mut OutputWriter) -> Result<()> {
    let methods: Vec<MethodInfo> = Method::ALL
        .into_iter()
        .map(|method| MethodInfo {
            name: method.name(),
            path: method.full_path(),
            description: method.description(),
            accepts_field_mask: method.accepts_field_mask(),
        })
        .collect();

    if output.format() != OutputFormat::Human {
        return output.data(&methods);
    }

    let rows: Vec<(String, String)> = methods
        .iter()
        .map(|info| (info.name.to_string(), info.description.to_string()))
        .collect();
    output.table(["METHOD", "DESCRIPTION"], &rows)
}
