pub mod json_compact;

pub use json_compact::JsonCompactFormatter;

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::core::{DependencyPlan, DiscoverResult};

/// Full, pretty-printed JSON rendering of a scan.
pub fn render_json(result: &DiscoverResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// Pretty-printed JSON rendering of a generation plan.
pub fn render_plan(plan: &DependencyPlan) -> Result<String> {
    Ok(serde_json::to_string_pretty(plan)?)
}

/// Writes `content` to `output`, or to stdout when no path is given.
pub fn write_output(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => fs::write(path, content)?,
        None => println!("{content}"),
    }
    Ok(())
}
