use anyhow::Result;
use serde_json::json;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::core::DiscoverResult;

/// Minimal-token JSON: a file table plus positional resource tuples
/// `[name, kind, file_id, line, [dependencies]]`.
pub struct JsonCompactFormatter {
    /// Include the known-name list next to the resources.
    include_names: bool,
}

impl JsonCompactFormatter {
    pub fn new() -> Self {
        Self {
            include_names: false,
        }
    }

    pub fn with_names(mut self, include_names: bool) -> Self {
        self.include_names = include_names;
        self
    }

    pub fn format_to_file(&self, result: &DiscoverResult, output_path: &Path) -> Result<()> {
        let json_content = self.format_result(result)?;
        fs::write(output_path, json_content)?;
        Ok(())
    }

    pub fn format_result(&self, result: &DiscoverResult) -> Result<String> {
        let mut files: Vec<String> = Vec::new();
        let mut file_ids: HashMap<&Path, usize> = HashMap::new();

        let resources: Vec<_> = result
            .resources
            .iter()
            .map(|resource| {
                let file_id = *file_ids.entry(resource.file.as_path()).or_insert_with(|| {
                    files.push(resource.file.to_string_lossy().into_owned());
                    files.len() - 1
                });
                json!([
                    resource.name,
                    resource.kind,
                    file_id,
                    resource.line,
                    resource.dependencies
                ])
            })
            .collect();

        let errors: Vec<String> = result.errors.iter().map(ToString::to_string).collect();

        let mut output = json!({
            "meta": {
                "resources": result.resources.len(),
                "names": result.known_names.len(),
                "errors": result.errors.len()
            },
            "files": files,
            "resources": resources,
            "errors": errors
        });
        if self.include_names {
            output["names"] = json!(result.known_names);
        }

        Ok(serde_json::to_string(&output)?)
    }
}

impl Default for JsonCompactFormatter {
    fn default() -> Self {
        Self::new()
    }
}
