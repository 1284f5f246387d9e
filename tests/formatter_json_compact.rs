use resource_discovery::formatters::{render_json, JsonCompactFormatter};
use resource_discovery::{DiscoverError, DiscoverResult, DiscoveredResource};
use serde_json::Value;
use std::path::PathBuf;

fn sample() -> DiscoverResult {
    let mut result = DiscoverResult::new();
    for (name, file, deps) in [
        ("Person", "/tmp/schema.go", vec![]),
        ("WorksFor", "/tmp/schema.go", vec!["Person".to_string()]),
        ("Bucket", "/tmp/infra.go", vec![]),
    ] {
        result.known_names.insert(name.to_string());
        result.resources.push(DiscoveredResource {
            name: name.to_string(),
            kind: "schema.NodeType".to_string(),
            file: PathBuf::from(file),
            line: 3,
            dependencies: deps,
        });
    }
    result.known_names.insert("normalVar".to_string());
    result.errors.push(DiscoverError::RootNotFound {
        path: PathBuf::from("/tmp/missing"),
    });
    result
}

#[test]
fn json_compact_formatter_outputs_valid_json() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("out.json");

    JsonCompactFormatter::new()
        .format_to_file(&sample(), &path)
        .unwrap();

    let data = std::fs::read_to_string(&path).unwrap();
    let v: Value = serde_json::from_str(&data).unwrap();

    assert_eq!(v["meta"]["resources"].as_u64().unwrap(), 3);
    assert_eq!(v["meta"]["names"].as_u64().unwrap(), 4);
    assert_eq!(v["meta"]["errors"].as_u64().unwrap(), 1);
    assert_eq!(v["files"].as_array().unwrap().len(), 2);
    assert!(v.get("names").is_none());

    // [name, kind, file_id, line, deps]
    let works_for = &v["resources"][1];
    assert_eq!(works_for[0], "WorksFor");
    assert_eq!(works_for[2].as_u64().unwrap(), 0);
    assert_eq!(works_for[4][0], "Person");
    assert_eq!(v["resources"][2][2].as_u64().unwrap(), 1);
    assert_eq!(v["errors"][0], "root not found: /tmp/missing");
}

#[test]
fn json_compact_formatter_can_include_names() {
    let rendered = JsonCompactFormatter::new()
        .with_names(true)
        .format_result(&sample())
        .unwrap();
    let v: Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(v["names"].as_array().unwrap().len(), 4);
}

#[test]
fn full_json_keeps_field_names() {
    let v: Value = serde_json::from_str(&render_json(&sample()).unwrap()).unwrap();
    assert_eq!(v["resources"][0]["name"], "Person");
    assert_eq!(v["resources"][1]["dependencies"][0], "Person");
    assert_eq!(v["known_names"].as_array().unwrap().len(), 4);
}
