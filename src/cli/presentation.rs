//! CLI presentation: text and json formatters per command.

use crate::node::{Asset, Node};
use crate::urls::UrlOptions;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use serde_json::{json, Value as Json};

/// Summary row for one node; only identity fields, so no attributes load
fn node_row(node: &Node) -> (String, String, String, String) {
    (
        node.identifier(),
        node.path_type().to_string(),
        node.path_slug().to_string(),
        node.url(&UrlOptions::default()).unwrap_or_else(|_| "-".to_string()),
    )
}

pub fn format_node_list_text(nodes: &[Node]) -> String {
    if nodes.is_empty() {
        return "No nodes found.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Identifier", "Type", "Slug", "Url"]);
    for node in nodes {
        let (identifier, type_name, slug, url) = node_row(node);
        table.add_row(vec![identifier, type_name, slug, url]);
    }
    format!("{}\n\nTotal: {} node(s)", table, nodes.len())
}

pub fn format_node_list_json(nodes: &[Node]) -> String {
    let list: Vec<Json> = nodes
        .iter()
        .map(|node| {
            let (identifier, type_name, slug, url) = node_row(node);
            json!({
                "identifier": identifier,
                "type": type_name,
                "slug": slug,
                "url": url,
            })
        })
        .collect();
    let out = json!({ "nodes": list, "total": nodes.len() });
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}

/// Strings print raw; everything else as pretty JSON
pub fn format_value(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

pub fn format_asset_text(asset: &Asset, url: &str) -> String {
    format!(
        "Asset: {}\nPath: {}\nUrl: {}",
        asset.node_relative_path(),
        asset.path().display(),
        url
    )
}
