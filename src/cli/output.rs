//! CLI output: error mapping from engine errors to the CLI surface.

/// Render an error chain for the terminal, outermost context first.
pub fn map_error(e: &anyhow::Error) -> String {
    let mut out = e.to_string();
    for cause in e.chain().skip(1) {
        out.push_str(&format!("\n  caused by: {}", cause));
    }
    out
}
