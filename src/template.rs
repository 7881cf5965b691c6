//! Template rendering for attribute files
//!
//! Every attribute file is a minijinja template rendered with a `node` object
//! in scope. Markdown files are converted to HTML after templating.

use crate::error::RoError;
use crate::node::Node;
use crate::urls::UrlOptions;
use minijinja::value::{Object, Value as TemplateValue};
use minijinja::{context, AutoEscape, Environment, Error, ErrorKind, State};
use parking_lot::Mutex;
use pulldown_cmark::{html, Options, Parser};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Render contract: turn one file into text with `node` as context
pub trait Renderer: Send + Sync {
    fn render(&self, path: &Path, node: &Node) -> Result<String, RoError>;

    /// Text of a listing under `assets/source`; verbatim unless overridden
    fn render_source(&self, path: &Path, _node: &Node) -> Result<String, RoError> {
        fs::read_to_string(path).map_err(|e| RoError::RenderFailure {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// minijinja-backed renderer
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl TemplateRenderer {
    /// Renders without auto-escaping; values are often markup themselves
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::None);
        Self { env }
    }

    /// Renderer with a caller-configured environment (filters, functions)
    pub fn with_environment(env: Environment<'static>) -> Self {
        Self { env }
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for TemplateRenderer {
    fn render(&self, path: &Path, node: &Node) -> Result<String, RoError> {
        let failure = |message: String| RoError::RenderFailure {
            path: path.to_path_buf(),
            message,
        };

        let source = fs::read_to_string(path).map_err(|e| failure(e.to_string()))?;
        let name = path.to_string_lossy();

        let raised = Arc::new(Mutex::new(None));
        let scope = NodeScope {
            node: node.clone(),
            raised: Arc::clone(&raised),
        };

        debug!(path = %path.display(), node = %node, "Rendering attribute file");
        let result = self.env.render_named_str(
            &name,
            &source,
            context! { node => TemplateValue::from_object(scope) },
        );

        // Engine errors raised inside the template win over the
        // template engine's own wrapping of them.
        if let Some(err) = raised.lock().take() {
            return Err(err);
        }
        let text = result.map_err(|e| failure(format!("{:#}", e)))?;

        if is_markdown(path) {
            Ok(markdown_to_html(&text))
        } else {
            Ok(text)
        }
    }
}

fn is_markdown(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("md") | Some("markdown")
    )
}

/// Convert markdown to HTML
pub fn markdown_to_html(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_FOOTNOTES;
    let mut out = String::new();
    html::push_html(&mut out, Parser::new_ext(markdown, options));
    out
}

/// The `node` object visible to templates
#[derive(Debug)]
struct NodeScope {
    node: Node,
    raised: Arc<Mutex<Option<RoError>>>,
}

impl NodeScope {
    /// Remember the first engine error so it can be surfaced unchanged
    fn raise(&self, err: RoError) -> Error {
        let message = err.to_string();
        self.raised.lock().get_or_insert(err);
        Error::new(ErrorKind::InvalidOperation, message)
    }

    fn string_arg<'a>(&self, args: &'a [TemplateValue], method: &str) -> Result<&'a str, Error> {
        args.first().and_then(|v| v.as_str()).ok_or_else(|| {
            Error::new(
                ErrorKind::MissingArgument,
                format!("node.{} expects a string argument", method),
            )
        })
    }
}

fn to_template_value(value: &crate::attributes::Value) -> Result<TemplateValue, RoError> {
    Ok(TemplateValue::from_serialize(&value.materialize()?))
}

impl Object for NodeScope {
    fn get_value(self: &Arc<Self>, key: &TemplateValue) -> Option<TemplateValue> {
        let name = key.as_str()?;
        let found = match name {
            "id" => return Some(TemplateValue::from(self.node.id())),
            "identifier" => return Some(TemplateValue::from(self.node.identifier())),
            "type" => self.node.node_type().map(TemplateValue::from),
            "slug" => self.node.slug().map(TemplateValue::from),
            _ => match self.node.field(name) {
                Ok(Some(value)) => to_template_value(&value),
                Ok(None) => return None,
                Err(e) => Err(e),
            },
        };
        match found {
            Ok(value) => Some(value),
            Err(e) => {
                self.raise(e);
                None
            }
        }
    }

    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[TemplateValue],
    ) -> Result<TemplateValue, Error> {
        let options = UrlOptions::default();
        match method {
            "get" => {
                let key = self.string_arg(args, method)?;
                match self.node.get(key) {
                    Ok(Some(value)) => to_template_value(&value).map_err(|e| self.raise(e)),
                    Ok(None) => Ok(TemplateValue::UNDEFINED),
                    Err(e) => Err(self.raise(e)),
                }
            }
            "url" => self
                .node
                .url(&options)
                .map(TemplateValue::from)
                .map_err(|e| self.raise(e)),
            "url_for" => {
                let relative = self.string_arg(args, method)?;
                self.node
                    .url_for(relative, &options)
                    .map(TemplateValue::from)
                    .map_err(|e| self.raise(e))
            }
            "asset_url" => {
                let name = self.string_arg(args, method)?;
                self.node
                    .asset_for(name)
                    .and_then(|asset| asset.url())
                    .map(TemplateValue::from)
                    .map_err(|e| self.raise(e))
            }
            _ => Err(Error::from(ErrorKind::UnknownMethod)),
        }
    }
}
