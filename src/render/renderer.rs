use std::path::PathBuf;

use snafu::prelude::*;

use crate::render::{JsonRenderer, YamlRenderer};
use crate::tree::ConfigTree;

pub const RENDERER_NAMES: [&str; 2] = ["yaml", "json"];

#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Directory receiving the rendered files
    pub config_dir: PathBuf,
    /// Environment name every rendered document is nested under
    pub environment: String,
}

pub trait RendererTrait {
    /// Writes the configuration artifact for the current state of the tree
    async fn render(&mut self, tree: &ConfigTree) -> Result<(), RenderError>;
}

#[derive(Debug)]
pub enum Renderer {
    Yaml(YamlRenderer),
    Json(JsonRenderer),
}

impl Renderer {
    /// Looks up a renderer by name
    pub fn open(name: &str, options: &RenderOptions) -> Result<Self, UnknownRendererError> {
        match name {
            "yaml" => Ok(Renderer::Yaml(YamlRenderer::new(options))),
            "json" => Ok(Renderer::Json(JsonRenderer::new(options))),
            _ => UnknownRendererSnafu {
                name,
                known: RENDERER_NAMES.join(", "),
            }
            .fail(),
        }
    }
}

impl RendererTrait for Renderer {
    async fn render(&mut self, tree: &ConfigTree) -> Result<(), RenderError> {
        match self {
            Renderer::Yaml(renderer) => renderer.render(tree).await,
            Renderer::Json(renderer) => renderer.render(tree).await,
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(display("Unknown renderer '{}', available renderers: {}", name, known))]
pub struct UnknownRendererError {
    name: String,
    known: String,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RenderError {
    #[snafu(display("Failed to create config directory {}", path.display()))]
    CreateDirError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to write {}", path.display()))]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to move rendered file into place at {}", path.display()))]
    RenameError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to remove stale file {}", path.display()))]
    RemoveStaleError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to read the list of rendered files at {}", path.display()))]
    ManifestError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to emit YAML for '{}'", key))]
    YamlEmitError {
        key: String,
        source: saphyr::EmitError,
    },
    #[snafu(display("Failed to encode JSON for '{}'", key))]
    JsonEncodeError {
        key: String,
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> RenderOptions {
        RenderOptions {
            config_dir: PathBuf::from("config"),
            environment: "production".to_string(),
        }
    }

    #[test]
    fn opens_known_renderers() {
        assert!(matches!(
            Renderer::open("yaml", &options()),
            Ok(Renderer::Yaml(_))
        ));
        assert!(matches!(
            Renderer::open("json", &options()),
            Ok(Renderer::Json(_))
        ));
    }

    #[test]
    fn rejects_unknown_renderers() {
        let error = Renderer::open("toml", &options()).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Unknown renderer 'toml', available renderers: yaml, json"
        );
    }
}
