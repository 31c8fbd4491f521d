//! Turning the tree into configuration files.

mod artifact_writer;
mod json_renderer;
mod renderer;
mod yaml_renderer;

pub use artifact_writer::ArtifactWriter;
pub use json_renderer::JsonRenderer;
pub use renderer::{RenderError, RenderOptions, Renderer, RendererTrait, UnknownRendererError};
pub use yaml_renderer::YamlRenderer;
