use std::borrow::Cow;

use hashlink::LinkedHashMap;
use saphyr::{Scalar, Yaml, YamlEmitter};
use snafu::ResultExt;

use crate::render::renderer::YamlEmitSnafu;
use crate::render::{ArtifactWriter, RenderError, RenderOptions, RendererTrait};
use crate::tree::{ConfigNode, ConfigTree};

/// Renders every top-level entry into `<config dir>/<entry>.yml`, nested under the environment.
///
/// A tree holding `database/host = db1` becomes `config/database.yml`:
///
/// ```yaml
/// production:
///   host: db1
/// ```
#[derive(Debug)]
pub struct YamlRenderer {
    environment: String,
    writer: ArtifactWriter,
}

impl YamlRenderer {
    pub fn new(options: &RenderOptions) -> Self {
        Self {
            environment: options.environment.clone(),
            writer: ArtifactWriter::new(&options.config_dir, "yml"),
        }
    }

    fn document(&self, key: &str, node: &ConfigNode) -> Result<String, RenderError> {
        let mut document = LinkedHashMap::new();
        document.insert(string(&self.environment), to_yaml(node));

        let mut out = String::new();
        YamlEmitter::new(&mut out)
            .dump(&Yaml::Mapping(document))
            .context(YamlEmitSnafu { key })?;
        out.push('\n');
        Ok(out)
    }
}

impl RendererTrait for YamlRenderer {
    async fn render(&mut self, tree: &ConfigTree) -> Result<(), RenderError> {
        let files = tree
            .iter()
            .map(|(key, node)| Ok((key.clone(), self.document(key, node)?)))
            .collect::<Result<Vec<_>, RenderError>>()?;
        self.writer.write_all(files).await
    }
}

fn to_yaml(node: &ConfigNode) -> Yaml<'static> {
    match node {
        ConfigNode::Leaf(value) => string(value),
        ConfigNode::Directory(tree) => Yaml::Mapping(
            tree.iter()
                .map(|(key, child)| (string(key), to_yaml(child)))
                .collect(),
        ),
    }
}

fn string(value: &str) -> Yaml<'static> {
    Yaml::Value(Scalar::String(Cow::Owned(value.to_string())))
}
