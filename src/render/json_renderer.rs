use std::collections::BTreeMap;

use snafu::ResultExt;

use crate::render::renderer::JsonEncodeSnafu;
use crate::render::{ArtifactWriter, RenderError, RenderOptions, RendererTrait};
use crate::tree::{ConfigNode, ConfigTree};

/// Renders every top-level entry into `<config dir>/<entry>.json`, nested under the environment.
#[derive(Debug)]
pub struct JsonRenderer {
    environment: String,
    writer: ArtifactWriter,
}

impl JsonRenderer {
    pub fn new(options: &RenderOptions) -> Self {
        Self {
            environment: options.environment.clone(),
            writer: ArtifactWriter::new(&options.config_dir, "json"),
        }
    }

    fn document(&self, key: &str, node: &ConfigNode) -> Result<String, RenderError> {
        let document = BTreeMap::from([(self.environment.as_str(), node)]);
        let mut out = serde_json::to_string_pretty(&document).context(JsonEncodeSnafu { key })?;
        out.push('\n');
        Ok(out)
    }
}

impl RendererTrait for JsonRenderer {
    async fn render(&mut self, tree: &ConfigTree) -> Result<(), RenderError> {
        let files = tree
            .iter()
            .map(|(key, node)| Ok((key.clone(), self.document(key, node)?)))
            .collect::<Result<Vec<_>, RenderError>>()?;
        self.writer.write_all(files).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};
    use tempfile::TempDir;

    use super::*;
    use crate::tree::KeyPath;

    fn read_json(temp_dir: &TempDir, name: &str) -> Value {
        let contents = std::fs::read_to_string(temp_dir.path().join(name)).unwrap();
        serde_json::from_str(&contents).unwrap()
    }

    #[compio::test]
    async fn nests_each_top_level_entry_under_the_environment() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut renderer = JsonRenderer::new(&RenderOptions {
            config_dir: temp_dir.path().to_path_buf(),
            environment: "staging".to_string(),
        });
        let mut tree = ConfigTree::new();
        tree.set_leaf(&KeyPath::parse("database/host"), "db1");
        tree.set_leaf(&KeyPath::parse("database/pool/size"), "5");
        tree.set_leaf(&KeyPath::parse("secret_key_base"), "abc");

        renderer.render(&tree).await.unwrap();

        assert_eq!(
            read_json(&temp_dir, "database.json"),
            json!({ "staging": { "host": "db1", "pool": { "size": "5" } } })
        );
        assert_eq!(
            read_json(&temp_dir, "secret_key_base.json"),
            json!({ "staging": "abc" })
        );
    }

    #[compio::test]
    async fn empty_tree_removes_previous_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut renderer = JsonRenderer::new(&RenderOptions {
            config_dir: temp_dir.path().to_path_buf(),
            environment: "production".to_string(),
        });
        let mut tree = ConfigTree::new();
        tree.set_leaf(&KeyPath::parse("database/host"), "db1");
        renderer.render(&tree).await.unwrap();

        renderer.render(&ConfigTree::new()).await.unwrap();

        assert!(!temp_dir.path().join("database.json").exists());
    }
}
