use serde::Deserialize;

/// Node of a recursive store snapshot.
///
/// Directories carry their children in `nodes`, leaves carry a `value`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreNode {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub dir: bool,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub nodes: Vec<StoreNode>,
    #[serde(default)]
    pub modified_index: u64,
}

#[cfg(test)]
impl StoreNode {
    pub fn leaf(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn directory(key: impl Into<String>, nodes: Vec<StoreNode>) -> Self {
        Self {
            key: key.into(),
            dir: true,
            nodes,
            ..Default::default()
        }
    }
}
