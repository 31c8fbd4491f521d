use derive_more::{Deref, From};

const SEPARATOR: char = '/';

/// Address of a node inside a [`ConfigTree`](super::ConfigTree), relative to the watched root.
///
/// An empty path addresses the root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deref, From)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    /// Strips the watched root from an absolute store key and splits the rest into segments.
    ///
    /// Keys outside of `root` are not checked; the store only reports keys below the watched
    /// directory, so such a key is split as-is.
    pub fn relative(key: &str, root: &str) -> Self {
        let root = root.trim_end_matches(SEPARATOR);
        let relative = key.strip_prefix(root).unwrap_or(key);
        Self::parse(relative)
    }

    /// Splits a slash delimited path into segments, dropping empty ones.
    pub fn parse(path: &str) -> Self {
        KeyPath(
            path.split(SEPARATOR)
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        KeyPath(segments)
    }
}

impl std::fmt::Display for KeyPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl From<&[&str]> for KeyPath {
    fn from(segments: &[&str]) -> Self {
        KeyPath(segments.iter().map(|s| s.to_string()).collect())
    }
}
