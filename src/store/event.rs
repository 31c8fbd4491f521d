use std::str::FromStr;

use derive_more::Display;
use snafu::Snafu;

/// Kind of mutation reported by the store for a single key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Action {
    #[display("create")]
    Create,
    #[display("set")]
    Set,
    #[display("update")]
    Update,
    #[display("delete")]
    Delete,
    #[display("expire")]
    Expire,
}

impl Action {
    /// Whether the action removes the key instead of writing it
    pub fn is_removal(self) -> bool {
        matches!(self, Action::Delete | Action::Expire)
    }
}

impl FromStr for Action {
    type Err = UnknownActionError;

    fn from_str(action: &str) -> Result<Self, Self::Err> {
        match action {
            "create" => Ok(Action::Create),
            "set" => Ok(Action::Set),
            "update" | "compareAndSwap" => Ok(Action::Update),
            "delete" | "compareAndDelete" => Ok(Action::Delete),
            "expire" => Ok(Action::Expire),
            _ => Err(UnknownActionError {
                action: action.to_string(),
            }),
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(display("Unknown store action '{}'", action))]
pub struct UnknownActionError {
    action: String,
}

/// One change below the watched directory, as delivered by the watch stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub action: Action,
    /// Absolute key in the store
    pub key: String,
    pub value: Option<String>,
    pub dir: bool,
}

#[cfg(test)]
impl ChangeEvent {
    pub fn new(action: Action, key: impl Into<String>, value: Option<String>) -> Self {
        Self {
            action,
            key: key.into(),
            value,
            dir: false,
        }
    }

    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(Action::Set, key, Some(value.into()))
    }

    pub fn delete(key: impl Into<String>) -> Self {
        Self::new(Action::Delete, key, None)
    }

    pub fn directory(action: Action, key: impl Into<String>) -> Self {
        Self {
            dir: true,
            ..Self::new(action, key, None)
        }
    }
}
