//! Parsed extension manifest.
//!
//! Only `browser_action.default_popup` and `browser_action.default_icon` are
//! interpreted; every other key is carried through untouched for the host.

use crate::resource::ResourceError;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

const BROWSER_ACTION_KEY: &str = "browser_action";
const DEFAULT_POPUP_KEY: &str = "default_popup";
const DEFAULT_ICON_KEY: &str = "default_icon";
const NOT_A_DICTIONARY_MESSAGE: &str = "Incorrectly formatted dictionary contents.";

/// Key-ordered JSON object read from `manifest.json`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    root: Map<String, Value>,
}

impl Manifest {
    pub fn new(root: Map<String, Value>) -> Self {
        Self { root }
    }

    /// Parses raw manifest bytes.
    ///
    /// # Errors
    /// - `EmptyContents` when `bytes` is empty.
    /// - `Malformed` with the parser message when `bytes` is not JSON.
    /// - `NotAnObject` when the top-level value is not an object.
    pub fn parse(bytes: &[u8]) -> Result<Self, ManifestError> {
        if bytes.is_empty() {
            return Err(ManifestError::EmptyContents);
        }
        let value: Value =
            serde_json::from_slice(bytes).map_err(|err| ManifestError::Malformed(err.to_string()))?;
        Self::try_from(value)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }

    /// Returns the nested object stored under `key`, if any.
    pub fn get_dictionary(&self, key: &str) -> Option<&Map<String, Value>> {
        self.root.get(key).and_then(Value::as_object)
    }

    /// Returns the string stored under `key`, or `""` when absent or not a string.
    pub fn get_string(&self, key: &str) -> &str {
        self.root.get(key).and_then(Value::as_str).unwrap_or("")
    }

    /// `browser_action.default_popup`, or `""`.
    pub fn default_popup(&self) -> &str {
        self.browser_action_string(DEFAULT_POPUP_KEY)
    }

    /// `browser_action.default_icon`, or `""`.
    pub fn default_icon(&self) -> &str {
        self.browser_action_string(DEFAULT_ICON_KEY)
    }

    fn browser_action_string(&self, key: &str) -> &str {
        self.get_dictionary(BROWSER_ACTION_KEY)
            .and_then(|action| action.get(key))
            .and_then(Value::as_str)
            .unwrap_or("")
    }
}

impl TryFrom<Value> for Manifest {
    type Error = ManifestError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            _ => Err(ManifestError::NotAnObject),
        }
    }
}

/// Manifest retrieval and parse failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestError {
    Unreadable(ResourceError),
    EmptyContents,
    Malformed(String),
    NotAnObject,
}

impl Display for ManifestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unreadable(err) => write!(f, "manifest is unreadable: {err}"),
            Self::EmptyContents => write!(f, "manifest is empty"),
            Self::Malformed(message) if !message.is_empty() => f.write_str(message),
            Self::Malformed(_) | Self::NotAnObject => f.write_str(NOT_A_DICTIONARY_MESSAGE),
        }
    }
}

impl Error for ManifestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unreadable(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResourceError> for ManifestError {
    fn from(value: ResourceError) -> Self {
        Self::Unreadable(value)
    }
}
