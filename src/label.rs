use log::warn;
use serde::{Deserialize, Serialize};

/// Short human readable identifier of a receiver session
/// (serial number, marker name..). Limited to [Label::MAX_LEN] characters:
/// longer descriptions are truncated on a character boundary.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Label(String);

impl Label {
    /// Maximal number of characters
    pub const MAX_LEN: usize = 20;

    /// Builds a new [Label], truncating `description` to [Self::MAX_LEN] characters.
    pub fn new(description: &str) -> Self {
        let description = description.trim();

        match description.char_indices().nth(Self::MAX_LEN) {
            Some((offset, _)) => {
                let truncated = &description[..offset];
                warn!("label \"{}\" truncated to \"{}\"", description, truncated);
                Self(truncated.to_string())
            },
            None => Self(description.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Label {
    fn from(description: &str) -> Self {
        Self::new(description)
    }
}

impl From<String> for Label {
    fn from(description: String) -> Self {
        Self::new(&description)
    }
}

impl From<Label> for String {
    fn from(label: Label) -> Self {
        label.0
    }
}

impl AsRef<str> for Label {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
