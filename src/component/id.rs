use crate::component::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const TYPE_AND_NAME_SEPARATOR: char = '/';

/// Identity of one configured component instance: `type` or `type/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ComponentId {
    component_type: String,
    name: String,
}

impl ComponentId {
    pub fn new(component_type: impl Into<String>) -> Self {
        Self {
            component_type: component_type.into(),
            name: String::new(),
        }
    }

    pub fn with_name(component_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            component_type: component_type.into(),
            name: name.into(),
        }
    }

    pub fn component_type(&self) -> &str {
        &self.component_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.component_type)
        } else {
            write!(
                f,
                "{}{}{}",
                self.component_type, TYPE_AND_NAME_SEPARATOR, self.name
            )
        }
    }
}

impl FromStr for ComponentId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (component_type, name) = match s.split_once(TYPE_AND_NAME_SEPARATOR) {
            Some((t, n)) => {
                let n = n.trim();
                if n.is_empty() {
                    return Err(ConfigError::InvalidComponentId(format!(
                        "name part must be specified after {TYPE_AND_NAME_SEPARATOR} in {s:?}"
                    )));
                }
                (t.trim(), n)
            }
            None => (s, ""),
        };

        if component_type.is_empty() {
            return Err(ConfigError::InvalidComponentId(format!(
                "type part is empty in {s:?}"
            )));
        }

        Ok(Self::with_name(component_type, name))
    }
}

impl TryFrom<String> for ComponentId {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ComponentId> for String {
    fn from(id: ComponentId) -> Self {
        id.to_string()
    }
}
