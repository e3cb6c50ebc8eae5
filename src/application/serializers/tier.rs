use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Representation depth, from the bare reference to the full record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Min,
    List,
    #[serde(alias = "emb")]
    Embed,
    Full,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Min, Tier::List, Tier::Embed, Tier::Full];

    /// Prefix of the cache key for this tier. `Full` is never cached.
    pub fn cache_prefix(self) -> Option<&'static str> {
        match self {
            Tier::Min => Some("MIN"),
            Tier::List => Some("LIST"),
            Tier::Embed => Some("EMB"),
            Tier::Full => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Min => "min",
            Tier::List => "list",
            Tier::Embed => "embed",
            Tier::Full => "full",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown tier `{0}`; expected one of min, list, embed, full")]
pub struct ParseTierError(String);

impl FromStr for Tier {
    type Err = ParseTierError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "min" => Ok(Tier::Min),
            "list" => Ok(Tier::List),
            "emb" | "embed" => Ok(Tier::Embed),
            "full" => Ok(Tier::Full),
            _ => Err(ParseTierError(value.to_string())),
        }
    }
}
