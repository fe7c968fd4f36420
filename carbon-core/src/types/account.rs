use serde::{Deserialize, Serialize};
use std::fmt;

/// A ledger participant. `System` is the domain sentinel used for issuance
/// and mining rewards; it never holds a real, debitable balance entry in
/// the sense that it is never checked for sufficient funds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id")]
pub enum Account {
    System,
    User(String),
}

impl Account {
    pub fn is_system(&self) -> bool {
        matches!(self, Account::System)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Account::System => "system",
            Account::User(id) => id,
        }
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Account {
    fn from(s: &str) -> Self {
        if s == "system" {
            Account::System
        } else {
            Account::User(s.to_string())
        }
    }
}

impl From<String> for Account {
    fn from(s: String) -> Self {
        Account::from(s.as_str())
    }
}
