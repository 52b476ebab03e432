//! Connection and table configuration holders.

use std::fmt;

/// Root of the public Airtable REST API.
pub const DEFAULT_BASE_URL: &str = "https://api.airtable.com/v0";

/// Credentials and location of an Airtable base.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    base_id: String,
    api_key: String,
    base_url: String,
}

impl ConnectionInfo {
    pub fn new(base_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_id: base_id.into(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the connection at a different API root, e.g. a local mock.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Read `AIRTABLE_BASE_ID` and `AIRTABLE_API_KEY` (plus the optional
    /// `AIRTABLE_BASE_URL`) from the environment.
    ///
    /// Returns `None` if either required variable is unset.
    pub fn from_env() -> Option<Self> {
        let base_id = std::env::var("AIRTABLE_BASE_ID").ok()?;
        let api_key = std::env::var("AIRTABLE_API_KEY").ok()?;
        let info = Self::new(base_id, api_key);
        Some(match std::env::var("AIRTABLE_BASE_URL") {
            Ok(url) => info.with_base_url(&url),
            Err(_) => info,
        })
    }

    pub fn base_id(&self) -> &str {
        &self.base_id
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl fmt::Debug for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionInfo")
            .field("base_id", &self.base_id)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// A table within a base, plus the column used to look records up by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    name: String,
    id_column: String,
}

impl TableInfo {
    pub fn new(name: impl Into<String>, id_column: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id_column: id_column.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id_column(&self) -> &str {
        &self.id_column
    }
}
