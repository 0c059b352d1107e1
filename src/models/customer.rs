use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subscription level of a customer
///
/// The tier alone decides whether object storage is exported and whether the
/// artifact is archived. Standard customers never incur storage downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Standard,
    Pro,
}

impl Tier {
    pub fn exports_storage(self) -> bool {
        matches!(self, Tier::Pro)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Standard => "standard",
            Tier::Pro => "pro",
        }
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Tier::Standard),
            "pro" | "premium" => Ok(Tier::Pro),
            other => Err(format!("Unknown subscription tier: {other}")),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Customer row as stored in the admin database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CustomerRow {
    pub id: String,
    pub name: String,
    pub project_url: Option<String>,
    pub project_key: Option<String>,
    pub tier: String,
    pub active: bool,
}

/// Customer record owned by the admin side; read-only to the backup engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerRecord {
    pub id: String,
    pub name: String,
    pub project_url: Option<String>,
    pub project_key: Option<String>,
    pub tier: Tier,
    pub active: bool,
}

/// Credentials for a customer's own hosted project
#[derive(Clone, PartialEq, Eq)]
pub struct ProjectCredentials {
    pub project_url: String,
    pub project_key: String,
    pub tier: Tier,
}

// Keys stay out of logs and panics.
impl fmt::Debug for ProjectCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectCredentials")
            .field("project_url", &self.project_url)
            .field("project_key", &"<redacted>")
            .field("tier", &self.tier)
            .finish()
    }
}

impl CustomerRecord {
    /// Credentials for the customer's project, if both URL and key are present
    pub fn credentials(&self) -> Option<ProjectCredentials> {
        let url = self.project_url.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let key = self.project_key.as_deref().map(str::trim).filter(|s| !s.is_empty())?;

        Some(ProjectCredentials {
            project_url: url.to_string(),
            project_key: key.to_string(),
            tier: self.tier,
        })
    }
}

impl TryFrom<CustomerRow> for CustomerRecord {
    type Error = String;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        Ok(CustomerRecord {
            tier: row.tier.parse()?,
            id: row.id,
            name: row.name,
            project_url: row.project_url,
            project_key: row.project_key,
            active: row.active,
        })
    }
}
