use std::fmt;

use clap::{Parser, ValueEnum};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OwnerType {
    Organization,
    User,
}

impl OwnerType {
    /// The top-level GraphQL field the project lookup selects for this owner.
    ///
    /// Only organization-owned projects are looked up today; asking for a
    /// user-owned project fails instead of issuing a query that can't resolve.
    pub fn graphql_field(self) -> Result<&'static str, Error> {
        match self {
            OwnerType::Organization => Ok("organization"),
            OwnerType::User => Err(Error::UnsupportedOwnerType(self)),
        }
    }
}

impl fmt::Display for OwnerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerType::Organization => f.write_str("organization"),
            OwnerType::User => f.write_str("user"),
        }
    }
}

/// The single project board that opened issues are added to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectReference {
    pub owner: String,
    pub owner_type: OwnerType,
    pub number: u32,
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    #[arg(short, long, env = "PORT", default_value = "6666")]
    pub port: u16,

    #[arg(long, env = "GITHUB_WEBHOOK_SECRET", hide_env_values = true)]
    pub webhook_secret: String,

    /// PEM private key of the GitHub App. Literal `\n` sequences are accepted.
    #[arg(long, env = "GITHUB_APP_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: String,

    #[arg(long, env = "GITHUB_APP_ID", default_value = "311508")]
    pub app_id: u64,

    #[arg(long, env = "PROJECT_OWNER", default_value = "PRX")]
    pub project_owner: String,

    #[arg(long, env = "PROJECT_OWNER_TYPE", value_enum, default_value = "organization")]
    pub project_owner_type: OwnerType,

    #[arg(long, env = "PROJECT_NUMBER", default_value = "3")]
    pub project_number: u32,

    #[arg(long, env = "GITHUB_API_URL", default_value = "https://api.github.com")]
    pub github_api_url: String,
}

impl Config {
    pub fn project(&self) -> ProjectReference {
        ProjectReference {
            owner: self.project_owner.clone(),
            owner_type: self.project_owner_type,
            number: self.project_number,
        }
    }

    pub fn private_key_pem(&self) -> String {
        normalize_private_key(&self.private_key)
    }
}

/// Keys pasted into a single-line environment value carry `\n` as two
/// characters. Keys that already contain real newlines pass through unchanged.
pub fn normalize_private_key(raw: &str) -> String {
    raw.replace("\\n", "\n")
}
