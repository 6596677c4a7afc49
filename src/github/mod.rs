//! GitHub access: App authentication and the two project calls we make.

use async_trait::async_trait;

use crate::{config::ProjectReference, error::Error};

mod app;
mod graphql;

pub use app::GitHubApp;
pub use graphql::InstallationClient;

/// Turns an installation id into a client authorized for that installation.
#[async_trait]
pub trait AppAuthenticator: Send + Sync {
    async fn installation_client(&self, installation_id: u64)
    -> Result<Box<dyn ProjectsClient>, Error>;
}

/// The project operations the dispatcher needs from an authorized client.
#[async_trait]
pub trait ProjectsClient: Send + Sync {
    /// Resolves the board to its opaque id. `Ok(None)` when GitHub has no such project.
    async fn find_project_id(&self, project: &ProjectReference) -> Result<Option<String>, Error>;

    /// Adds the content (issue node id) to the project and returns the new item id.
    async fn add_project_item(&self, project_id: &str, content_id: &str) -> Result<String, Error>;
}
