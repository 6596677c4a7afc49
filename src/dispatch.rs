use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::{
    config::ProjectReference,
    error::Error,
    event::{IssuesPayload, WebhookEvent},
    github::AppAuthenticator,
};

/// What happened to a delivery that was handled without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ignored,
    AddedToProject { item_id: String },
}

/// Routes verified events and adds newly opened issues to the project board.
#[derive(Clone)]
pub struct Dispatcher {
    github: Arc<dyn AppAuthenticator>,
    project: ProjectReference,
}

impl Dispatcher {
    pub fn new(github: Arc<dyn AppAuthenticator>, project: ProjectReference) -> Self {
        Self { github, project }
    }

    pub async fn dispatch(&self, event: WebhookEvent) -> Result<Outcome, Error> {
        match event {
            WebhookEvent::Ping => {
                info!("Received ping event - webhook is configured correctly!");
                Ok(Outcome::Ignored)
            }
            WebhookEvent::Issues(payload) => self.handle_issue(payload).await,
            WebhookEvent::Other(event_type) => {
                info!("Unhandled event type: {}", event_type);
                Ok(Outcome::Ignored)
            }
        }
    }

    #[instrument(
        skip_all,
        fields(action = %payload.action, issue = ?payload.issue.number, node_id = %payload.issue.node_id)
    )]
    async fn handle_issue(&self, payload: IssuesPayload) -> Result<Outcome, Error> {
        if !payload.is_newly_opened() {
            debug!(state = %payload.issue.state, "Issue event needs no action");
            return Ok(Outcome::Ignored);
        }

        // Fail before touching GitHub when the board can't be looked up at all.
        self.project.owner_type.graphql_field()?;

        let installation_id = payload
            .installation
            .as_ref()
            .map(|i| i.id)
            .ok_or_else(|| Error::MalformedPayload("issues event has no installation".into()))?;

        let client = self.github.installation_client(installation_id).await?;

        let project_id = client
            .find_project_id(&self.project)
            .await?
            .ok_or_else(|| Error::ProjectNotFound {
                owner: self.project.owner.clone(),
                owner_type: self.project.owner_type,
                number: self.project.number,
            })?;

        let item_id = client
            .add_project_item(&project_id, &payload.issue.node_id)
            .await?;

        info!(
            project_id = %project_id,
            item_id = %item_id,
            "Added issue to project {}/{}",
            self.project.owner,
            self.project.number
        );

        Ok(Outcome::AddedToProject { item_id })
    }
}
