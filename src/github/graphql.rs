use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};

use super::ProjectsClient;
use crate::{config::ProjectReference, error::Error};

const ADD_PROJECT_ITEM_MUTATION: &str = "mutation addIssueToProject($projectId: ID!, $contentId: ID!) {
  addProjectV2ItemById(input: {projectId: $projectId, contentId: $contentId}) {
    item {
      id
    }
  }
}";

/// GraphQL can't take a field name as a variable, so the owner field is
/// spliced in. It only ever comes from `OwnerType::graphql_field`.
fn project_lookup_query(owner_field: &str) -> String {
    format!(
        "query getProject($login: String!, $number: Int!) {{
  {owner_field}(login: $login) {{
    projectV2(number: $number) {{
      id
    }}
  }}
}}"
    )
}

#[derive(Debug, Serialize)]
struct GraphQLRequest<'a> {
    query: &'a str,
    variables: Value,
}

#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLError {
    message: String,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddItemData {
    add_project_v2_item_by_id: AddItemPayload,
}

#[derive(Debug, Deserialize)]
struct AddItemPayload {
    item: ProjectItem,
}

#[derive(Debug, Deserialize)]
struct ProjectItem {
    id: String,
}

/// GraphQL client authorized as one App installation.
pub struct InstallationClient {
    http: reqwest::Client,
    token: String,
    graphql_url: String,
}

impl InstallationClient {
    pub fn new(http: reqwest::Client, token: String, graphql_url: String) -> Self {
        Self {
            http,
            token,
            graphql_url,
        }
    }

    async fn execute<R: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<R, Error> {
        let request = GraphQLRequest { query, variables };

        let response = self
            .http
            .post(&self.graphql_url)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::RemoteCall(format!(
                "GraphQL request returned {status}: {body}"
            )));
        }

        let gql: GraphQLResponse<R> = response.json().await?;

        // A missing project comes back as NOT_FOUND alongside null data; let
        // callers see the null instead of a transport failure.
        if let Some(errors) = gql.errors.filter(|e| !e.is_empty()) {
            let only_not_found = errors
                .iter()
                .all(|e| e.kind.as_deref() == Some("NOT_FOUND"));
            if !(only_not_found && gql.data.is_some()) {
                let messages: Vec<_> = errors.iter().map(|e| e.message.as_str()).collect();
                return Err(Error::RemoteCall(messages.join("; ")));
            }
            warn!(errors = ?errors, "GraphQL reported missing objects");
        }

        gql.data
            .ok_or_else(|| Error::RemoteCall("GraphQL response carried no data".into()))
    }
}

#[async_trait]
impl ProjectsClient for InstallationClient {
    #[instrument(skip(self), fields(owner = %project.owner, number = project.number))]
    async fn find_project_id(&self, project: &ProjectReference) -> Result<Option<String>, Error> {
        let field = project.owner_type.graphql_field()?;
        let query = project_lookup_query(field);

        let data: Value = self
            .execute(
                &query,
                json!({ "login": project.owner, "number": project.number }),
            )
            .await?;

        let id = data
            .get(field)
            .and_then(|owner| owner.get("projectV2"))
            .and_then(|p| p.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string);

        debug!(project_id = ?id, "Project lookup finished");
        Ok(id)
    }

    #[instrument(skip(self))]
    async fn add_project_item(&self, project_id: &str, content_id: &str) -> Result<String, Error> {
        let data: AddItemData = self
            .execute(
                ADD_PROJECT_ITEM_MUTATION,
                json!({ "projectId": project_id, "contentId": content_id }),
            )
            .await?;

        Ok(data.add_project_v2_item_by_id.item.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_query_selects_owner_field_and_keeps_values_as_variables() {
        let query = project_lookup_query("organization");
        assert!(query.contains("organization(login: $login)"));
        assert!(query.contains("projectV2(number: $number)"));
        assert!(!query.contains("PRX"));
    }

    #[test]
    fn mutation_is_parameterized() {
        assert!(ADD_PROJECT_ITEM_MUTATION.contains("$projectId: ID!"));
        assert!(ADD_PROJECT_ITEM_MUTATION.contains("$contentId: ID!"));
        assert!(!ADD_PROJECT_ITEM_MUTATION.contains('"'));
    }
}
