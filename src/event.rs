use serde::Deserialize;

use crate::error::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    Ping,
    Issues(IssuesPayload),
    Other(String),
}

impl WebhookEvent {
    /// Builds the event from the `x-github-event` value and the decoded body.
    /// Only `issues` bodies are parsed; everything else is ignored unread.
    pub fn parse(event_type: Option<&str>, body: &[u8]) -> Result<Self, Error> {
        match event_type {
            Some("ping") => Ok(WebhookEvent::Ping),
            Some("issues") => {
                let text = std::str::from_utf8(body)
                    .map_err(|e| Error::MalformedPayload(format!("body is not UTF-8: {e}")))?;
                let payload = serde_json::from_str(text)
                    .map_err(|e| Error::MalformedPayload(e.to_string()))?;
                Ok(WebhookEvent::Issues(payload))
            }
            Some(other) => Ok(WebhookEvent::Other(other.to_string())),
            None => Ok(WebhookEvent::Other("unknown".to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IssuesPayload {
    pub action: String,
    pub issue: Issue,
    pub installation: Option<Installation>,
}

impl IssuesPayload {
    pub fn is_newly_opened(&self) -> bool {
        self.action == "opened" && self.issue.state == "open"
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Issue {
    pub state: String,
    pub node_id: String,
    pub number: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Installation {
    pub id: u64,
}
