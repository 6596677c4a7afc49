use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    dispatch::{Dispatcher, Outcome},
    error::Error,
    event::WebhookEvent,
    request::InboundRequest,
    signature::{Signature, signature_header},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub status_code: u16,
}

pub const OK_RESPONSE: HandlerResponse = HandlerResponse { status_code: 200 };

/// Verifies a delivery and hands it to the dispatcher.
#[derive(Clone)]
pub struct WebhookHandler {
    webhook_secret: String,
    dispatcher: Dispatcher,
}

impl WebhookHandler {
    pub fn new(webhook_secret: impl Into<String>, dispatcher: Dispatcher) -> Self {
        Self {
            webhook_secret: webhook_secret.into(),
            dispatcher,
        }
    }

    pub async fn handle(&self, request: &InboundRequest) -> Result<HandlerResponse, Error> {
        let signature = signature_header(&request.headers)
            .and_then(Signature::parse)
            .inspect_err(|e| warn!("{e}"))?;

        // GitHub signs the payload bytes, not the platform's base64 wrapping.
        // Until the signature checks out, a body we can't decode is just an
        // unauthenticated request.
        let body = request.decoded_body().map_err(|e| {
            warn!("Undecodable body on unverified request: {e}");
            Error::AuthenticationFailure("body could not be decoded for verification".into())
        })?;
        signature
            .verify(&self.webhook_secret, &body)
            .inspect_err(|e| warn!("Invalid webhook signature: {e}"))?;

        let event = WebhookEvent::parse(request.event_type(), &body)?;
        debug!(
            event_type = request.event_type().unwrap_or("unknown"),
            payload = %String::from_utf8_lossy(&body),
            "Verified webhook delivery"
        );

        match self.dispatcher.dispatch(event).await? {
            Outcome::Ignored => debug!("Nothing to do for this delivery"),
            Outcome::AddedToProject { item_id } => debug!(%item_id, "Delivery produced a project item"),
        }

        Ok(OK_RESPONSE)
    }
}
