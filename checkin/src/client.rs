//! HTTP implementation of [`TicketApi`].

use crate::config::ClientConfig;
use crate::error::{CheckInError, Result};
use crate::providers::TicketApi;
use crate::session::Session;
use crate::types::{CheckInReceipt, Event, EventId, SummaryReport};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Response wrapper used by every endpoint: `{ success, message?, data? }`
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

impl<T> Envelope<T> {
    fn accepted(self) -> Result<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(CheckInError::Rejected {
                message: self.message,
            })
        }
    }

    fn into_data(self) -> Result<T> {
        self.accepted()?
            .data
            .ok_or_else(|| CheckInError::Decode("response is missing `data`".to_string()))
    }
}

/// Body of a non-2xx response, when it is JSON at all
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MarkUsedRequest<'a> {
    event_id: &'a EventId,
    full_ticket_number: &'a str,
}

/// Ticket service client over HTTPS.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct HttpTicketApi {
    client: Client,
    base_url: Url,
    tenant_header: String,
}

impl HttpTicketApi {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CheckInError::Config`] if the API URL is not a valid base URL
    /// or the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.api_url)
            .map_err(|e| CheckInError::Config(format!("invalid API URL `{}`: {e}", config.api_url)))?;

        if base_url.cannot_be_a_base() {
            return Err(CheckInError::Config(format!(
                "API URL `{}` cannot be used as a base URL",
                config.api_url
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CheckInError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            tenant_header: config.tenant_header.clone(),
        })
    }

    /// Base URL requests are sent to
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`: the base URL always has path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorized(&self, request: RequestBuilder, session: &Session) -> RequestBuilder {
        request
            .bearer_auth(&session.token)
            .header(self.tenant_header.as_str(), session.tenant_id.as_str())
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Envelope<T>> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .unwrap_or_default()
                .message;
            tracing::debug!(status = status.as_u16(), ?message, "Ticket service returned an error status");
            return Err(CheckInError::Http {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Envelope<T>>()
            .await
            .map_err(|e| CheckInError::Decode(e.to_string()))
    }

    #[tracing::instrument(skip(self, session), fields(tenant = %session.tenant_id), err)]
    async fn fetch_events(&self, session: &Session) -> Result<Vec<Event>> {
        let url = self.endpoint(&["events", "ongoing-upcoming"]);
        let request = self.authorized(self.client.get(url), session);

        let events = self.execute::<Vec<Event>>(request).await?.into_data()?;
        tracing::debug!(count = events.len(), "Fetched events");
        Ok(events)
    }

    #[tracing::instrument(skip(self, session), fields(tenant = %session.tenant_id))]
    async fn post_mark_used(
        &self,
        session: &Session,
        event_id: &EventId,
        ticket_code: &str,
    ) -> Result<CheckInReceipt> {
        let url = self.endpoint(&["tickets", "admin", "mark-used"]);
        let body = MarkUsedRequest {
            event_id,
            full_ticket_number: ticket_code,
        };
        let request = self.authorized(self.client.post(url), session).json(&body);

        let envelope = self.execute::<IgnoredAny>(request).await?.accepted()?;
        Ok(CheckInReceipt {
            message: envelope.message,
        })
    }

    #[tracing::instrument(skip(self, session), fields(tenant = %session.tenant_id), err)]
    async fn fetch_summary(&self, session: &Session, event_id: &EventId) -> Result<SummaryReport> {
        let url = self.endpoint(&["tickets", "admin", "event", event_id.as_str(), "summary"]);
        let request = self.authorized(self.client.get(url), session);

        let report = self.execute::<SummaryReport>(request).await?.into_data()?;
        tracing::debug!(attendees = report.attendees.len(), "Fetched event summary");
        Ok(report)
    }
}

impl TicketApi for HttpTicketApi {
    fn list_events(&self, session: &Session) -> impl Future<Output = Result<Vec<Event>>> + Send {
        self.fetch_events(session)
    }

    fn mark_used(
        &self,
        session: &Session,
        event_id: &EventId,
        ticket_code: &str,
    ) -> impl Future<Output = Result<CheckInReceipt>> + Send {
        self.post_mark_used(session, event_id, ticket_code)
    }

    fn event_summary(
        &self,
        session: &Session,
        event_id: &EventId,
    ) -> impl Future<Output = Result<SummaryReport>> + Send {
        self.fetch_summary(session, event_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_keeps_base_path() {
        let api = HttpTicketApi::new(&ClientConfig::new("https://tickets.example.com/api/")).unwrap();
        let url = api.endpoint(&["tickets", "admin", "event", "evt 1", "summary"]);
        assert_eq!(
            url.as_str(),
            "https://tickets.example.com/api/tickets/admin/event/evt%201/summary"
        );
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let result = HttpTicketApi::new(&ClientConfig::new("not a url"));
        assert!(matches!(result, Err(CheckInError::Config(_))));

        let result = HttpTicketApi::new(&ClientConfig::new("mailto:ops@example.com"));
        assert!(matches!(result, Err(CheckInError::Config(_))));
    }

    #[test]
    fn test_envelope_rejection_keeps_message() {
        let envelope: Envelope<IgnoredAny> =
            serde_json::from_str(r#"{"success":false,"message":"Already used"}"#).unwrap();
        assert_eq!(
            envelope.accepted().unwrap_err(),
            CheckInError::Rejected {
                message: Some("Already used".to_string())
            }
        );
    }

    #[test]
    fn test_envelope_without_data_is_decode_error() {
        let envelope: Envelope<Vec<Event>> = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(matches!(envelope.into_data(), Err(CheckInError::Decode(_))));
    }
}
