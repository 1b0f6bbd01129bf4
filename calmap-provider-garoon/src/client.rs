//! Async Garoon SOAP client.

use std::collections::HashMap;

use calmap_core::{Event, Instant};
use chrono::Utc;
use tokio::sync::Mutex;
use url::Url;

use crate::config::GaroonConfig;
use crate::error::{GaroonError, GaroonResult};
use crate::schedule::parse_schedule_events;
use crate::soap::{parse_soap_response, render_soap_request};
use crate::wsdl::{EndpointDirectory, parse_wsdl_endpoints};

/// Client for a single Garoon server.
///
/// Endpoints are discovered lazily from the WSDL and cached for the
/// lifetime of the client; see [`GaroonClient::get_soap_endpoints`] to
/// refresh the cache by hand.
pub struct GaroonClient {
    config: GaroonConfig,
    http: reqwest::Client,
    directory: Mutex<EndpointDirectory>,
}

impl GaroonClient {
    /// Validates `config` and builds a client. No network traffic
    /// happens until the first request.
    pub fn new(config: GaroonConfig) -> GaroonResult<GaroonClient> {
        config.validate()?;
        Ok(GaroonClient {
            config,
            http: reqwest::Client::new(),
            directory: Mutex::new(EndpointDirectory::default()),
        })
    }

    pub fn config(&self) -> &GaroonConfig {
        &self.config
    }

    /// Fetches the WSDL and replaces the cached endpoint map with its
    /// contents.
    pub async fn get_soap_endpoints(&self) -> GaroonResult<HashMap<String, Url>> {
        let text = self
            .http
            .get(self.config.wsdl_url())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let endpoints = parse_wsdl_endpoints(&text)?;
        self.directory.lock().await.replace(endpoints.clone());
        Ok(endpoints)
    }

    /// Resolves the endpoint of `service`, re-fetching the WSDL once on
    /// a cache miss before giving up with
    /// [`GaroonError::UnknownService`].
    async fn endpoint_for(&self, service: &str) -> GaroonResult<Url> {
        if let Some(url) = self.directory.lock().await.lookup(service).cloned() {
            return Ok(url);
        }

        let endpoints = self.get_soap_endpoints().await?;
        endpoints
            .get(service)
            .cloned()
            .ok_or_else(|| GaroonError::UnknownService(service.to_string()))
    }

    /// Executes one SOAP action against `service` and returns the raw
    /// response body, after checking it for a fault.
    pub async fn execute_soap_request(
        &self,
        service: &str,
        action: &str,
        params: &[(&str, String)],
    ) -> GaroonResult<String> {
        let endpoint = self.endpoint_for(service).await?;
        let envelope = render_soap_request(
            action,
            &self.config.user,
            &self.config.password,
            &self.config.language,
            params,
            Utc::now(),
        );

        let text = self
            .http
            .post(endpoint)
            .header("Content-Type", "text/xml; charset=UTF-8")
            .body(envelope)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_soap_response(&text)?;
        Ok(text)
    }

    /// Retrieves the events between `start` and `end` (inclusive),
    /// with repeating events expanded into their occurrences.
    pub async fn get_events(&self, start: &Instant, end: &Instant) -> GaroonResult<Vec<Event>> {
        if start > end {
            return Err(GaroonError::InvalidRange {
                start: start.clone(),
                end: end.clone(),
            });
        }

        let params = [
            ("start", format_soap_datetime(start)),
            ("end", format_soap_datetime(end)),
        ];
        let text = self
            .execute_soap_request("ScheduleService", "ScheduleGetEvents", &params)
            .await?;

        let doc = parse_soap_response(&text)?;
        let zone = self.config.zone()?;
        parse_schedule_events(&doc, &zone, start, end)
    }
}

/// Request parameters are absolute UTC datetimes.
fn format_soap_datetime(instant: &Instant) -> String {
    instant.to_utc().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
