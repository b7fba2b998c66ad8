use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Settings;
use crate::error::FetchError;
use crate::http_client::http_client;
use crate::state::MatchPrediction;

pub const MATCHDAY_FAILED: &str = "Failed to fetch predictions";
pub const TEAMS_FAILED: &str = "Failed to fetch teams";
pub const CUSTOM_FAILED: &str = "Failed to get prediction";

/// The prediction backend, seen as three calls.
pub trait PredictionApi {
    fn current_matchday(&self) -> Result<Vec<MatchPrediction>, FetchError>;
    fn teams(&self) -> Result<Vec<String>, FetchError>;
    fn custom(&self, home_team: &str, away_team: &str) -> Result<MatchPrediction, FetchError>;
}

#[derive(Debug, Clone)]
pub struct HttpPredictionApi {
    client: &'static Client,
    base_url: String,
    matchday_timeout: Duration,
}

impl HttpPredictionApi {
    pub fn new(base_url: impl Into<String>, matchday_timeout: Duration) -> Result<Self, FetchError> {
        let client = http_client().map_err(|err| FetchError::Setup(format!("{err:#}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            matchday_timeout,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, FetchError> {
        Self::new(settings.api_url.clone(), settings.matchday_timeout)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CustomRequest<'a> {
    home_team: &'a str,
    away_team: &'a str,
}

impl PredictionApi for HttpPredictionApi {
    fn current_matchday(&self) -> Result<Vec<MatchPrediction>, FetchError> {
        let req = self
            .client
            .get(self.url("/api/predictions/current-matchday"))
            .timeout(self.matchday_timeout);
        let body = send(req, MATCHDAY_FAILED)?;
        parse_matchday_json(&body)
    }

    fn teams(&self) -> Result<Vec<String>, FetchError> {
        let body = send(self.client.get(self.url("/api/teams")), TEAMS_FAILED)?;
        parse_teams_json(&body)
    }

    fn custom(&self, home_team: &str, away_team: &str) -> Result<MatchPrediction, FetchError> {
        let req = self
            .client
            .post(self.url("/api/predictions/custom"))
            .json(&CustomRequest {
                home_team,
                away_team,
            });
        let body = send(req, CUSTOM_FAILED)?;
        parse_custom_json(&body)
    }
}

fn send(req: RequestBuilder, context: &'static str) -> Result<String, FetchError> {
    let resp = req
        .send()
        .map_err(|source| FetchError::Transport { context, source })?;
    let status = resp.status();
    let body = resp
        .text()
        .map_err(|source| FetchError::Transport { context, source })?;
    if !status.is_success() {
        return Err(FetchError::Backend {
            status: status.as_u16(),
            message: backend_error_message(&body).unwrap_or_else(|| context.to_string()),
        });
    }
    Ok(body)
}

/// The `error` field of a backend error body, if it sent a usable one.
pub fn backend_error_message(raw: &str) -> Option<String> {
    let root: Value = serde_json::from_str(raw.trim()).ok()?;
    root.get("error")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|msg| !msg.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Deserialize)]
struct MatchdayResponse {
    #[serde(default)]
    predictions: Vec<MatchPrediction>,
}

#[derive(Debug, Deserialize)]
struct TeamsResponse {
    #[serde(default)]
    teams: Vec<String>,
}

pub fn parse_matchday_json(raw: &str) -> Result<Vec<MatchPrediction>, FetchError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    serde_json::from_str::<MatchdayResponse>(trimmed)
        .map(|resp| resp.predictions)
        .map_err(|source| FetchError::Decode {
            context: MATCHDAY_FAILED,
            source,
        })
}

pub fn parse_teams_json(raw: &str) -> Result<Vec<String>, FetchError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    serde_json::from_str::<TeamsResponse>(trimmed)
        .map(|resp| resp.teams)
        .map_err(|source| FetchError::Decode {
            context: TEAMS_FAILED,
            source,
        })
}

pub fn parse_custom_json(raw: &str) -> Result<MatchPrediction, FetchError> {
    serde_json::from_str::<MatchPrediction>(raw.trim()).map_err(|source| FetchError::Decode {
        context: CUSTOM_FAILED,
        source,
    })
}
