#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use epl_predictor::error::FetchError;
use epl_predictor::matchday::Clock;
use epl_predictor::predict_api::PredictionApi;
use epl_predictor::state::{MatchPrediction, Probabilities};

pub const MINUTE_MS: i64 = 60_000;
pub const NOW_MS: i64 = 1_760_000_000_000;

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.0
    }
}

pub fn prediction(home: &str, away: &str, probs: (f64, f64, f64)) -> MatchPrediction {
    MatchPrediction {
        home_team: home.to_string(),
        away_team: away.to_string(),
        probabilities: Probabilities {
            home: probs.0,
            draw: probs.1,
            away: probs.2,
        },
        date: None,
        model_label: None,
    }
}

/// Canned backend that counts calls. Clones share counters and responses.
#[derive(Clone, Default)]
pub struct StubApi {
    pub matchday_calls: Arc<AtomicUsize>,
    pub teams_calls: Arc<AtomicUsize>,
    pub custom_calls: Arc<AtomicUsize>,
    matchday: Arc<Mutex<Option<Vec<MatchPrediction>>>>,
    teams: Arc<Mutex<Option<Vec<String>>>>,
    custom: Arc<Mutex<Option<(f64, f64, f64)>>>,
}

impl StubApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_matchday(self, predictions: Vec<MatchPrediction>) -> Self {
        *self.matchday.lock().unwrap() = Some(predictions);
        self
    }

    pub fn with_teams(self, teams: &[&str]) -> Self {
        *self.teams.lock().unwrap() = Some(teams.iter().map(|t| t.to_string()).collect());
        self
    }

    pub fn with_custom(self, probs: (f64, f64, f64)) -> Self {
        *self.custom.lock().unwrap() = Some(probs);
        self
    }

    /// Makes every later call fail with a backend error.
    pub fn fail_all(&self) {
        *self.matchday.lock().unwrap() = None;
        *self.teams.lock().unwrap() = None;
        *self.custom.lock().unwrap() = None;
    }

    pub fn matchday_calls(&self) -> usize {
        self.matchday_calls.load(Ordering::SeqCst)
    }

    pub fn custom_calls(&self) -> usize {
        self.custom_calls.load(Ordering::SeqCst)
    }
}

fn backend_down(message: &str) -> FetchError {
    FetchError::Backend {
        status: 500,
        message: message.to_string(),
    }
}

impl PredictionApi for StubApi {
    fn current_matchday(&self) -> Result<Vec<MatchPrediction>, FetchError> {
        self.matchday_calls.fetch_add(1, Ordering::SeqCst);
        self.matchday
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| backend_down("Failed to fetch matches"))
    }

    fn teams(&self) -> Result<Vec<String>, FetchError> {
        self.teams_calls.fetch_add(1, Ordering::SeqCst);
        self.teams
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| backend_down("Failed to fetch teams"))
    }

    fn custom(&self, home_team: &str, away_team: &str) -> Result<MatchPrediction, FetchError> {
        self.custom_calls.fetch_add(1, Ordering::SeqCst);
        let probs = self
            .custom
            .lock()
            .unwrap()
            .ok_or_else(|| backend_down("Invalid team"))?;
        Ok(prediction(home_team, away_team, probs))
    }
}
