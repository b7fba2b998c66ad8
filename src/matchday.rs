use chrono::Utc;

use crate::error::FetchError;
use crate::predict_api::PredictionApi;
use crate::state::{CachedMatchdayEntry, MatchPrediction};
use crate::store::{KvStore, MATCHDAY_SLOT, read_slot, write_slot};

pub const MATCHDAY_TTL_MS: i64 = 30 * 60 * 1000;

pub trait Clock {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Serves the current matchday from its slot while fresh, otherwise from the API.
pub struct MatchdayCache<S, A, C = SystemClock> {
    store: S,
    api: A,
    clock: C,
    last_updated: Option<i64>,
}

impl<S: KvStore, A: PredictionApi, C: Clock> MatchdayCache<S, A, C> {
    pub fn new(store: S, api: A, clock: C) -> Self {
        Self {
            store,
            api,
            clock,
            last_updated: None,
        }
    }

    pub fn last_updated(&self) -> Option<i64> {
        self.last_updated
    }

    /// Whatever is cached, stale or not. Never touches the network.
    ///
    /// Models a fresh view mount, so `last_updated` follows the slot (cleared when empty).
    pub fn peek(&mut self) -> Option<Vec<MatchPrediction>> {
        let Some(entry) = self.read_entry() else {
            self.last_updated = None;
            return None;
        };
        tracing::info!(count = entry.predictions.len(), "loaded cached matchday predictions");
        self.last_updated = Some(entry.timestamp);
        Some(entry.predictions)
    }

    pub fn load(&mut self, force_refresh: bool) -> Result<Vec<MatchPrediction>, FetchError> {
        if !force_refresh {
            if let Some(entry) = self.read_entry() {
                // An age that overflows i64 is a nonsense timestamp; treat as a miss.
                let age = self.clock.now_ms().checked_sub(entry.timestamp);
                if let Some(age) = age.filter(|age| *age < MATCHDAY_TTL_MS) {
                    tracing::info!(
                        minutes = age / 60_000,
                        "using cached matchday predictions"
                    );
                    self.last_updated = Some(entry.timestamp);
                    return Ok(entry.predictions);
                }
            }
        }

        let predictions = self.api.current_matchday()?;
        let timestamp = self.clock.now_ms();
        let entry = CachedMatchdayEntry {
            predictions,
            timestamp,
        };
        if let Err(err) = write_slot(&self.store, MATCHDAY_SLOT, &entry) {
            tracing::warn!("failed to persist matchday predictions: {err:#}");
        } else {
            tracing::info!(count = entry.predictions.len(), "fetched and cached matchday predictions");
        }
        self.last_updated = Some(timestamp);
        Ok(entry.predictions)
    }

    fn read_entry(&self) -> Option<CachedMatchdayEntry> {
        match read_slot::<CachedMatchdayEntry>(&self.store, MATCHDAY_SLOT) {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!("ignoring matchday cache: {err}");
                None
            }
        }
    }
}

/// "just now", "1 minute ago" or "N minutes ago", rounded to the nearest minute.
pub fn format_age(now_ms: i64, updated_ms: i64) -> String {
    let minutes = (now_ms.saturating_sub(updated_ms) as f64 / 60_000.0).round() as i64;
    if minutes < 1 {
        "just now".to_string()
    } else if minutes == 1 {
        "1 minute ago".to_string()
    } else {
        format!("{minutes} minutes ago")
    }
}
