use crate::error::{PredictError, ValidationError};
use crate::predict_api::PredictionApi;
use crate::state::{CustomMatchupState, MatchPrediction};
use crate::store::{CUSTOM_SLOT, KvStore, read_slot, write_slot};

/// Owns the selected pair and its last prediction. Every change is persisted at once.
pub struct CustomMatchup<S, A> {
    store: S,
    api: A,
    state: CustomMatchupState,
}

impl<S: KvStore, A: PredictionApi> CustomMatchup<S, A> {
    pub fn new(store: S, api: A) -> Self {
        Self {
            store,
            api,
            state: CustomMatchupState::default(),
        }
    }

    pub fn state(&self) -> &CustomMatchupState {
        &self.state
    }

    /// Loads the persisted slot. Missing or corrupt data yields an empty selection.
    pub fn restore(&mut self) -> &CustomMatchupState {
        self.state = match read_slot::<CustomMatchupState>(&self.store, CUSTOM_SLOT) {
            Ok(Some(state)) => {
                tracing::info!("loaded previous custom prediction from cache");
                state.normalized()
            }
            Ok(None) => CustomMatchupState::default(),
            Err(err) => {
                tracing::warn!("ignoring custom prediction cache: {err}");
                CustomMatchupState::default()
            }
        };
        &self.state
    }

    pub fn select_home(&mut self, team: impl Into<String>) {
        self.state.home_team = non_empty(team.into());
        self.state.prediction = None;
        self.persist();
    }

    pub fn select_away(&mut self, team: impl Into<String>) {
        self.state.away_team = non_empty(team.into());
        self.state.prediction = None;
        self.persist();
    }

    pub fn swap(&mut self) {
        let state = &mut self.state;
        std::mem::swap(&mut state.home_team, &mut state.away_team);
        state.prediction = None;
        self.persist();
    }

    /// The selected pair, if it can be sent to the API.
    pub fn validate(&self) -> Result<(String, String), ValidationError> {
        let (Some(home), Some(away)) = (&self.state.home_team, &self.state.away_team) else {
            return Err(ValidationError::MissingTeam);
        };
        if home == away {
            return Err(ValidationError::IdenticalTeams);
        }
        Ok((home.clone(), away.clone()))
    }

    pub fn predict(&mut self) -> Result<MatchPrediction, PredictError> {
        let (home, away) = self.validate()?;

        self.state.prediction = None;
        let prediction = self.api.custom(&home, &away)?;
        self.state.prediction = Some(prediction.clone());
        self.persist();
        tracing::info!(%home, %away, "saved custom prediction to cache");
        Ok(prediction)
    }

    /// Team roster straight from the API. Failures degrade to an empty list.
    pub fn list_teams(&self) -> Vec<String> {
        match self.api.teams() {
            Ok(teams) => teams,
            Err(err) => {
                tracing::warn!("failed to fetch teams: {err}");
                Vec::new()
            }
        }
    }

    fn persist(&self) {
        if let Err(err) = write_slot(&self.store, CUSTOM_SLOT, &self.state) {
            tracing::warn!("failed to persist custom prediction: {err:#}");
        }
    }
}

fn non_empty(team: String) -> Option<String> {
    if team.trim().is_empty() {
        None
    } else {
        Some(team)
    }
}
