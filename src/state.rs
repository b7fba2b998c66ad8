use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::matchday::format_age;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Probabilities {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchPrediction {
    pub home_team: String,
    pub away_team: String,
    pub probabilities: Probabilities,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    // Label the backend model picked; passed through untouched.
    #[serde(
        default,
        rename = "prediction",
        skip_serializing_if = "Option::is_none"
    )]
    pub model_label: Option<String>,
}

/// Matchday slot payload. Always replaced wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedMatchdayEntry {
    pub predictions: Vec<MatchPrediction>,
    pub timestamp: i64,
}

/// Custom matchup slot payload.
///
/// `prediction` is cleared whenever either team changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomMatchupState {
    #[serde(default)]
    pub home_team: Option<String>,
    #[serde(default)]
    pub away_team: Option<String>,
    #[serde(default)]
    pub prediction: Option<MatchPrediction>,
}

impl CustomMatchupState {
    /// Browser-era slots store unset teams as `""`.
    pub(crate) fn normalized(mut self) -> Self {
        self.home_team = self.home_team.filter(|t| !t.is_empty());
        self.away_team = self.away_team.filter(|t| !t.is_empty());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Matchday,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamSide {
    Home,
    Away,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub help_overlay: bool,
    pub confirm_clear: bool,

    pub matchday: Vec<MatchPrediction>,
    pub matchday_updated_at: Option<i64>,
    pub matchday_loading: bool,
    pub matchday_error: Option<String>,
    pub matchday_selected: usize,

    pub teams: Vec<String>,
    pub custom: CustomMatchupState,
    pub custom_focus: TeamSide,
    pub custom_loading: bool,
    pub custom_error: Option<String>,

    pub logs: VecDeque<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            screen: Screen::Matchday,
            help_overlay: false,
            confirm_clear: false,
            matchday: Vec::new(),
            matchday_updated_at: None,
            matchday_loading: false,
            matchday_error: None,
            matchday_selected: 0,
            teams: Vec::new(),
            custom: CustomMatchupState::default(),
            custom_focus: TeamSide::Home,
            custom_loading: false,
            custom_error: None,
            logs: VecDeque::new(),
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn toggle_screen(&mut self) {
        self.screen = match self.screen {
            Screen::Matchday => Screen::Custom,
            Screen::Custom => Screen::Matchday,
        };
    }

    pub fn select_next(&mut self) {
        if self.matchday.is_empty() {
            self.matchday_selected = 0;
            return;
        }
        self.matchday_selected = (self.matchday_selected + 1).min(self.matchday.len() - 1);
    }

    pub fn select_prev(&mut self) {
        self.matchday_selected = self.matchday_selected.saturating_sub(1);
    }

    pub fn toggle_focus(&mut self) {
        self.custom_focus = match self.custom_focus {
            TeamSide::Home => TeamSide::Away,
            TeamSide::Away => TeamSide::Home,
        };
    }

    pub fn focused_team(&self) -> Option<&str> {
        match self.custom_focus {
            TeamSide::Home => self.custom.home_team.as_deref(),
            TeamSide::Away => self.custom.away_team.as_deref(),
        }
    }

    /// Team `step` places away from the focused selector's current pick.
    ///
    /// An unset selector starts from the top (forward) or bottom (backward) of the roster.
    pub fn cycle_team(&self, step: isize) -> Option<String> {
        if self.teams.is_empty() {
            return None;
        }
        let len = self.teams.len() as isize;
        let current = self
            .focused_team()
            .and_then(|team| self.teams.iter().position(|t| t == team));
        let next = match current {
            Some(idx) => (idx as isize + step).rem_euclid(len),
            None if step >= 0 => 0,
            None => len - 1,
        };
        self.teams.get(next as usize).cloned()
    }

    pub fn updated_label(&self, now_ms: i64) -> Option<String> {
        self.matchday_updated_at
            .map(|ts| format!("Updated {}", format_age(now_ms, ts)))
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    SetMatchday {
        predictions: Vec<MatchPrediction>,
        updated_at: Option<i64>,
    },
    MatchdayLoading,
    MatchdayFailed(String),
    SetTeams(Vec<String>),
    SetCustom(CustomMatchupState),
    CustomLoading,
    CustomFailed(String),
    Log(String),
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    LoadMatchday { force_refresh: bool },
    SelectHome(String),
    SelectAway(String),
    Swap,
    Predict,
    ClearCache,
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetMatchday {
            predictions,
            updated_at,
        } => {
            state.matchday = predictions;
            state.matchday_updated_at = updated_at;
            state.matchday_loading = false;
            state.matchday_error = None;
            if state.matchday_selected >= state.matchday.len() {
                state.matchday_selected = state.matchday.len().saturating_sub(1);
            }
        }
        Delta::MatchdayLoading => {
            state.matchday_loading = true;
            state.matchday_error = None;
        }
        Delta::MatchdayFailed(msg) => {
            state.matchday_loading = false;
            state.push_log(format!("[WARN] Matchday fetch failed: {msg}"));
            state.matchday_error = Some(msg);
        }
        Delta::SetTeams(teams) => {
            state.push_log(format!("[INFO] Loaded {} teams", teams.len()));
            state.teams = teams;
        }
        Delta::SetCustom(custom) => {
            state.custom = custom;
            state.custom_loading = false;
            state.custom_error = None;
        }
        Delta::CustomLoading => {
            state.custom_loading = true;
            state.custom_error = None;
            state.custom.prediction = None;
        }
        Delta::CustomFailed(msg) => {
            state.custom_loading = false;
            state.push_log(format!("[WARN] Custom prediction failed: {msg}"));
            state.custom_error = Some(msg);
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}
