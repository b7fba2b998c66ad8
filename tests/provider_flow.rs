mod support;

use std::sync::mpsc;

use epl_predictor::provider::Provider;
use epl_predictor::state::{AppState, Delta, ProviderCommand, apply_delta};
use epl_predictor::store::{CUSTOM_SLOT, MATCHDAY_SLOT, MemoryStore};

use support::{FixedClock, NOW_MS, StubApi, prediction};

fn drain(rx: &mpsc::Receiver<Delta>, state: &mut AppState) {
    while let Ok(delta) = rx.try_recv() {
        apply_delta(state, delta);
    }
}

fn api() -> StubApi {
    StubApi::new()
        .with_matchday(vec![prediction("Arsenal", "Chelsea", (0.6, 0.2, 0.2))])
        .with_teams(&["Arsenal", "Chelsea", "Everton"])
        .with_custom((0.5, 0.3, 0.2))
}

#[test]
fn bootstrap_projects_cache_and_roster_without_fetching_matchday() {
    let api = api();
    let (tx, rx) = mpsc::channel();
    let mut provider = Provider::new(MemoryStore::new(), api.clone(), FixedClock(NOW_MS));
    let mut state = AppState::new();

    provider.bootstrap(&tx);
    drain(&rx, &mut state);

    assert_eq!(api.matchday_calls(), 0);
    assert!(state.matchday.is_empty());
    assert_eq!(state.matchday_updated_at, None);
    assert_eq!(state.teams.len(), 3);
}

#[test]
fn commands_flow_back_into_view_state() {
    let api = api();
    let (tx, rx) = mpsc::channel();
    let mut provider = Provider::new(MemoryStore::new(), api.clone(), FixedClock(NOW_MS));
    let mut state = AppState::new();

    provider.handle(ProviderCommand::LoadMatchday { force_refresh: false }, &tx);
    provider.handle(ProviderCommand::SelectHome("Arsenal".into()), &tx);
    provider.handle(ProviderCommand::SelectAway("Everton".into()), &tx);
    provider.handle(ProviderCommand::Predict, &tx);
    drain(&rx, &mut state);

    assert_eq!(state.matchday.len(), 1);
    assert_eq!(state.matchday_updated_at, Some(NOW_MS));
    assert!(!state.matchday_loading);
    assert_eq!(state.custom.home_team.as_deref(), Some("Arsenal"));
    assert_eq!(state.custom.away_team.as_deref(), Some("Everton"));
    assert!(state.custom.prediction.is_some());
    assert!(!state.custom_loading);

    provider.handle(ProviderCommand::Swap, &tx);
    drain(&rx, &mut state);
    assert_eq!(state.custom.home_team.as_deref(), Some("Everton"));
    assert!(state.custom.prediction.is_none());
}

#[test]
fn validation_error_is_surfaced_without_loading() {
    let api = api();
    let (tx, rx) = mpsc::channel();
    let mut provider = Provider::new(MemoryStore::new(), api.clone(), FixedClock(NOW_MS));
    let mut state = AppState::new();

    provider.handle(ProviderCommand::Predict, &tx);
    drain(&rx, &mut state);

    assert_eq!(state.custom_error.as_deref(), Some("Please select both teams"));
    assert!(!state.custom_loading);
    assert_eq!(api.custom_calls(), 0);
}

#[test]
fn matchday_failure_keeps_shown_predictions() {
    let api = api();
    let (tx, rx) = mpsc::channel();
    let mut provider = Provider::new(MemoryStore::new(), api.clone(), FixedClock(NOW_MS));
    let mut state = AppState::new();

    provider.handle(ProviderCommand::LoadMatchday { force_refresh: true }, &tx);
    api.fail_all();
    provider.handle(ProviderCommand::LoadMatchday { force_refresh: true }, &tx);
    drain(&rx, &mut state);

    assert_eq!(state.matchday.len(), 1);
    assert_eq!(state.matchday_error.as_deref(), Some("Failed to fetch matches"));
    assert!(!state.matchday_loading);
}

#[test]
fn clear_cache_empties_both_slots_and_reloads_view() {
    let store = MemoryStore::new();
    let api = api();
    let (tx, rx) = mpsc::channel();
    let mut provider = Provider::new(store.clone(), api, FixedClock(NOW_MS));
    let mut state = AppState::new();

    provider.handle(ProviderCommand::LoadMatchday { force_refresh: false }, &tx);
    provider.handle(ProviderCommand::SelectHome("Arsenal".into()), &tx);
    assert!(store.raw(MATCHDAY_SLOT).is_some());
    assert!(store.raw(CUSTOM_SLOT).is_some());

    provider.handle(ProviderCommand::ClearCache, &tx);
    drain(&rx, &mut state);

    assert!(store.raw(MATCHDAY_SLOT).is_none());
    assert!(store.raw(CUSTOM_SLOT).is_none());
    assert!(state.matchday.is_empty());
    assert_eq!(state.matchday_updated_at, None);
    assert_eq!(state.custom.home_team, None);
}

#[test]
fn identical_teams_never_enter_loading() {
    let api = api();
    let (tx, rx) = mpsc::channel();
    let mut provider = Provider::new(MemoryStore::new(), api.clone(), FixedClock(NOW_MS));

    provider.handle(ProviderCommand::SelectHome("Chelsea".into()), &tx);
    provider.handle(ProviderCommand::SelectAway("Chelsea".into()), &tx);
    provider.handle(ProviderCommand::Predict, &tx);

    let deltas: Vec<Delta> = rx.try_iter().collect();
    assert!(!deltas.iter().any(|d| matches!(d, Delta::CustomLoading)));
    assert!(deltas.iter().any(
        |d| matches!(d, Delta::CustomFailed(msg) if msg == "Please select different teams")
    ));
    assert_eq!(api.custom_calls(), 0);
}
