mod support;

use epl_predictor::custom::CustomMatchup;
use epl_predictor::error::{PredictError, ValidationError};
use epl_predictor::state::CustomMatchupState;
use epl_predictor::store::{CUSTOM_SLOT, KvStore, MemoryStore};

use support::{StubApi, prediction};

fn slot(store: &MemoryStore) -> CustomMatchupState {
    serde_json::from_str(&store.raw(CUSTOM_SLOT).expect("slot written")).expect("slot parses")
}

#[test]
fn selecting_a_team_clears_prediction_and_persists() {
    let store = MemoryStore::new();
    let api = StubApi::new().with_custom((0.5, 0.3, 0.2));
    let mut custom = CustomMatchup::new(store.clone(), api);

    custom.select_home("Arsenal");
    custom.select_away("Chelsea");
    custom.predict().expect("prediction");
    assert!(slot(&store).prediction.is_some());

    custom.select_away("Everton");

    assert!(custom.state().prediction.is_none());
    let persisted = slot(&store);
    assert_eq!(persisted.home_team.as_deref(), Some("Arsenal"));
    assert_eq!(persisted.away_team.as_deref(), Some("Everton"));
    assert!(persisted.prediction.is_none());
}

#[test]
fn reselecting_same_home_is_idempotent() {
    let store = MemoryStore::new();
    let mut custom = CustomMatchup::new(store.clone(), StubApi::new());

    custom.select_home("Arsenal");
    let first = store.raw(CUSTOM_SLOT).unwrap();
    assert!(custom.state().prediction.is_none());

    custom.select_home("Arsenal");
    assert!(custom.state().prediction.is_none());
    assert_eq!(store.raw(CUSTOM_SLOT).unwrap(), first);
}

#[test]
fn swap_exchanges_teams_and_clears_prediction() {
    let store = MemoryStore::new();
    let api = StubApi::new().with_custom((0.5, 0.3, 0.2));
    let mut custom = CustomMatchup::new(store.clone(), api);
    custom.select_home("Arsenal");
    custom.select_away("Chelsea");
    custom.predict().expect("prediction");

    custom.swap();

    let persisted = slot(&store);
    assert_eq!(persisted.home_team.as_deref(), Some("Chelsea"));
    assert_eq!(persisted.away_team.as_deref(), Some("Arsenal"));
    assert!(persisted.prediction.is_none());
    assert_eq!(custom.state(), &persisted);
}

#[test]
fn predict_requires_both_teams() {
    let api = StubApi::new().with_custom((0.5, 0.3, 0.2));
    let mut custom = CustomMatchup::new(MemoryStore::new(), api.clone());
    custom.select_home("Arsenal");

    let err = custom.predict().unwrap_err();

    assert!(matches!(
        err,
        PredictError::Validation(ValidationError::MissingTeam)
    ));
    assert_eq!(api.custom_calls(), 0);
}

#[test]
fn predict_rejects_identical_teams_without_network() {
    let api = StubApi::new().with_custom((0.5, 0.3, 0.2));
    let mut custom = CustomMatchup::new(MemoryStore::new(), api.clone());
    custom.select_home("Arsenal");
    custom.select_away("Arsenal");

    let err = custom.predict().unwrap_err();

    assert!(matches!(
        err,
        PredictError::Validation(ValidationError::IdenticalTeams)
    ));
    assert_eq!(api.custom_calls(), 0);
}

#[test]
fn validate_matches_predict_preconditions() {
    let mut custom = CustomMatchup::new(MemoryStore::new(), StubApi::new());
    assert_eq!(custom.validate(), Err(ValidationError::MissingTeam));

    custom.select_home("Arsenal");
    custom.select_away("Arsenal");
    assert_eq!(custom.validate(), Err(ValidationError::IdenticalTeams));

    custom.select_away("Chelsea");
    assert_eq!(
        custom.validate(),
        Ok(("Arsenal".to_string(), "Chelsea".to_string()))
    );
}

#[test]
fn successful_predict_persists_full_state() {
    let store = MemoryStore::new();
    let api = StubApi::new().with_custom((0.2, 0.3, 0.5));
    let mut custom = CustomMatchup::new(store.clone(), api.clone());
    custom.select_home("Wolves");
    custom.select_away("Spurs");

    let result = custom.predict().expect("prediction");

    assert_eq!(api.custom_calls(), 1);
    assert_eq!(result, prediction("Wolves", "Spurs", (0.2, 0.3, 0.5)));
    assert_eq!(slot(&store).prediction, Some(result));
}

#[test]
fn failed_predict_leaves_no_prediction_in_memory() {
    let store = MemoryStore::new();
    let api = StubApi::new().with_custom((0.5, 0.3, 0.2));
    let mut custom = CustomMatchup::new(store.clone(), api.clone());
    custom.select_home("Arsenal");
    custom.select_away("Chelsea");
    custom.predict().expect("first prediction");

    api.fail_all();
    let err = custom.predict().unwrap_err();

    assert_eq!(err.to_string(), "Invalid team");
    assert!(custom.state().prediction.is_none());
}

#[test]
fn persisted_state_restores_field_for_field() {
    let store = MemoryStore::new();
    let api = StubApi::new().with_custom((0.45, 0.3, 0.25));
    let mut writer = CustomMatchup::new(store.clone(), api.clone());
    writer.select_home("Newcastle");
    writer.select_away("Brighton");
    writer.predict().expect("prediction");

    let mut reader = CustomMatchup::new(store, api);
    let restored = reader.restore().clone();

    assert_eq!(&restored, writer.state());
}

#[test]
fn missing_or_corrupt_slot_restores_empty() {
    let store = MemoryStore::new();
    let mut custom = CustomMatchup::new(store.clone(), StubApi::new());
    assert_eq!(custom.restore(), &CustomMatchupState::default());

    store.set(CUSTOM_SLOT, "not json at all").unwrap();
    assert_eq!(custom.restore(), &CustomMatchupState::default());
}

#[test]
fn browser_written_slot_restores() {
    let store = MemoryStore::new();
    store
        .set(
            CUSTOM_SLOT,
            r#"{"homeTeam":"Arsenal FC","awayTeam":"","prediction":null}"#,
        )
        .unwrap();
    let mut custom = CustomMatchup::new(store, StubApi::new());

    let restored = custom.restore();
    assert_eq!(restored.home_team.as_deref(), Some("Arsenal FC"));
    assert_eq!(restored.away_team, None);
    assert!(restored.prediction.is_none());
}

#[test]
fn team_list_failure_degrades_to_empty() {
    let custom = CustomMatchup::new(MemoryStore::new(), StubApi::new());
    assert!(custom.list_teams().is_empty());

    let custom = CustomMatchup::new(
        MemoryStore::new(),
        StubApi::new().with_teams(&["Arsenal", "Chelsea"]),
    );
    assert_eq!(custom.list_teams(), vec!["Arsenal", "Chelsea"]);
}
