use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use crate::custom::CustomMatchup;
use crate::matchday::{Clock, MatchdayCache};
use crate::predict_api::PredictionApi;
use crate::state::{Delta, ProviderCommand};
use crate::store::{KvStore, clear_prediction_slots};

/// Owns both controllers on one worker thread and serves commands in arrival order.
pub struct Provider<S, A, C> {
    store: S,
    matchday: MatchdayCache<S, A, C>,
    custom: CustomMatchup<S, A>,
}

impl<S, A, C> Provider<S, A, C>
where
    S: KvStore + Clone,
    A: PredictionApi + Clone,
    C: Clock,
{
    pub fn new(store: S, api: A, clock: C) -> Self {
        Self {
            matchday: MatchdayCache::new(store.clone(), api.clone(), clock),
            custom: CustomMatchup::new(store.clone(), api),
            store,
        }
    }

    /// Startup projection: cached matchday (no TTL check), roster and restored matchup.
    pub fn bootstrap(&mut self, tx: &Sender<Delta>) {
        self.reload_cached(tx);
        let teams = self.custom.list_teams();
        if teams.is_empty() {
            let _ = tx.send(Delta::Log(
                "[WARN] Team list unavailable; selectors are empty".to_string(),
            ));
        }
        let _ = tx.send(Delta::SetTeams(teams));
    }

    pub fn handle(&mut self, cmd: ProviderCommand, tx: &Sender<Delta>) {
        match cmd {
            ProviderCommand::LoadMatchday { force_refresh } => {
                let _ = tx.send(Delta::MatchdayLoading);
                match self.matchday.load(force_refresh) {
                    Ok(predictions) => {
                        let _ = tx.send(Delta::Log(format!(
                            "[INFO] Matchday ready ({} predictions)",
                            predictions.len()
                        )));
                        let _ = tx.send(Delta::SetMatchday {
                            predictions,
                            updated_at: self.matchday.last_updated(),
                        });
                    }
                    Err(err) => {
                        let _ = tx.send(Delta::MatchdayFailed(err.to_string()));
                    }
                }
            }
            ProviderCommand::SelectHome(team) => {
                self.custom.select_home(team);
                self.send_custom(tx);
            }
            ProviderCommand::SelectAway(team) => {
                self.custom.select_away(team);
                self.send_custom(tx);
            }
            ProviderCommand::Swap => {
                self.custom.swap();
                self.send_custom(tx);
            }
            ProviderCommand::Predict => self.predict(tx),
            ProviderCommand::ClearCache => {
                match clear_prediction_slots(&self.store) {
                    Ok(()) => {
                        let _ = tx.send(Delta::Log("[INFO] Cache cleared".to_string()));
                    }
                    Err(err) => {
                        let _ = tx.send(Delta::Log(format!("[WARN] Cache clear failed: {err:#}")));
                    }
                }
                self.reload_cached(tx);
            }
        }
    }

    fn predict(&mut self, tx: &Sender<Delta>) {
        if self.custom.validate().is_ok() {
            let _ = tx.send(Delta::CustomLoading);
        }
        match self.custom.predict() {
            Ok(_) => self.send_custom(tx),
            Err(err) => {
                let _ = tx.send(Delta::CustomFailed(err.to_string()));
            }
        }
    }

    /// Re-reads both slots, as a fresh view mount would.
    fn reload_cached(&mut self, tx: &Sender<Delta>) {
        let predictions = self.matchday.peek().unwrap_or_default();
        let _ = tx.send(Delta::SetMatchday {
            predictions,
            updated_at: self.matchday.last_updated(),
        });
        let custom = self.custom.restore().clone();
        let _ = tx.send(Delta::SetCustom(custom));
    }

    fn send_custom(&self, tx: &Sender<Delta>) {
        let _ = tx.send(Delta::SetCustom(self.custom.state().clone()));
    }
}

pub fn spawn_provider<S, A, C>(
    store: S,
    api: A,
    clock: C,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
) -> thread::JoinHandle<()>
where
    S: KvStore + Clone + Send + 'static,
    A: PredictionApi + Clone + Send + 'static,
    C: Clock + Send + 'static,
{
    thread::spawn(move || {
        let mut provider = Provider::new(store, api, clock);
        provider.bootstrap(&tx);
        while let Ok(cmd) = cmd_rx.recv() {
            provider.handle(cmd, &tx);
        }
    })
}
