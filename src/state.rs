//! Application state: in-memory session store, mission catalog and the
//! content provider.
//!
//! This module owns:
//!   - the session store (by session id), guarded by a single RwLock
//!   - the mission catalog every new/restarted game starts from
//!   - the content provider (OpenAI when configured, built-in seed bank otherwise)
//!   - the celebration fallback text
//!
//! All session mutations take the write lock and finish before releasing it.
//! Provider calls never run while the lock is held.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::catalog::MissionCatalog;
use crate::config::{load_agent_config_from_env, AgentConfig};
use crate::domain::{OperationChoice, Question, Riddle, StoryQuest};
use crate::error::GameError;
use crate::game::{GameState, RequestToken};
use crate::openai::OpenAI;
use crate::provider::ContentProvider;
use crate::seeds::SeedBank;

/// Content of an open challenge, by mission kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChallengeContent {
    Riddle(Riddle),
    /// Story and boss missions.
    Story(StoryQuest),
    /// Arithmetic missions; replaced after every wrong answer.
    Drill(Question),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveChallenge {
    pub token: RequestToken,
    pub content: Option<ChallengeContent>,
}

/// One player's ephemeral game.
#[derive(Clone, Debug)]
pub struct Session {
    pub id: Uuid,
    pub game: GameState,
    pub challenge: Option<ActiveChallenge>,
    pub celebration: Option<String>,
    pub operation: OperationChoice,
    /// Bumped on restart so late celebration text from a previous run is dropped.
    pub run: u64,
    /// Last time any operation touched this session; drives idle eviction.
    pub last_active: Instant,
}

impl Session {
    pub fn new(catalog: &MissionCatalog) -> Self {
        Self {
            id: Uuid::new_v4(),
            game: GameState::new(catalog),
            challenge: None,
            celebration: None,
            operation: OperationChoice::default(),
            run: 0,
            last_active: Instant::now(),
        }
    }

    /// Back to catalog defaults. Keeps id and operation filter.
    pub fn restart(&mut self, catalog: &MissionCatalog) {
        self.game = GameState::new(catalog);
        self.challenge = None;
        self.celebration = None;
        self.run += 1;
    }
}

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
    pub catalog: MissionCatalog,
    pub provider: Arc<dyn ContentProvider>,
    pub celebration_fallback: String,
    /// Sessions idle for longer than this are evicted when new ones are created.
    pub session_ttl: Duration,
}

impl AppState {
    /// Build state from env: load config, pick the catalog, init the provider.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_agent_config_from_env().unwrap_or_default();
        let catalog = MissionCatalog::from_config(Some(cfg.missions.as_slice()));

        let provider: Arc<dyn ContentProvider> = match OpenAI::from_env(cfg.prompts.clone()) {
            Some(oa) => {
                info!(target: "math_galaxy", base_url = %oa.base_url, fast_model = %oa.fast_model, strong_model = %oa.strong_model, "OpenAI enabled.");
                Arc::new(oa)
            }
            None => {
                info!(target: "math_galaxy", "OpenAI disabled (no OPENAI_API_KEY). Using built-in seed content.");
                Arc::new(SeedBank)
            }
        };

        info!(target: "game", missions = catalog.len(), provider = provider.name(), "Startup campaign ready");
        Self::with_parts(catalog, provider, &cfg)
    }

    pub fn with_parts(catalog: MissionCatalog, provider: Arc<dyn ContentProvider>, cfg: &AgentConfig) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            catalog,
            provider,
            celebration_fallback: cfg.celebration_fallback(),
            session_ttl: cfg.session_ttl(),
        }
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn create_session(&self) -> Session {
        let session = Session::new(&self.catalog);
        let mut sessions = self.sessions.write().await;
        let evicted = evict_idle(&mut sessions, self.session_ttl, session.last_active);
        if evicted > 0 {
            debug!(target: "game", evicted, remaining = sessions.len(), "Evicted idle sessions");
        }
        sessions.insert(session.id, session.clone());
        session
    }

    /// Snapshot of a session.
    pub async fn get_session(&self, id: Uuid) -> Result<Session, GameError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| GameError::UnknownSession(id.to_string()))
    }

    /// Run `f` against the session under the write lock. `f` must not block.
    pub async fn with_session<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut Session) -> Result<T, GameError>,
    ) -> Result<T, GameError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| GameError::UnknownSession(id.to_string()))?;
        session.last_active = Instant::now();
        f(session)
    }
}

/// Drop sessions untouched for longer than `ttl` as of `now`. Returns how many went.
fn evict_idle(sessions: &mut HashMap<Uuid, Session>, ttl: Duration, now: Instant) -> usize {
    let before = sessions.len();
    sessions.retain(|_, s| now.saturating_duration_since(s.last_active) <= ttl);
    before - sessions.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Phase;

    fn offline() -> AppState {
        AppState::with_parts(MissionCatalog::default(), Arc::new(SeedBank), &AgentConfig::default())
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let state = offline();
        let a = state.create_session().await;
        let b = state.create_session().await;
        state
            .with_session(a.id, |s| {
                s.game = s.game.apply(crate::game::GameEvent::SelectMission(1))?;
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(state.get_session(a.id).await.unwrap().game.phase, Phase::Challenge);
        assert_eq!(state.get_session(b.id).await.unwrap().game.phase, Phase::Map);
    }

    #[tokio::test]
    async fn unknown_session_is_reported() {
        let state = offline();
        let err = state.get_session(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, GameError::UnknownSession(_)));
    }

    #[tokio::test]
    async fn idle_sessions_are_evicted_on_create() {
        let mut state = offline();
        state.session_ttl = Duration::from_secs(1);
        let stale = state.create_session().await;
        let active = state.create_session().await;
        {
            let mut sessions = state.sessions.write().await;
            let s = sessions.get_mut(&stale.id).unwrap();
            s.last_active = Instant::now().checked_sub(Duration::from_secs(2)).unwrap();
        }

        let fresh = state.create_session().await;
        assert!(matches!(state.get_session(stale.id).await, Err(GameError::UnknownSession(_))));
        assert!(state.get_session(active.id).await.is_ok());
        assert!(state.get_session(fresh.id).await.is_ok());
    }

    #[test]
    fn eviction_keeps_recently_touched_sessions() {
        let catalog = MissionCatalog::default();
        let old = Session::new(&catalog);
        let mut recent = Session::new(&catalog);
        let now = old.last_active + Duration::from_secs(400);
        recent.last_active = now - Duration::from_secs(30);
        let mut map: HashMap<Uuid, Session> = [(old.id, old), (recent.id, recent.clone())].into();

        assert_eq!(evict_idle(&mut map, Duration::from_secs(300), now), 1);
        assert!(map.contains_key(&recent.id));
    }

    #[test]
    fn restart_resets_game_and_bumps_run() {
        let catalog = MissionCatalog::default();
        let mut s = Session::new(&catalog);
        s.operation = OperationChoice::Division;
        s.celebration = Some("yay".into());
        s.game.score = 300;
        s.restart(&catalog);
        assert_eq!(s.game, GameState::new(&catalog));
        assert_eq!(s.run, 1);
        assert!(s.celebration.is_none());
        assert_eq!(s.operation, OperationChoice::Division);
    }
}
