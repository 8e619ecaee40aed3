// Wrappers: pure environment combinators.
//
// A wrapper is itself an `Env`. Anything it needs to remember between steps
// travels inside its own state type next to the wrapped environment's state.

use crate::core::{Env, Info, InfoValue, Step};
use crate::spaces::AnySpace;
use crate::utils::rng::PrngKey;

/// State of [`RecordEpisodeStatistics`]: the inner state plus running counters.
#[derive(Clone, Debug, PartialEq)]
pub struct EpisodeStatsState<S> {
    pub env_state: S,
    pub episode_return: f64,
    pub episode_length: u32,
    /// Set after a terminal step. The next step is the inner environment's
    /// automatic reset and starts a new count instead of extending this one.
    pub awaiting_reset: bool,
}

impl<S> EpisodeStatsState<S> {
    fn fresh(env_state: S) -> Self {
        Self { env_state, episode_return: 0.0, episode_length: 0, awaiting_reset: false }
    }
}

/// RecordEpisodeStatistics tracks cumulative return and episode length.
/// On a terminal step it injects keys into the returned Step's Info:
/// - "episode_return": f64
/// - "episode_length": i64
#[derive(Clone, Debug, Default)]
pub struct RecordEpisodeStatistics<E: Env> {
    inner: E,
}

impl<E: Env> RecordEpisodeStatistics<E> {
    pub fn new(inner: E) -> Self { Self { inner } }

    pub fn inner(&self) -> &E { &self.inner }
    pub fn into_inner(self) -> E { self.inner }
}

impl<E: Env> Env for RecordEpisodeStatistics<E> {
    type Params = E::Params;
    type State = EpisodeStatsState<E::State>;
    type Obs = E::Obs;
    type Act = E::Act;

    fn default_params(&self) -> Self::Params { self.inner.default_params() }

    fn reset(&self, key: PrngKey, params: &Self::Params) -> (Self::Obs, Self::State) {
        let (obs, env_state) = self.inner.reset(key, params);
        (obs, EpisodeStatsState::fresh(env_state))
    }

    fn step(
        &self,
        key: PrngKey,
        params: &Self::Params,
        state: &Self::State,
        action: Self::Act,
    ) -> Step<Self::Obs, Self::State> {
        let s = self.inner.step(key, params, &state.env_state, action);
        if state.awaiting_reset {
            let next = EpisodeStatsState::fresh(s.state);
            return Step::new(s.observation, next, s.reward, s.done, s.info);
        }

        let episode_return = state.episode_return + f64::from(s.reward);
        let episode_length = state.episode_length + 1;
        let mut info = s.info;
        let next = if s.done {
            info.insert("episode_return", InfoValue::from(episode_return));
            info.insert("episode_length", InfoValue::from(episode_length));
            EpisodeStatsState { awaiting_reset: true, ..EpisodeStatsState::fresh(s.state) }
        } else {
            EpisodeStatsState { env_state: s.state, episode_return, episode_length, awaiting_reset: false }
        };
        Step::new(s.observation, next, s.reward, s.done, info)
    }

    fn observe(&self, state: &Self::State, params: &Self::Params) -> Self::Obs {
        self.inner.observe(&state.env_state, params)
    }

    fn is_truncated(&self, state: &Self::State, params: &Self::Params) -> bool {
        self.inner.is_truncated(&state.env_state, params)
    }

    fn action_space(&self, params: &Self::Params) -> AnySpace { self.inner.action_space(params) }
    fn observation_space(&self, params: &Self::Params) -> AnySpace { self.inner.observation_space(params) }
    fn state_space(&self, params: &Self::Params) -> AnySpace { self.inner.state_space(params) }
    fn name(&self) -> &'static str { self.inner.name() }
    fn num_actions(&self, params: &Self::Params) -> usize { self.inner.num_actions(params) }
}

/// Episode summary pulled out of a step's info, if the step closed an episode.
pub fn episode_summary(info: &Info) -> Option<(f64, i64)> {
    let ret = info.get("episode_return")?.as_f64()?;
    let len = info.get("episode_length")?.as_i64()?;
    Some((ret, len))
}
