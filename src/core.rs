// Core traits and types: the pure environment contract.

use crate::spaces::AnySpace;
use crate::utils::rng::PrngKey;

/// A small ordered info map returned alongside every transition.
/// Environments that have nothing to report return it empty.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Info {
    entries: Vec<(String, InfoValue)>,
}

impl Info {
    /// Create an empty Info map.
    pub fn new() -> Self { Self { entries: Vec::new() } }

    /// Insert or replace a key with the given value.
    pub fn insert<K: Into<String>>(&mut self, key: K, value: InfoValue) {
        let k = key.into();
        if let Some((_, v)) = self.entries.iter_mut().find(|(kk, _)| kk == &k) {
            *v = value;
        } else {
            self.entries.push((k, value));
        }
    }

    /// Get a reference to a value by key.
    pub fn get(&self, key: &str) -> Option<&InfoValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Iterate over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &InfoValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn len(&self) -> usize { self.entries.len() }
}

/// Value types carried in an [`Info`] map.
#[derive(Clone, Debug, PartialEq)]
pub enum InfoValue {
    Bool(bool),
    I64(i64),
    F64(f64),
    Str(String),
}

impl InfoValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self { InfoValue::Bool(b) => Some(*b), _ => None }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self { InfoValue::I64(v) => Some(*v), _ => None }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self { InfoValue::F64(v) => Some(*v), _ => None }
    }
}

impl From<bool> for InfoValue { fn from(v: bool) -> Self { InfoValue::Bool(v) } }
impl From<i64> for InfoValue { fn from(v: i64) -> Self { InfoValue::I64(v) } }
impl From<i32> for InfoValue { fn from(v: i32) -> Self { InfoValue::I64(v as i64) } }
impl From<u32> for InfoValue { fn from(v: u32) -> Self { InfoValue::I64(v as i64) } }
impl From<f64> for InfoValue { fn from(v: f64) -> Self { InfoValue::F64(v) } }
impl From<f32> for InfoValue { fn from(v: f32) -> Self { InfoValue::F64(v as f64) } }
impl From<&str> for InfoValue { fn from(v: &str) -> Self { InfoValue::Str(v.to_string()) } }
impl From<String> for InfoValue { fn from(v: String) -> Self { InfoValue::Str(v) } }

/// One transition produced by [`Env::step`]. The caller owns every field;
/// `state` is the value to feed into the next `step`.
#[derive(Clone, Debug, PartialEq)]
pub struct Step<Obs, State> {
    pub observation: Obs,
    pub state: State,
    pub reward: f32,
    pub done: bool,
    pub info: Info,
}

impl<Obs, State> Step<Obs, State> {
    pub fn new(observation: Obs, state: State, reward: f32, done: bool, info: Info) -> Self {
        Self { observation, state, reward, done, info }
    }
}

/// Errors raised at construction, configuration and type-erased boundaries.
/// Transition and space functions themselves never fail.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GymError {
    #[error("Invalid space configuration: {0}")]
    InvalidSpaceConfig(String),
    #[error("Invalid environment configuration: {0}")]
    InvalidEnvConfig(String),
    #[error("Unknown environment id: {0}")]
    UnknownEnv(String),
    #[error("Env id already registered: {0}")]
    AlreadyRegistered(String),
    #[error("Invalid action: {0}")]
    InvalidAction(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Batch length mismatch: expected {expected} lanes, got {actual}")]
    BatchMismatch { expected: usize, actual: usize },
}

/// Convenience alias for results using GymError.
pub type Result<T> = std::result::Result<T, GymError>;

/// A pure environment: every method is a function of its explicit inputs.
///
/// Implementations hold only immutable configuration. Episode progress lives in
/// `State` values passed in and returned, and randomness arrives as a
/// [`PrngKey`], so any number of independent lanes can be evaluated from one
/// shared `&Self`.
pub trait Env {
    /// Read-only episode configuration supplied by the caller.
    type Params: Clone;
    type State: Clone;
    type Obs;
    type Act;

    fn default_params(&self) -> Self::Params;

    /// Sample an initial state and its observation. Deterministic given `key`.
    fn reset(&self, key: PrngKey, params: &Self::Params) -> (Self::Obs, Self::State);

    /// Advance one transition. If `state` was terminal, this call starts a new
    /// episode from `key` instead of continuing the old one.
    fn step(
        &self,
        key: PrngKey,
        params: &Self::Params,
        state: &Self::State,
        action: Self::Act,
    ) -> Step<Self::Obs, Self::State>;

    /// Derive the observation for a state.
    fn observe(&self, state: &Self::State, params: &Self::Params) -> Self::Obs;

    /// Whether a driver should cut the episode short. Environments never act on
    /// this themselves.
    fn is_truncated(&self, _state: &Self::State, _params: &Self::Params) -> bool { false }

    fn action_space(&self, params: &Self::Params) -> AnySpace;

    fn observation_space(&self, params: &Self::Params) -> AnySpace;

    fn state_space(&self, params: &Self::Params) -> AnySpace;

    fn name(&self) -> &'static str;

    fn num_actions(&self, params: &Self::Params) -> usize;
}
