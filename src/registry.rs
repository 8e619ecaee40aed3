//! Environment registry: construct environments by id with an associated [`EnvSpec`].
//!
//! Environments built through [`make`] are type-erased behind [`EnvDyn`];
//! observations, states and actions cross that boundary as `Box<dyn Any>` and
//! are downcast back to the concrete types on the way in.

use std::any::Any;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{OnceLock, RwLock};

use log::debug;

use crate::core::{Env, GymError, Result, Step};
use crate::envs::catch::{Catch, CatchParams, DEFAULT_COLUMNS, DEFAULT_ROWS};
use crate::spaces::AnySpace;
use crate::utils::rng::PrngKey;

/// Key-value kwargs for make(). Stringly-typed, parsed by each factory.
pub type KwArgs = HashMap<String, String>;

/// Environment specification metadata.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnvSpec {
    /// Unique identifier like "Catch-bsuite".
    pub id: String,
    /// Suggested truncation horizon for drivers.
    pub max_episode_steps: Option<u32>,
    /// Target reward threshold for a "solved" score, if defined.
    pub reward_threshold: Option<f32>,
    /// Whether environment has inherent nondeterminism beyond the key.
    pub nondeterministic: bool,
    pub version: Option<String>,
}

impl EnvSpec {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            max_episode_steps: None,
            reward_threshold: None,
            nondeterministic: false,
            version: None,
        }
    }
}

/// Boxed transition produced by [`EnvDyn::step`].
pub type DynStep = Step<Box<dyn Any>, Box<dyn Any>>;

/// A type-erased pure environment with its params bound.
pub trait EnvDyn: Send + Sync {
    fn name(&self) -> &'static str;
    /// Returns `(observation, state)`.
    fn reset(&self, key: PrngKey) -> (Box<dyn Any>, Box<dyn Any>);
    fn step(&self, key: PrngKey, state: &dyn Any, action: Box<dyn Any>) -> Result<DynStep>;
    fn is_truncated(&self, state: &dyn Any) -> Result<bool>;
    fn action_space(&self) -> AnySpace;
    fn observation_space(&self) -> AnySpace;
}

/// Adapts any Env plus its params into EnvDyn.
struct DynEnv<E: Env> {
    env: E,
    params: E::Params,
}

impl<E: Env> DynEnv<E> {
    fn state<'a>(&self, state: &'a dyn Any) -> Result<&'a E::State>
    where
        E::State: 'static,
    {
        state
            .downcast_ref::<E::State>()
            .ok_or_else(|| GymError::InvalidState(format!("state is not a {} state", self.env.name())))
    }
}

impl<E> EnvDyn for DynEnv<E>
where
    E: Env + Send + Sync,
    E::Params: Send + Sync,
    E::Obs: Any,
    E::State: Any,
    E::Act: Any,
{
    fn name(&self) -> &'static str { self.env.name() }

    fn reset(&self, key: PrngKey) -> (Box<dyn Any>, Box<dyn Any>) {
        let (obs, state) = self.env.reset(key, &self.params);
        (Box::new(obs), Box::new(state))
    }

    fn step(&self, key: PrngKey, state: &dyn Any, action: Box<dyn Any>) -> Result<DynStep> {
        let state = self.state(state)?;
        let action = *action
            .downcast::<E::Act>()
            .map_err(|_| GymError::InvalidAction(format!("action type does not match {}", self.env.name())))?;
        let s = self.env.step(key, &self.params, state, action);
        Ok(Step::new(
            Box::new(s.observation) as Box<dyn Any>,
            Box::new(s.state) as Box<dyn Any>,
            s.reward,
            s.done,
            s.info,
        ))
    }

    fn is_truncated(&self, state: &dyn Any) -> Result<bool> {
        Ok(self.env.is_truncated(self.state(state)?, &self.params))
    }

    fn action_space(&self) -> AnySpace { self.env.action_space(&self.params) }
    fn observation_space(&self) -> AnySpace { self.env.observation_space(&self.params) }
}

/// Factory closure type for constructing environments with kwargs.
pub type FactoryFn = Box<dyn Fn(&KwArgs) -> Result<Box<dyn EnvDyn>> + Send + Sync>;

#[derive(Default)]
struct RegistryInner {
    specs: HashMap<String, EnvSpec>,
    factories: HashMap<String, FactoryFn>,
}

struct Registry {
    inner: RwLock<RegistryInner>,
}

impl Registry {
    fn with_builtins() -> Self {
        let registry = Self { inner: RwLock::new(RegistryInner::default()) };
        let spec = EnvSpec {
            max_episode_steps: Some(CatchParams::default().max_steps_in_episode),
            version: Some("0".into()),
            ..EnvSpec::new("Catch-bsuite")
        };
        if let Err(e) = registry.register(spec, factory_of::<Catch, _>(catch_from_kwargs)) {
            debug!("builtin registration failed: {e}");
        }
        registry
    }

    fn register(&self, spec: EnvSpec, factory: FactoryFn) -> Result<()> {
        let mut g = self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        if g.specs.contains_key(&spec.id) {
            return Err(GymError::AlreadyRegistered(spec.id));
        }
        debug!("registering environment {}", spec.id);
        g.factories.insert(spec.id.clone(), factory);
        g.specs.insert(spec.id.clone(), spec);
        Ok(())
    }

    fn get_spec(&self, id: &str) -> Option<EnvSpec> {
        let g = self.inner.read().ok()?;
        g.specs.get(id).cloned()
    }

    fn ids(&self) -> Vec<String> {
        let g = self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut ids: Vec<String> = g.specs.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn make(&self, id: &str, kwargs: &KwArgs) -> Result<Box<dyn EnvDyn>> {
        let g = self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        let factory = g.factories.get(id).ok_or_else(|| GymError::UnknownEnv(id.to_string()))?;
        debug!("making {id} with {} kwargs", kwargs.len());
        factory(kwargs)
    }
}

static REGISTRY: OnceLock<Registry> = OnceLock::new();

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::with_builtins)
}

/// Register an environment spec and its factory globally.
pub fn register(spec: EnvSpec, factory: FactoryFn) -> Result<()> { registry().register(spec, factory) }

/// Fetch a registered EnvSpec by id.
pub fn get_spec(id: &str) -> Option<EnvSpec> { registry().get_spec(id) }

/// All registered ids, sorted.
pub fn registered_ids() -> Vec<String> { registry().ids() }

/// Construct an environment by id with kwargs.
pub fn make<S: AsRef<str>>(id: S, kwargs: &KwArgs) -> Result<Box<dyn EnvDyn>> { registry().make(id.as_ref(), kwargs) }

/// Adapt a concrete Env constructor into a factory.
pub fn factory_of<E, F>(ctor: F) -> FactoryFn
where
    E: Env + Send + Sync + 'static,
    E::Params: Send + Sync,
    E::Obs: Any,
    E::State: Any,
    E::Act: Any,
    F: Fn(&KwArgs) -> Result<(E, E::Params)> + Send + Sync + 'static,
{
    Box::new(move |kwargs: &KwArgs| {
        let (env, params) = ctor(kwargs)?;
        Ok(Box::new(DynEnv { env, params }) as Box<dyn EnvDyn>)
    })
}

/// Parse an optional kwarg, falling back to `default`.
pub fn kwarg<T: FromStr>(kwargs: &KwArgs, name: &str, default: T) -> Result<T> {
    match kwargs.get(name) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| GymError::InvalidEnvConfig(format!("cannot parse {name}={raw:?}"))),
    }
}

fn reject_unknown(kwargs: &KwArgs, known: &[&str]) -> Result<()> {
    match kwargs.keys().find(|k| !known.contains(&k.as_str())) {
        Some(k) => Err(GymError::InvalidEnvConfig(format!("unknown kwarg {k:?}"))),
        None => Ok(()),
    }
}

fn catch_from_kwargs(kwargs: &KwArgs) -> Result<(Catch, CatchParams)> {
    reject_unknown(kwargs, &["rows", "columns", "max_steps_in_episode"])?;
    let env = Catch::new(kwarg(kwargs, "rows", DEFAULT_ROWS)?, kwarg(kwargs, "columns", DEFAULT_COLUMNS)?)?;
    let defaults = CatchParams::default();
    let max_steps = kwarg(kwargs, "max_steps_in_episode", defaults.max_steps_in_episode)?;
    Ok((env, defaults.with_max_steps_in_episode(max_steps)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envs::CatchState;
    use crate::spaces::{Space, Value};
    use ndarray::Array2;

    #[test]
    fn catch_is_registered() {
        assert!(registered_ids().contains(&"Catch-bsuite".to_string()));
        let spec = get_spec("Catch-bsuite").expect("builtin spec");
        assert_eq!(spec.max_episode_steps, Some(2000));
    }

    #[test]
    fn make_catch_with_kwargs() {
        let mut kwargs = KwArgs::new();
        kwargs.insert("rows".into(), "6".into());
        kwargs.insert("columns".into(), "3".into());
        let env = make("Catch-bsuite", &kwargs).expect("make ok");
        assert_eq!(env.name(), "Catch-bsuite");
        let (obs, state) = env.reset(PrngKey::new(0));
        assert_eq!(obs.downcast_ref::<Array2<f32>>().map(|o| o.dim()), Some((6, 3)));
        let s = env.step(PrngKey::new(1), state.as_ref(), Box::new(1u32)).expect("step ok");
        let next = s.state.downcast_ref::<CatchState>().expect("catch state");
        assert_eq!(next.ball_y, 1);
        assert!(!env.is_truncated(s.state.as_ref()).unwrap());
        assert!(env.action_space().contains(&Value::Discrete(2)));
    }

    #[test]
    fn make_rejects_bad_input() {
        assert!(matches!(make("Nope-v0", &KwArgs::new()), Err(GymError::UnknownEnv(_))));
        let mut kwargs = KwArgs::new();
        kwargs.insert("rows".into(), "many".into());
        assert!(matches!(make("Catch-bsuite", &kwargs), Err(GymError::InvalidEnvConfig(_))));
        let mut kwargs = KwArgs::new();
        kwargs.insert("gravity".into(), "9.8".into());
        assert!(matches!(make("Catch-bsuite", &kwargs), Err(GymError::InvalidEnvConfig(_))));

        let env = make("Catch-bsuite", &KwArgs::new()).unwrap();
        let (_obs, state) = env.reset(PrngKey::new(0));
        assert!(matches!(env.step(PrngKey::new(1), state.as_ref(), Box::new("left")), Err(GymError::InvalidAction(_))));
        assert!(matches!(env.step(PrngKey::new(1), &5u8, Box::new(1u32)), Err(GymError::InvalidState(_))));
    }

    #[test]
    fn register_custom_and_reject_duplicate() {
        let spec = EnvSpec::new("CatchWide-v0");
        register(spec.clone(), factory_of::<Catch, _>(|_k: &KwArgs| Ok((Catch::new(10, 9)?, CatchParams::default())))).expect("register ok");
        assert!(matches!(register(spec, factory_of::<Catch, _>(catch_from_kwargs)), Err(GymError::AlreadyRegistered(_))));
        let env = make("CatchWide-v0", &KwArgs::new()).unwrap();
        let (_obs, state) = env.reset(PrngKey::new(3));
        assert_eq!(state.downcast_ref::<CatchState>().unwrap().paddle_x, 4);
    }
}
