// Vectorized execution.
//
// `reset_batch` / `step_batch` map a pure environment over independent lanes.
// `SyncVectorEnv` is a small driver on top: it owns one state per lane, threads
// keys, and applies truncation, which environments leave to their caller.

use log::{debug, trace};

use crate::core::{Env, GymError, InfoValue, Result, Step};
use crate::utils::rng::PrngKey;

fn check_lanes(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(GymError::BatchMismatch { expected, actual });
    }
    Ok(())
}

/// Reset one lane per key.
pub fn reset_batch<E: Env>(env: &E, params: &E::Params, keys: Vec<PrngKey>) -> Vec<(E::Obs, E::State)> {
    keys.into_iter().map(|k| env.reset(k, params)).collect()
}

/// Step every lane with its own key, state and action. All three must have the
/// same length.
pub fn step_batch<E: Env>(
    env: &E,
    params: &E::Params,
    keys: Vec<PrngKey>,
    states: &[E::State],
    actions: Vec<E::Act>,
) -> Result<Vec<Step<E::Obs, E::State>>> {
    check_lanes(states.len(), keys.len())?;
    check_lanes(states.len(), actions.len())?;
    Ok(keys
        .into_iter()
        .zip(states)
        .zip(actions)
        .map(|((k, s), a)| env.step(k, params, s, a))
        .collect())
}

/// Runs N lanes of one environment in the current thread.
///
/// - Construct with `SyncVectorEnv::new(n, env, params)`; lanes start reset from seed 0
/// - Reset all lanes from a seed: `reset_all(seed)`
/// - Step with a batch of actions: `step_all(actions)`
///
/// Lanes whose state reports [`Env::is_truncated`] after a non-terminal step are
/// reset on the spot and carry `info["truncated"] = true`.
pub struct SyncVectorEnv<E: Env> {
    env: E,
    params: E::Params,
    states: Vec<E::State>,
    key: PrngKey,
}

impl<E: Env> SyncVectorEnv<E> {
    pub fn new(n: usize, env: E, params: E::Params) -> Self {
        debug!("creating {n} lanes of {}", env.name());
        let mut v = Self { env, params, states: Vec::new(), key: PrngKey::new(0) };
        let keys = v.reset_keys(0, n);
        v.states = vec_of_states(&v.env, &v.params, keys);
        v
    }

    fn reset_keys(&mut self, seed: u64, n: usize) -> Vec<PrngKey> {
        let (reset_key, run_key) = PrngKey::new(seed).split2();
        self.key = run_key;
        reset_key.split(n)
    }

    pub fn len(&self) -> usize { self.states.len() }
    pub fn is_empty(&self) -> bool { self.states.is_empty() }

    pub fn env(&self) -> &E { &self.env }
    pub fn params(&self) -> &E::Params { &self.params }
    pub fn states(&self) -> &[E::State] { &self.states }

    /// Current observation of every lane.
    pub fn observations(&self) -> Vec<E::Obs> {
        self.states.iter().map(|s| self.env.observe(s, &self.params)).collect()
    }

    /// Reset all lanes. Lane `i` uses sub-key `i` of the seed's reset key.
    pub fn reset_all(&mut self, seed: u64) -> Vec<E::Obs> {
        let n = self.states.len();
        let keys = self.reset_keys(seed, n);
        let (obs, states): (Vec<_>, Vec<_>) = reset_batch(&self.env, &self.params, keys).into_iter().unzip();
        self.states = states;
        obs
    }

    /// Step all lanes with a batch of actions, one per lane.
    pub fn step_all(&mut self, actions: Vec<E::Act>) -> Result<Vec<Step<E::Obs, E::State>>> {
        check_lanes(self.states.len(), actions.len())?;
        let (step_key, next_key) = self.key.clone().split2();
        self.key = next_key;

        let mut steps = Vec::with_capacity(actions.len());
        for (lane, ((key, state), action)) in step_key
            .split(self.states.len())
            .into_iter()
            .zip(&self.states)
            .zip(actions)
            .enumerate()
        {
            let (transition_key, reset_key) = key.split2();
            let mut s = self.env.step(transition_key, &self.params, state, action);
            if s.done {
                trace!("lane {lane}: episode finished with reward {}", s.reward);
            } else if self.env.is_truncated(&s.state, &self.params) {
                trace!("lane {lane}: truncated, resetting");
                let (obs, fresh) = self.env.reset(reset_key, &self.params);
                s.observation = obs;
                s.state = fresh;
                s.info.insert("truncated", InfoValue::from(true));
            }
            steps.push(s);
        }
        self.states = steps.iter().map(|s| s.state.clone()).collect();
        Ok(steps)
    }
}

fn vec_of_states<E: Env>(env: &E, params: &E::Params, keys: Vec<PrngKey>) -> Vec<E::State> {
    reset_batch(env, params, keys).into_iter().map(|(_, s)| s).collect()
}
