//! Pure, seed-threaded reinforcement-learning environments.
//!
//! Environments implement [`Env`] as side-effect-free functions of an explicit
//! state, an explicit [`PrngKey`] and read-only params, so independent lanes can
//! be evaluated in any order or in bulk. Spaces describe action, observation and
//! state domains and support `sample` and `contains`.

pub mod core;
pub mod envs;
pub mod registry;
pub mod spaces;
pub mod utils;
pub mod vector;
pub mod wrappers;

pub use crate::core::{Env, GymError, Info, InfoValue, Result, Step};
pub use crate::envs::{Catch, CatchParams, CatchState};
pub use crate::registry::{EnvDyn, EnvSpec, KwArgs, make};
pub use crate::spaces::{AnySpace, BoxSpace, DictSpace, Discrete, Dtype, Space, TupleSpace, Value};
pub use crate::utils::{PrngKey, blend_by_flag, select};
pub use crate::vector::{SyncVectorEnv, reset_batch, step_batch};
pub use crate::wrappers::RecordEpisodeStatistics;
