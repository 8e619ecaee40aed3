pub mod catch;

pub use catch::{Catch, CatchParams, CatchState};
