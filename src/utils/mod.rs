pub mod blend;
pub mod rng;

pub use blend::{blend_by_flag, flag, select};
pub use rng::{PrngKey, RngStream, SeedSequence, split_n};
