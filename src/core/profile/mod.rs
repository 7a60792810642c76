pub mod model;
pub mod set;

pub use model::{GameProfile, WindowMode};
pub use set::{ProfileSet, DEFAULT_PROFILE_NAME};
