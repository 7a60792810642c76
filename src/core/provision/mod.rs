pub mod facade;
pub mod phase;

pub use facade::{LaunchRequest, PreparedLaunch, ProvisioningFacade, DEFAULT_SERVER_HOST};
pub use phase::Phase;
