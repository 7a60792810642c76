pub mod plan;

pub use plan::LaunchPlan;
