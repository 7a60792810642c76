pub mod installer;

pub use installer::{install_tree, InstallPlan};

#[cfg(test)]
pub(crate) use installer::testing;
