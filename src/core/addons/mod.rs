pub mod catalog;
pub mod script;

pub use catalog::{scan_addons, scan_plugins, ExtensionInfo, ExtensionKind};
pub use script::{render_script, ScriptInputs};
