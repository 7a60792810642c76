pub mod extensions;
pub mod provisioner;

pub use extensions::{CuratedExtension, ExtensionSource, BLOCKED_ADDONS, CURATED_EXTENSIONS};
pub use provisioner::{
    ashita_source, RuntimeCheck, RuntimeProvisioner, RuntimeStatus, ENTRY_POINT, PRESERVED_PATHS,
    VERSION_FILE,
};
