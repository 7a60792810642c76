pub mod provisioner;

pub use provisioner::{select_asset, xiloader_source, LoaderProvisioner, LOADER_FILE};
