pub mod model;
pub mod resolver;

pub use model::{ArtifactSource, GithubAsset, GithubRelease, SourceKind, VersionMarker};
pub use resolver::VersionResolver;
