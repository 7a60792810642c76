pub mod fetcher;

pub use fetcher::{ArtifactFetcher, FetchRequest, MIN_EXECUTABLE_BYTES};
