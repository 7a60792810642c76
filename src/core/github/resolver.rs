use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use super::model::{ArtifactSource, CommitResponse, GithubRelease, SourceKind, VersionMarker};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::RemoteSource;

/// Snapshot markers are the head commit SHA cut to this many characters.
pub const SNAPSHOT_MARKER_LEN: usize = 12;

/// Turns "latest" into a concrete marker for either release model.
#[derive(Clone)]
pub struct VersionResolver {
    remote: Arc<dyn RemoteSource>,
}

impl VersionResolver {
    pub fn new(remote: Arc<dyn RemoteSource>) -> Self {
        Self { remote }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> LauncherResult<T> {
        let body = self.remote.get_text(url).await?;
        serde_json::from_str(&body).map_err(|e| LauncherError::Parse {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    #[instrument(skip(self), fields(repo = %source.repo))]
    pub async fn resolve_latest(&self, source: &ArtifactSource) -> LauncherResult<VersionMarker> {
        match &source.kind {
            SourceKind::Snapshot { branch } => {
                let url = source.commit_url(branch);
                let commit: CommitResponse = self.get_json(&url).await?;
                let sha = commit
                    .sha
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| LauncherError::Parse {
                        url: url.clone(),
                        reason: "commit response has no sha".into(),
                    })?;
                let marker: String = sha.chars().take(SNAPSHOT_MARKER_LEN).collect();
                debug!("Latest {} commit: {}", source.repo, marker);
                Ok(VersionMarker::new(marker))
            }
            SourceKind::TaggedRelease => {
                let release = self.latest_release(source).await?;
                Ok(VersionMarker::new(release.tag_name))
            }
        }
    }

    pub async fn resolve_by_tag(
        &self,
        source: &ArtifactSource,
        tag: &str,
    ) -> LauncherResult<VersionMarker> {
        let release = self.release_by_tag(source, tag).await?;
        Ok(VersionMarker::new(release.tag_name))
    }

    pub async fn latest_release(&self, source: &ArtifactSource) -> LauncherResult<GithubRelease> {
        self.get_json(&source.latest_release_url()).await
    }

    pub async fn release_by_tag(
        &self,
        source: &ArtifactSource,
        tag: &str,
    ) -> LauncherResult<GithubRelease> {
        self.get_json(&source.release_by_tag_url(tag)).await
    }

    /// Most recent tags, newest first. Never fails: problems yield an empty list.
    pub async fn list_recent_tags(&self, source: &ArtifactSource, count: usize) -> Vec<String> {
        let url = source.releases_url(count);
        match self.get_json::<Vec<GithubRelease>>(&url).await {
            Ok(releases) => releases
                .into_iter()
                .map(|r| r.tag_name)
                .filter(|t| !t.trim().is_empty())
                .collect(),
            Err(e) => {
                warn!("Could not list releases for {}: {}", source.repo, e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use crate::core::http::testing::FakeRemote;

    fn resolver(remote: FakeRemote) -> (VersionResolver, Arc<FakeRemote>) {
        let remote = Arc::new(remote);
        (VersionResolver::new(remote.clone()), remote)
    }

    #[tokio::test]
    async fn snapshot_marker_is_truncated_sha() {
        let remote = FakeRemote::new();
        let src = ArtifactSource::snapshot("AshitaXI/Ashita-v4beta", "main");
        remote.route(
            &src.commit_url("main"),
            r#"{"sha":"0123456789abcdef0123456789abcdef01234567","commit":{}}"#,
        );
        let (resolver, _) = resolver(remote);

        let marker = resolver.resolve_latest(&src).await.unwrap();
        assert_eq!(marker.as_str(), "0123456789ab");
    }

    #[tokio::test]
    async fn blank_sha_is_a_parse_error() {
        let remote = FakeRemote::new();
        let src = ArtifactSource::snapshot("AshitaXI/Ashita-v4beta", "main");
        remote.route(&src.commit_url("main"), r#"{"sha":"  "}"#);
        let (resolver, _) = resolver(remote);

        let err = resolver.resolve_latest(&src).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[tokio::test]
    async fn tagged_release_marker_is_tag_name() {
        let remote = FakeRemote::new();
        let src = ArtifactSource::releases("LandSandBoat/xiloader");
        remote.route(
            &src.latest_release_url(),
            r#"{"tag_name":"v1.1.5","assets":[]}"#,
        );
        remote.route(
            &src.release_by_tag_url("v1.1.0"),
            r#"{"tag_name":"v1.1.0","assets":[]}"#,
        );
        let (resolver, _) = resolver(remote);

        assert_eq!(resolver.resolve_latest(&src).await.unwrap().as_str(), "v1.1.5");
        assert_eq!(
            resolver.resolve_by_tag(&src, "v1.1.0").await.unwrap().as_str(),
            "v1.1.0"
        );
    }

    #[tokio::test]
    async fn network_failure_surfaces_as_network_error() {
        let remote = FakeRemote::new();
        let src = ArtifactSource::releases("LandSandBoat/xiloader");
        remote.fail(&src.latest_release_url(), 503);
        let (resolver, _) = resolver(remote);

        let err = resolver.resolve_latest(&src).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[tokio::test]
    async fn recent_tags_are_best_effort() {
        let remote = FakeRemote::new();
        let src = ArtifactSource::releases("LandSandBoat/xiloader");
        remote.route(
            &src.releases_url(3),
            r#"[{"tag_name":"v3"},{"tag_name":""},{"tag_name":"v1"}]"#,
        );
        let (resolver, remote) = resolver(remote);

        assert_eq!(resolver.list_recent_tags(&src, 3).await, vec!["v3", "v1"]);
        assert!(resolver.list_recent_tags(&src, 10).await.is_empty());
        assert_eq!(remote.hits(&src.releases_url(10)), 1);
    }
}
