use std::fmt;

use serde::{Deserialize, Serialize};

pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// Opaque version identifier: a truncated commit SHA or a release tag.
///
/// Only equality is meaningful. Markers are never ordered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionMarker(String);

impl VersionMarker {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// Rolling branch; the marker is the head commit.
    Snapshot { branch: String },
    /// Tagged releases with downloadable assets.
    TaggedRelease,
}

/// Where an artifact is published, as `owner/repo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSource {
    pub kind: SourceKind,
    pub repo: String,
}

impl ArtifactSource {
    pub fn snapshot(repo: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::Snapshot {
                branch: branch.into(),
            },
            repo: repo.into(),
        }
    }

    pub fn releases(repo: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::TaggedRelease,
            repo: repo.into(),
        }
    }

    fn api(&self, tail: &str) -> String {
        format!("{}/repos/{}/{}", GITHUB_API_BASE, self.repo, tail)
    }

    pub fn commit_url(&self, branch: &str) -> String {
        self.api(&format!("commits/{}", branch))
    }

    pub fn latest_release_url(&self) -> String {
        self.api("releases/latest")
    }

    pub fn release_by_tag_url(&self, tag: &str) -> String {
        self.api(&format!("releases/tags/{}", tag))
    }

    pub fn releases_url(&self, per_page: usize) -> String {
        self.api(&format!("releases?per_page={}", per_page))
    }

    /// Branch archive download. Only meaningful for snapshot sources.
    pub fn archive_url(&self) -> Option<String> {
        match &self.kind {
            SourceKind::Snapshot { branch } => Some(format!(
                "https://github.com/{}/archive/refs/heads/{}.zip",
                self.repo, branch
            )),
            SourceKind::TaggedRelease => None,
        }
    }
}

// ── Wire types ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct CommitResponse {
    #[serde(default)]
    pub sha: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct GithubRelease {
    #[serde(default)]
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<GithubAsset>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct GithubAsset {
    pub name: String,
    pub browser_download_url: String,
}

impl GithubRelease {
    /// First asset whose name matches `pred`.
    pub fn find_asset(&self, pred: impl Fn(&str) -> bool) -> Option<&GithubAsset> {
        self.assets.iter().find(|a| pred(&a.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_urls_point_at_branch() {
        let src = ArtifactSource::snapshot("AshitaXI/Ashita-v4beta", "main");
        assert_eq!(
            src.commit_url("main"),
            "https://api.github.com/repos/AshitaXI/Ashita-v4beta/commits/main"
        );
        assert_eq!(
            src.archive_url().as_deref(),
            Some("https://github.com/AshitaXI/Ashita-v4beta/archive/refs/heads/main.zip")
        );
        assert_eq!(ArtifactSource::releases("a/b").archive_url(), None);
    }

    #[test]
    fn marker_equality_ignores_surrounding_whitespace() {
        assert_eq!(VersionMarker::new("abc123\n"), VersionMarker::new(" abc123"));
        assert_ne!(VersionMarker::new("abc123"), VersionMarker::new("abc124"));
    }

    #[test]
    fn release_tolerates_missing_fields() {
        let release: GithubRelease = serde_json::from_str("{}").unwrap();
        assert!(release.tag_name.is_empty());
        assert!(release.assets.is_empty());
    }
}
