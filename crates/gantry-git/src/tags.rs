//! Tag operations

use std::sync::LazyLock;

use chrono::{TimeZone, Utc};
use regex::Regex;
use semver::Version;
use tracing::{debug, info, instrument};

use crate::repository::{GitRepo, Result};
use crate::types::TagInfo;
use gantry_core::error::GitError;

/// Release tags look like `v1.2.3` (optionally `v1.2.3-beta`)
pub const RELEASE_TAG_PATTERN: &str = r"^v\d+\.\d+\.\d+";

static RELEASE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(RELEASE_TAG_PATTERN).expect("Invalid regex"));

/// Tag name for a pubspec version; the build number is dropped
pub fn release_tag_name(version: &str) -> String {
    let name = version.split_once('+').map(|(v, _)| v).unwrap_or(version);
    format!("v{name}")
}

impl GitRepo {
    /// Get all tags
    #[instrument(skip(self))]
    pub fn tags(&self) -> Result<Vec<TagInfo>> {
        let mut tags = Vec::new();

        self.repo.tag_foreach(|oid, name| {
            let name = String::from_utf8_lossy(name)
                .trim_start_matches("refs/tags/")
                .to_string();

            if let Ok(commit) = self.repo.find_commit(oid) {
                tags.push(TagInfo::new(&name, commit.id().to_string()));
            } else if let Ok(tag) = self.repo.find_tag(oid) {
                // Annotated tag
                let mut tag_info = TagInfo::new(&name, tag.target_id().to_string());

                if let Some(msg) = tag.message() {
                    tag_info = tag_info.with_message(msg.trim());
                }

                if let Some(tagger) = tag.tagger() {
                    if let Some(name) = tagger.name() {
                        tag_info = tag_info.with_tagger(name);
                    }
                    let timestamp = Utc
                        .timestamp_opt(tagger.when().seconds(), 0)
                        .single()
                        .unwrap_or_else(Utc::now);
                    tag_info = tag_info.with_timestamp(timestamp);
                }

                tags.push(tag_info);
            }

            true
        })?;

        debug!(count = tags.len(), "listed all tags");
        Ok(tags)
    }

    /// Get tags whose name matches `pattern`
    pub fn tags_matching(&self, pattern: &Regex) -> Result<Vec<TagInfo>> {
        Ok(self
            .tags()?
            .into_iter()
            .filter(|t| pattern.is_match(&t.name))
            .collect())
    }

    /// Find the highest `v*` release tag by semantic version
    #[instrument(skip(self))]
    pub fn find_latest_release_tag(&self) -> Result<Option<TagInfo>> {
        let mut versioned: Vec<_> = self
            .tags_matching(&RELEASE_TAG)?
            .into_iter()
            .filter_map(|t| {
                t.version
                    .as_deref()
                    .and_then(|v| Version::parse(v).ok())
                    .map(|v| (t, v))
            })
            .collect();

        versioned.sort_by(|a, b| b.1.cmp(&a.1));

        let result = versioned.into_iter().next().map(|(t, _)| t);
        debug!(latest = ?result.as_ref().map(|t| &t.name), "found latest release tag");
        Ok(result)
    }

    /// Find a specific tag by name
    pub fn find_tag(&self, name: &str) -> Result<Option<TagInfo>> {
        let tag_ref = format!("refs/tags/{}", name);

        match self.repo.find_reference(&tag_ref) {
            Ok(reference) => {
                let target = reference.peel_to_commit()?;
                Ok(Some(TagInfo::new(name, target.id().to_string())))
            }
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::Git2(e)),
        }
    }

    /// Tag HEAD; annotated when a message is given
    #[instrument(skip(self), fields(name, annotated = message.is_some()))]
    pub fn create_tag(&self, name: &str, message: Option<&str>) -> Result<TagInfo> {
        if self.find_tag(name)?.is_some() {
            return Err(GitError::TagExists(name.to_string()));
        }

        let head = self.head_commit()?;

        if let Some(msg) = message {
            let sig = self.repo.signature()?;
            self.repo.tag(name, head.as_object(), &sig, msg, false)?;
        } else {
            self.repo.tag_lightweight(name, head.as_object(), false)?;
        }

        info!(name, annotated = message.is_some(), "created tag");
        Ok(TagInfo::new(name, head.id().to_string()))
    }
}
