//! The course library above the clip level: repos, sections, lessons and
//! videos. Only the shapes and the storage contract live here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repo {
    pub id: String,
    pub name: String,
    pub file_path: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub repo_id: String,
    pub path: String,
    pub order: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: String,
    pub section_id: String,
    pub path: String,
    pub order: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub lesson_id: String,
    pub path: String,
    #[serde(default)]
    pub archived: bool,
}

/// Storage contract for the library tree. Lists return children in their
/// display order and skip archived entries.
#[async_trait]
pub trait LibraryStore: Send + Sync + 'static {
    async fn create_repo(&self, name: &str, file_path: &str) -> anyhow::Result<Repo>;
    async fn list_repos(&self) -> anyhow::Result<Vec<Repo>>;
    async fn delete_repo(&self, repo_id: &str) -> anyhow::Result<()>;

    async fn create_section(&self, repo_id: &str, path: &str) -> anyhow::Result<Section>;
    async fn list_sections(&self, repo_id: &str) -> anyhow::Result<Vec<Section>>;

    async fn create_lesson(&self, section_id: &str, path: &str) -> anyhow::Result<Lesson>;
    async fn list_lessons(&self, section_id: &str) -> anyhow::Result<Vec<Lesson>>;

    async fn create_video(&self, lesson_id: &str, path: &str) -> anyhow::Result<Video>;
    async fn list_videos(&self, lesson_id: &str) -> anyhow::Result<Vec<Video>>;
    async fn rename_video(&self, video_id: &str, path: &str) -> anyhow::Result<Video>;
    async fn archive_video(&self, video_id: &str) -> anyhow::Result<()>;
}
