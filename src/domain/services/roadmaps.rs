#[cfg(test)]
#[path = "roadmaps_test.rs"]
mod tests;

use std::path;

use anyhow::bail;
use anyhow::Result;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::find_roadmap;
use crate::domain::models::Roadmap;
use crate::domain::models::RoadmapProgress;
use crate::domain::models::ROADMAPS;

fn lookup(category: &str, name: &str) -> Result<&'static Roadmap> {
    if let Some(roadmap) = find_roadmap(category, name) {
        return Ok(roadmap);
    }

    bail!(format!(
        "No roadmap named '{name}' in category '{category}'. Run `tutorbot roadmaps list` to see them all."
    ));
}

/// Roadmap progress persisted as YAML.
pub struct RoadmapStore {
    pub file_path: path::PathBuf,
}

impl Default for RoadmapStore {
    fn default() -> RoadmapStore {
        return RoadmapStore::new(path::PathBuf::from(Config::get(ConfigKey::RoadmapsFile)));
    }
}

impl RoadmapStore {
    pub fn new(file_path: path::PathBuf) -> RoadmapStore {
        return RoadmapStore { file_path };
    }

    pub async fn load(&self) -> Result<RoadmapProgress> {
        if !self.file_path.exists() {
            return Ok(RoadmapProgress::default());
        }

        let payload = fs::read_to_string(&self.file_path).await?;
        let progress: RoadmapProgress = serde_yaml::from_str(&payload)?;

        return Ok(progress);
    }

    pub async fn save(&self, progress: &RoadmapProgress) -> Result<()> {
        let payload = serde_yaml::to_string(progress)?;

        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut file = fs::File::create(&self.file_path).await?;
        file.write_all(payload.as_bytes()).await?;

        return Ok(());
    }

    /// One line per roadmap, grouped by category, with completion
    /// percentages.
    pub async fn list(&self) -> Result<String> {
        let progress = self.load().await?;
        let mut lines: Vec<String> = vec![];
        let mut category = "";

        for roadmap in ROADMAPS {
            if roadmap.category != category {
                if !lines.is_empty() {
                    lines.push("".to_string());
                }
                category = roadmap.category;
                lines.push(format!("{category}:"));
            }

            lines.push(format!(
                "- {name} ({percent}%)",
                name = roadmap.name,
                percent = progress.percent(roadmap)
            ));
        }

        return Ok(lines.join("\n"));
    }

    pub async fn show(&self, category: &str, name: &str) -> Result<String> {
        let roadmap = lookup(category, name)?;
        let progress = self.load().await?;

        return Ok(progress.format(roadmap));
    }

    /// Marks `step`, numbered from 1, and returns the updated roadmap.
    pub async fn set_step(
        &self,
        category: &str,
        name: &str,
        step: usize,
        done: bool,
    ) -> Result<String> {
        let roadmap = lookup(category, name)?;
        let Some(idx) = step.checked_sub(1) else {
            bail!("Steps are numbered from 1.");
        };

        let mut progress = self.load().await?;
        progress.set_step(roadmap, idx, done)?;
        self.save(&progress).await?;

        tracing::debug!(roadmap = roadmap.key(), step, done, "roadmap step updated");

        return Ok(progress.format(roadmap));
    }
}
