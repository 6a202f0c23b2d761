//! Destinations for shared profiles and submitted feedback.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::ChannelError;

use super::model::{BrandProfile, FeedbackReport};

/// Receives finished profiles and feedback reports.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Share a finished profile with whoever follows the project feed.
    async fn publish_profile(&self, identity: &str, profile: &BrandProfile)
        -> Result<(), ChannelError>;

    async fn publish_feedback(&self, report: &FeedbackReport) -> Result<(), ChannelError>;
}

/// Writes everything as structured log records.
#[derive(Debug, Default)]
pub struct TracingPublisher;

#[async_trait]
impl Publisher for TracingPublisher {
    async fn publish_profile(
        &self,
        identity: &str,
        profile: &BrandProfile,
    ) -> Result<(), ChannelError> {
        info!(
            identity = identity,
            project = %profile.project_name,
            tagline = %profile.tagline,
            problem = %profile.problem.short,
            audience = %profile.audience.short,
            format = %profile.format.short,
            "Project shared"
        );
        Ok(())
    }

    async fn publish_feedback(&self, report: &FeedbackReport) -> Result<(), ChannelError> {
        info!(
            id = %report.id,
            identity = %report.identity,
            project = report.project_name.as_deref().unwrap_or("-"),
            rating = report.rating,
            comment = report.comment.as_deref().unwrap_or(""),
            "Feedback received"
        );
        Ok(())
    }
}

/// Keeps everything in memory. Used by tests and embedders that poll.
#[derive(Debug, Default)]
pub struct MemoryPublisher {
    profiles: Mutex<Vec<(String, BrandProfile)>>,
    feedback: Mutex<Vec<FeedbackReport>>,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn profiles(&self) -> Vec<(String, BrandProfile)> {
        self.profiles.lock().await.clone()
    }

    pub async fn feedback(&self) -> Vec<FeedbackReport> {
        self.feedback.lock().await.clone()
    }
}

#[async_trait]
impl Publisher for MemoryPublisher {
    async fn publish_profile(
        &self,
        identity: &str,
        profile: &BrandProfile,
    ) -> Result<(), ChannelError> {
        self.profiles
            .lock()
            .await
            .push((identity.to_string(), profile.clone()));
        Ok(())
    }

    async fn publish_feedback(&self, report: &FeedbackReport) -> Result<(), ChannelError> {
        self.feedback.lock().await.push(report.clone());
        Ok(())
    }
}
