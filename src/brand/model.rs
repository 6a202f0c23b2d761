//! Workflow data models: options, generated batches and the final profile.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A generated (or user-typed) candidate answer for one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOption {
    /// Button-label-safe summary.
    pub short: String,
    /// Full text used in prompts and the detail view.
    pub full: String,
}

impl StageOption {
    pub fn new(short: impl Into<String>, full: impl Into<String>) -> Self {
        Self {
            short: short.into(),
            full: full.into(),
        }
    }

    /// Synthetic option from free text: both fields hold the trimmed text.
    pub fn custom(text: &str) -> Self {
        let trimmed = text.trim();
        Self::new(trimmed, trimmed)
    }

    /// Both fields must carry text.
    pub fn is_complete(&self) -> bool {
        !self.short.trim().is_empty() && !self.full.trim().is_empty()
    }
}

/// The generator's return contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedBatch {
    pub lead_comment: String,
    /// Three expected; fewer on partial backend output, empty on malformed output.
    pub options: Vec<StageOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Fallback texts when the synthesis output lacks a field.
pub const TAGLINE_FALLBACK: &str = "Could not generate a tagline";
pub const DESCRIPTION_FALLBACK: &str = "Could not generate a description";

/// Composite profile assembled after all three stages are committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandProfile {
    pub project_name: String,
    pub seed_concept: String,
    pub tagline: String,
    pub description: String,
    pub problem: StageOption,
    pub audience: StageOption,
    pub format: StageOption,
    /// Similar existing projects; may be empty.
    pub references: Vec<StageOption>,
}

impl BrandProfile {
    /// Render the profile card shown to the user.
    pub fn render(&self) -> String {
        let mut parts = vec![
            "📝 Project profile".to_string(),
            String::new(),
            self.project_name.clone(),
            self.tagline.clone(),
            String::new(),
            "Description:".to_string(),
            self.description.clone(),
            String::new(),
            "Concept:".to_string(),
            format!("🔹 Problem: {}", self.problem.short),
            format!("🔹 Audience: {}", self.audience.short),
            format!("🔹 Format: {}", self.format.short),
            String::new(),
            "Similar projects:".to_string(),
        ];

        if self.references.is_empty() {
            parts.push("❌ No similar projects found.".to_string());
        } else {
            parts.extend(self.references.iter().map(|r| format!("🔹 {}", r.full)));
        }

        parts.push(String::new());
        parts.push(format!("_{}_", self.seed_concept));
        parts.join("\n")
    }
}

/// Rating and comment collected after the profile is ready.
///
/// Lives inside the session and is torn down with it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Feedback handed to the publisher once the user finishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackReport {
    pub id: Uuid,
    pub identity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    pub rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl FeedbackReport {
    pub fn new(
        identity: impl Into<String>,
        project_name: Option<String>,
        rating: u8,
        comment: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity: identity.into(),
            project_name,
            rating,
            comment,
            submitted_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_profile(references: Vec<StageOption>) -> BrandProfile {
        BrandProfile {
            project_name: "Taskly".to_string(),
            seed_concept: "task manager app".to_string(),
            tagline: "Get things done, calmly".to_string(),
            description: "A focused task manager.".to_string(),
            problem: StageOption::new("Overwhelm", "Reduces overwhelm from too many tasks"),
            audience: StageOption::custom("Freelancers"),
            format: StageOption::new("Mobile app", "A mobile-first planner"),
            references,
        }
    }

    #[test]
    fn custom_option_trims_and_mirrors() {
        let opt = StageOption::custom("  Freelancers \n");
        assert_eq!(opt.short, "Freelancers");
        assert_eq!(opt.full, "Freelancers");
        assert!(opt.is_complete());
        assert!(!StageOption::custom("   ").is_complete());
    }

    #[test]
    fn render_includes_key_fields() {
        let profile = sample_profile(vec![StageOption::new(
            "Todoist",
            "Todoist – a cross-platform task list",
        )]);
        let card = profile.render();
        assert!(card.contains("Taskly"));
        assert!(card.contains("Get things done, calmly"));
        assert!(card.contains("A focused task manager."));
        assert!(card.contains("Problem: Overwhelm"));
        assert!(card.contains("Audience: Freelancers"));
        assert!(card.contains("Format: Mobile app"));
        assert!(card.contains("Todoist – a cross-platform task list"));
        assert!(card.contains("task manager app"));
        assert!(!card.contains("No similar projects"));
    }

    #[test]
    fn render_without_references() {
        let card = sample_profile(vec![]).render();
        assert!(card.contains("No similar projects found"));
    }

    #[test]
    fn batch_description_is_optional_in_json() {
        let batch: GeneratedBatch =
            serde_json::from_str(r#"{"lead_comment": "hi", "options": []}"#).unwrap();
        assert!(batch.description.is_none());
        assert!(batch.options.is_empty());
    }
}
