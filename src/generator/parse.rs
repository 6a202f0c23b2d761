//! Lenient parser from completion text to a `GeneratedBatch`.
//!
//! Expected shape (markdown emphasis and emoji are tolerated):
//!
//! ```text
//! Comment: Nice name! Which problem should it tackle?
//! 1. **🔥** Procrastination: Helps beat procrastination
//! 2. **🌊** Overwhelm – Reduces overwhelm from too many tasks
//! ```
//!
//! Synthesis answers use `Tagline:` instead of `Comment:` and add a
//! `Description:` line. Anything unparseable yields no options rather than an
//! error.

use std::sync::LazyLock;

use regex::Regex;

use crate::brand::model::{GeneratedBatch, StageOption};

/// Longest button label kept when an item has no label separator.
const MAX_SHORT_CHARS: usize = 40;

static OPTION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\d{1,2}[.)]\s+(.+?)\s*$").expect("option regex is valid")
});

static LABELED_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(comment|tagline|answer|description)\s*:\s*(.*?)\s*$")
        .expect("label regex is valid")
});

/// Separators between an item's label and its text, in priority order.
const SEPARATORS: [&str; 4] = [":", " – ", " — ", " - "];

/// Parse a completion into a batch.
pub fn parse_batch(text: &str) -> GeneratedBatch {
    let mut lead: Option<String> = None;
    let mut description: Option<String> = None;
    let mut awaiting_description = false;
    let mut unlabeled: Option<String> = None;
    let mut options = Vec::new();

    for raw in text.lines() {
        let line = strip_markdown(raw);
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = OPTION_LINE.captures(&line) {
            awaiting_description = false;
            if let Some(option) = parse_option(&caps[1]) {
                options.push(option);
            }
            continue;
        }

        if let Some(caps) = LABELED_LINE.captures(&line) {
            let value = caps[2].trim().to_string();
            match caps[1].to_ascii_lowercase().as_str() {
                "description" => {
                    awaiting_description = value.is_empty();
                    if !value.is_empty() {
                        description = Some(value);
                    }
                }
                _ => {
                    if lead.is_none() && !value.is_empty() {
                        lead = Some(value);
                    }
                }
            }
            continue;
        }

        if awaiting_description {
            description = Some(line.clone());
            awaiting_description = false;
            continue;
        }

        // Section headings such as "Similar projects:" are not lead text.
        if unlabeled.is_none() && options.is_empty() && !line.ends_with(':') {
            unlabeled = Some(line);
        }
    }

    GeneratedBatch {
        lead_comment: lead.or(unlabeled).unwrap_or_default(),
        options,
        description,
    }
}

/// Split one numbered item into an option; `None` if nothing usable remains.
fn parse_option(body: &str) -> Option<StageOption> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    let split = SEPARATORS
        .iter()
        .filter_map(|sep| body.find(sep).map(|pos| (pos, *sep)))
        .min_by_key(|(pos, _)| *pos);

    let short = match split {
        Some((pos, _)) => clean_label(&body[..pos]),
        None => String::new(),
    };
    let short = if short.is_empty() {
        truncate(body, MAX_SHORT_CHARS)
    } else {
        short
    };

    let option = StageOption::new(short, body);
    option.is_complete().then_some(option)
}

/// Drop placeholder brackets the model sometimes copies from the schema.
fn clean_label(label: &str) -> String {
    label
        .trim()
        .trim_matches(|c| c == '[' || c == ']')
        .replace("] [", " ")
        .trim()
        .to_string()
}

fn strip_markdown(line: &str) -> String {
    line.replace("**", "").replace("__", "").trim().to_string()
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let cut: String = s.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stage_answer() {
        let text = "Comment: Taskly sounds calm. Which problem should it tackle?\n\
                    \n\
                    1. **🔥** Procrastination: Helps beat procrastination\n\
                    2. **🌊** Overwhelm: Reduces overwhelm from too many tasks\n\
                    3. **⏰** Forgetting: Prevents forgetting deadlines\n";
        let batch = parse_batch(text);

        assert_eq!(batch.lead_comment, "Taskly sounds calm. Which problem should it tackle?");
        assert_eq!(batch.options.len(), 3);
        assert_eq!(batch.options[1].short, "🌊 Overwhelm");
        assert_eq!(
            batch.options[1].full,
            "🌊 Overwhelm: Reduces overwhelm from too many tasks"
        );
        assert!(batch.description.is_none());
    }

    #[test]
    fn parses_synthesis_answer() {
        let text = "**Tagline:** Calm productivity for busy people\n\
                    **Description:** A task manager that fights overwhelm.\n\
                    Similar projects:\n\
                    1. **Todoist** – A cross-platform task list\n\
                    2. **Things** – A Mac planner\n";
        let batch = parse_batch(text);

        assert_eq!(batch.lead_comment, "Calm productivity for busy people");
        assert_eq!(
            batch.description.as_deref(),
            Some("A task manager that fights overwhelm.")
        );
        assert_eq!(batch.options.len(), 2);
        assert_eq!(batch.options[0].short, "Todoist");
        assert_eq!(batch.options[0].full, "Todoist – A cross-platform task list");
    }

    #[test]
    fn description_on_following_line() {
        let text = "Tagline: Short\nDescription:\nSpans the next line.\n1. A: b";
        let batch = parse_batch(text);
        assert_eq!(batch.description.as_deref(), Some("Spans the next line."));
    }

    #[test]
    fn item_without_separator_gets_truncated_label() {
        let text = "Comment: hi\n1) A very long option text that goes on and on without any separator at all";
        let batch = parse_batch(text);
        assert_eq!(batch.options.len(), 1);
        assert!(batch.options[0].short.ends_with('…'));
        assert!(batch.options[0].short.chars().count() <= MAX_SHORT_CHARS + 1);
        assert!(batch.options[0].full.starts_with("A very long option"));
    }

    #[test]
    fn bracket_placeholders_are_cleaned() {
        let batch = parse_batch("1. [🚀] [Students]: Learners on a budget");
        assert_eq!(batch.options[0].short, "🚀 Students");
    }

    #[test]
    fn unlabeled_lead_falls_back_to_first_line() {
        let batch = parse_batch("Here are some ideas\n1. One: first\n2. Two: second");
        assert_eq!(batch.lead_comment, "Here are some ideas");
        assert_eq!(batch.options.len(), 2);
    }

    #[test]
    fn malformed_text_yields_no_options() {
        let batch = parse_batch("Sorry, I can't help with that.");
        assert!(batch.options.is_empty());
        assert_eq!(batch.lead_comment, "Sorry, I can't help with that.");

        let empty = parse_batch("");
        assert!(empty.options.is_empty());
        assert!(empty.lead_comment.is_empty());
    }

    #[test]
    fn empty_items_are_dropped() {
        let batch = parse_batch("Comment: x\n1. **  **\n2. Real: option");
        assert_eq!(batch.options.len(), 1);
        assert_eq!(batch.options[0].short, "Real");
    }
}
