//! Generation prompts for each stage and for the final synthesis.
//!
//! Every prompt asks for the same textual schema so one parser handles all
//! of them: a labeled lead line, an optional `Description:` line, then a
//! numbered list of `Label: text` items.

use super::model::StageOption;
use super::state::Stage;

/// Build the prompt for a stage.
///
/// `prior` holds the committed choices of every earlier stage, in stage order.
pub fn stage_prompt(
    stage: Stage,
    seed_concept: &str,
    project_name: &str,
    prior: &[(Stage, &StageOption)],
) -> String {
    let history: String = prior
        .iter()
        .map(|(s, choice)| format!("- {} chosen: \"{}\" ({})\n", choice_label(*s), choice.short, choice.full))
        .collect();

    let (task, item, comment_focus) = match stage {
        Stage::Problem => (
            "Analyse the name and the concept in terms of semantic associations and potential \
             positioning. Suggest 3 different problems or needs such a project could address.",
            "Problem/need",
            format!("the name \"{project_name}\""),
        ),
        Stage::Audience => (
            "Based on the chosen problem, the concept and the name, suggest 3 target audiences \
             that would benefit most from the solution. Explain why each audience cares and what \
             it gains (1-2 sentences).",
            "Audience name",
            last_short(prior),
        ),
        Stage::Format => (
            "Taking all of this into account, suggest 3 concrete formats the project could take \
             to solve the problem effectively and bring real value to the audience (1-2 sentences \
             each).",
            "Short definition",
            last_short(prior),
        ),
    };

    format!(
        "Original concept: {seed_concept}\n\
         Project name: {project_name}\n\
         {history}\
         \n\
         {task}\n\
         \n\
         Answer strictly in this format:\n\
         Comment: [a short comment on {comment_focus} and a lead-in question to the options, 1-2 sentences]\n\
         1. [emoji] [{item} 1]: [Description]\n\
         2. [emoji] [{item} 2]: [Description]\n\
         3. [emoji] [{item} 3]: [Description]"
    )
}

/// Build the synthesis prompt for the final profile.
pub fn synthesis_prompt(
    seed_concept: &str,
    project_name: &str,
    problem: &StageOption,
    audience: &StageOption,
    format: &StageOption,
) -> String {
    format!(
        "The user created a project concept:\n\
         - Idea: {seed_concept}\n\
         - Name: {project_name}\n\
         - Problem: {problem}\n\
         - Audience: {audience}\n\
         - Format: {format}\n\
         \n\
         Keep the user's original idea in mind and answer strictly in this format:\n\
         Tagline: [a short, vivid one-sentence summary of the project]\n\
         Description: [a short, clear description of the project, 1-2 sentences]\n\
         Similar projects:\n\
         1. **[Project name]**: [1 sentence on what it is and its goal]\n\
         2. **[Project name]**: [1 sentence on what it is and its goal]\n\
         3. **[Project name]**: [1 sentence on what it is and its goal]",
        problem = problem.short,
        audience = audience.short,
        format = format.short,
    )
}

fn last_short(prior: &[(Stage, &StageOption)]) -> String {
    prior
        .last()
        .map(|(_, c)| format!("the choice \"{}\" (mention it)", c.short))
        .unwrap_or_else(|| "the previous choice".to_string())
}

/// Label used when a committed choice is quoted back into a prompt.
fn choice_label(stage: Stage) -> &'static str {
    match stage {
        Stage::Problem => "Problem/need",
        Stage::Audience => "Target audience",
        Stage::Format => "Format",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_one_prompt_embeds_context() {
        let prompt = stage_prompt(Stage::Problem, "task manager app", "Taskly", &[]);
        assert!(prompt.contains("task manager app"));
        assert!(prompt.contains("Taskly"));
        assert!(prompt.contains("Comment:"));
        assert!(prompt.contains("1. [emoji]"));
        assert!(prompt.contains("3. [emoji]"));
        assert!(!prompt.contains("chosen:"));
    }

    #[test]
    fn later_prompts_quote_prior_choices() {
        let problem = StageOption::new("Overwhelm", "Reduces overwhelm from too many tasks");
        let audience = StageOption::custom("Freelancers");
        let prompt = stage_prompt(
            Stage::Format,
            "task manager app",
            "Taskly",
            &[(Stage::Problem, &problem), (Stage::Audience, &audience)],
        );
        assert!(prompt.contains("Problem/need chosen: \"Overwhelm\" (Reduces overwhelm from too many tasks)"));
        assert!(prompt.contains("Target audience chosen: \"Freelancers\""));
        assert!(prompt.contains("the choice \"Freelancers\""));
    }

    #[test]
    fn prompts_are_deterministic() {
        let problem = StageOption::custom("Focus");
        let a = stage_prompt(Stage::Audience, "idea", "Name", &[(Stage::Problem, &problem)]);
        let b = stage_prompt(Stage::Audience, "idea", "Name", &[(Stage::Problem, &problem)]);
        assert_eq!(a, b);
    }

    #[test]
    fn synthesis_prompt_uses_short_text() {
        let prompt = synthesis_prompt(
            "task manager app",
            "Taskly",
            &StageOption::new("Overwhelm", "Long overwhelm text"),
            &StageOption::custom("Freelancers"),
            &StageOption::new("Mobile app", "Long app text"),
        );
        assert!(prompt.contains("- Problem: Overwhelm"));
        assert!(prompt.contains("- Audience: Freelancers"));
        assert!(prompt.contains("- Format: Mobile app"));
        assert!(!prompt.contains("Long app text"));
        assert!(prompt.contains("Tagline:"));
        assert!(prompt.contains("Description:"));
    }
}
