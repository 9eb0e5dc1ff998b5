use std::collections::HashSet;
use tracing::{debug, warn};

use greg_config::ProviderKind;
use greg_core::{GregError, Result};
use greg_llm::dispatcher::SKILL_SELECTION_MAX_TOKENS;
use greg_llm::{strip_code_fences, Dispatcher};

use crate::definition::Skill;

/// Instruction for the AI selection round trip.
pub const SELECTION_SYSTEM_PROMPT: &str = "You select which skills are relevant to a user's CLI request. \
Return ONLY a JSON array of skill names that match. Return [] if none are relevant. \
No explanation, no markdown, no code fences.";

/// How conditional skills are chosen for a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillSelector {
    /// Token overlap between prompt and description. No network.
    Keyword,
    /// Ask the model, fall back to [`SkillSelector::Keyword`] on any failure.
    Ai,
}

impl SkillSelector {
    /// The on-device model is slow enough that an extra round trip is not
    /// worth it.
    pub fn for_provider(kind: ProviderKind) -> Self {
        match kind {
            ProviderKind::OnDevice => SkillSelector::Keyword,
            ProviderKind::Anthropic | ProviderKind::OpenAi | ProviderKind::Gemini => {
                SkillSelector::Ai
            }
        }
    }
}

/// Lowercase words of `[a-z0-9-]` longer than two characters.
pub fn tokenize(text: &str) -> HashSet<String> {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    normalized
        .split_whitespace()
        .filter(|w| w.len() > 2)
        .map(str::to_string)
        .collect()
}

/// Global skills plus every skill whose description shares a token with
/// the prompt, in input order.
pub fn keyword_match(skills: &[Skill], prompt: &str) -> Vec<Skill> {
    let prompt_tokens = tokenize(prompt);
    skills
        .iter()
        .filter(|skill| {
            skill.is_global()
                || tokenize(&skill.description)
                    .iter()
                    .any(|t| prompt_tokens.contains(t))
        })
        .cloned()
        .collect()
}

/// User prompt for the AI selection round trip.
pub fn selection_prompt(skills: &[Skill], prompt: &str) -> String {
    let list = skills
        .iter()
        .filter(|s| !s.is_global())
        .map(|s| format!("- \"{}\": {}", s.name, s.description))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Skills:\n{list}\n\nRequest: {prompt}")
}

/// Parse the model's answer as a JSON array of skill names.
pub fn parse_selection(raw: &str) -> Result<Vec<String>> {
    let cleaned = strip_code_fences(raw);
    serde_json::from_str::<Vec<String>>(&cleaned).map_err(|e| {
        GregError::Provider(format!("skill selection was not a JSON array of names: {e}"))
    })
}

/// Ask the model which conditional skills apply. Errors are returned, not
/// absorbed; [`select_skills`] decides what to do with them.
pub async fn select_with_ai(
    dispatcher: &Dispatcher,
    skills: &[Skill],
    prompt: &str,
) -> Result<Vec<Skill>> {
    let raw = dispatcher
        .complete(
            SELECTION_SYSTEM_PROMPT,
            &selection_prompt(skills, prompt),
            SKILL_SELECTION_MAX_TOKENS,
        )
        .await?;
    let names: HashSet<String> = parse_selection(&raw)?.into_iter().collect();
    Ok(skills
        .iter()
        .filter(|s| s.is_global() || names.contains(&s.name))
        .cloned()
        .collect())
}

/// Pick the skills to inject for `prompt`.
///
/// Without description-bearing skills only the global ones are returned and
/// nothing is sent. Otherwise the provider's [`SkillSelector`] decides; a
/// failed AI selection silently falls back to keyword matching.
pub async fn select_skills(dispatcher: &Dispatcher, skills: &[Skill], prompt: &str) -> Vec<Skill> {
    if !skills.iter().any(|s| !s.is_global()) {
        return skills.to_vec();
    }

    let selected = match SkillSelector::for_provider(dispatcher.kind()) {
        SkillSelector::Keyword => keyword_match(skills, prompt),
        SkillSelector::Ai => match select_with_ai(dispatcher, skills, prompt).await {
            Ok(selected) => selected,
            Err(e) => {
                warn!(error = %e, "AI skill selection failed, using keyword matching");
                keyword_match(skills, prompt)
            }
        },
    };

    for skill in selected.iter().filter(|s| !s.is_global()) {
        debug!(skill = %skill.name, "using skill");
    }
    debug!(selected = selected.len(), total = skills.len(), "skills selected");
    selected
}
