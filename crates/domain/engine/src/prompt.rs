//! System-prompt composition (spec §4.6) and the conversation-history
//! trimming elaboration `SPEC_FULL.md` §11 adds to it.

use gateway_model::strategy::TEXT_PROTOCOL_DIRECTIVE;
use gateway_model::{AgentStrategy, ChatMessage, Role};

use crate::types::Persona;

fn persona_base(persona: Persona) -> &'static str {
    match persona {
        Persona::None => "",
        Persona::Assistant => "You are a helpful, accurate assistant. Answer clearly and completely.",
        Persona::Creative => "You are an imaginative, expressive assistant. Favor vivid, original language while staying truthful.",
        Persona::Analytical => "You are a rigorous, precise assistant. Reason step by step and favor structured, well-justified answers.",
        Persona::Concise => "You are a terse assistant. Answer in as few words as correctness allows.",
    }
}

/// Builds the system prompt as `<persona base> + <user-context sentence
/// if user name known> + <tool-use directives>` (spec §4.6). A caller-
/// supplied `custom_system_prompt` replaces the persona base but
/// directives are still appended.
#[must_use]
pub fn compose_system_prompt(
    persona: Persona,
    custom_system_prompt: Option<&str>,
    user_id: Option<&str>,
    strategy: AgentStrategy,
    tools_available: bool,
) -> String {
    let mut sections = Vec::new();

    let base = custom_system_prompt.map(str::trim).filter(|s| !s.is_empty()).unwrap_or_else(|| persona_base(persona));
    if !base.is_empty() {
        sections.push(base.to_string());
    }

    if let Some(user_id) = user_id.filter(|id| !id.is_empty()) {
        sections.push(format!("You are speaking with user {user_id}."));
    }

    if tools_available && strategy == AgentStrategy::TextProtocol {
        sections.push(TEXT_PROTOCOL_DIRECTIVE.to_string());
    }

    sections.join("\n\n")
}

/// Drops empty-content turns (spec §4.6: "some vendors reject them") and
/// truncates to `max_chars`, dropping the oldest turns first (`SPEC_FULL.md`
/// §11). The system turn, if present as the first element, is always
/// kept regardless of budget.
#[must_use]
pub fn prepare_history(history: &[ChatMessage], max_chars: usize) -> Vec<ChatMessage> {
    let non_empty: Vec<ChatMessage> = history.iter().filter(|turn| !turn.content.trim().is_empty()).cloned().collect();

    let total_chars: usize = non_empty.iter().map(|turn| turn.content.chars().count()).sum();
    if total_chars <= max_chars {
        return non_empty;
    }

    let system_turn = non_empty.first().filter(|turn| turn.role == Role::System).cloned();
    let rest_start = usize::from(system_turn.is_some());

    let mut kept_rev: Vec<ChatMessage> = Vec::new();
    let mut budget = max_chars;
    if let Some(system) = &system_turn {
        budget = budget.saturating_sub(system.content.chars().count());
    }

    for turn in non_empty[rest_start..].iter().rev() {
        let len = turn.content.chars().count();
        if len > budget {
            break;
        }
        budget -= len;
        kept_rev.push(turn.clone());
    }

    let mut result = Vec::new();
    result.extend(system_turn);
    result.extend(kept_rev.into_iter().rev());
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_turns_are_dropped() {
        let history = vec![ChatMessage::new(Role::User, "hello"), ChatMessage::new(Role::Assistant, "   ")];
        let prepared = prepare_history(&history, 1_000);
        assert_eq!(prepared.len(), 1);
    }

    #[test]
    fn oldest_turns_are_dropped_first_when_over_budget() {
        let history = vec![
            ChatMessage::new(Role::User, "first message, quite old"),
            ChatMessage::new(Role::Assistant, "first reply"),
            ChatMessage::new(Role::User, "latest message"),
        ];
        let prepared = prepare_history(&history, 20);
        assert_eq!(prepared.last().unwrap().content, "latest message");
        assert!(prepared.iter().all(|turn| turn.content != "first message, quite old"));
    }

    #[test]
    fn system_turn_survives_truncation() {
        let history = vec![
            ChatMessage::new(Role::System, "system directive"),
            ChatMessage::new(Role::User, "a very long user turn that should get dropped for budget"),
        ];
        let prepared = prepare_history(&history, 10);
        assert_eq!(prepared[0].role, Role::System);
    }

    #[test]
    fn custom_system_prompt_replaces_persona_base_but_keeps_directives() {
        let prompt = compose_system_prompt(Persona::Assistant, Some("Be a pirate."), None, AgentStrategy::TextProtocol, true);
        assert!(prompt.starts_with("Be a pirate."));
        assert!(prompt.contains("Thought:"));
    }

    #[test]
    fn function_calling_strategy_omits_text_protocol_directive() {
        let prompt = compose_system_prompt(Persona::Assistant, None, None, AgentStrategy::FunctionCalling, true);
        assert!(!prompt.contains("Thought:"));
    }
}
