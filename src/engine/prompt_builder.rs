use crate::model::capability::CapabilityKind;
use crate::model::character::CharacterRegistry;

/// Builds the prompts sent to the narrator model.
/// Only formats text: no parsing, no networking, no engine logic.
pub struct PromptBuilder;

impl PromptBuilder {
    /// The single system turn that opens every conversation.
    pub fn system_prompt(genre: &str, registry: &CharacterRegistry, separator: &str) -> String {
        let mut prompt = String::new();

        push_narrator_role(&mut prompt, genre, registry);
        push_tool_rules(&mut prompt);
        push_output_format(&mut prompt, separator, "exactly 3 distinct");
        push_language_rules(
            &mut prompt,
            "suitable for readers ages 8 and up. Keep sentences short and words common.",
        );

        prompt
    }

    /// First user turn: asks for the starting scene.
    pub fn opening_prompt(registry: &CharacterRegistry, separator: &str) -> String {
        let names = registry.names().collect::<Vec<_>>().join(", ");

        let mut prompt = format!(
            "Describe the starting scene with {names}. \
             Have them begin interacting or moving right away. "
        );
        push_step_reminder(&mut prompt, separator, "the first 3 options");
        prompt
    }

    /// Free text typed by the player.
    pub fn free_text_prompt(input: &str, separator: &str) -> String {
        let mut prompt = format!("{}\n\nDescribe the events that unfold. ", input.trim());
        push_step_reminder(&mut prompt, separator, "3 options");
        prompt
    }

    /// One of the offered choices, selected by the player.
    pub fn choice_prompt(choice: &str, separator: &str) -> String {
        let mut prompt = format!(
            "The user chooses this option: '{}'. \
             Describe the events that unfold as a result in the narrative. ",
            choice.trim()
        );
        push_step_reminder(&mut prompt, separator, "3 new options");
        prompt
    }
}

fn push_narrator_role(prompt: &mut String, genre: &str, registry: &CharacterRegistry) {
    let cast = registry
        .iter()
        .map(|c| format!("'{}' (a {})", c.name, c.role))
        .collect::<Vec<_>>()
        .join(", ");

    prompt.push_str(&format!(
        "You are the narrator and controller of the characters in this {} world. \
The main characters are {cast}. Your primary role is to tell an engaging story \
based on user choices and actively manage the characters.\n\n",
        genre.trim().to_lowercase()
    ));
}

fn push_tool_rules(prompt: &mut String) {
    let move_tool = CapabilityKind::MoveCharacter.name();
    let speak_tool = CapabilityKind::SpeakToCharacter.name();

    prompt.push_str(
        "In this world, characters are dynamic! They frequently move between locations and \
talk to each other. \
**It is essential that you represent these actions using the provided tools.**\n\n",
    );
    prompt.push_str(&format!(
        "- **Whenever a character changes location**, use the `{move_tool}` tool \
(e.g., if Elara goes to the market, call `{move_tool}` \
with character_name='Elara', location='the Market').\n"
    ));
    prompt.push_str(&format!(
        "- **Whenever one character speaks directly to another character**, \
use the `{speak_tool}` tool \
(e.g., if Kael asks Elara a question, call `{speak_tool}` with speaking_character='Kael', \
target_character='Elara', message='Are you ready?').\n\n"
    ));
}

fn push_output_format(prompt: &mut String, separator: &str, count: &str) {
    prompt.push_str(&format!(
        "After describing the scene or events resulting from a tool call or user input, *always* \
provide at least one paragraph of narrative. Then, *always* provide {count} potential options \
for the user to choose from to continue the story, formatted after the '{separator}' separator. \
Each option should start with a relevant emoji that represents that choice.\n\n"
    ));
}

fn push_language_rules(prompt: &mut String, audience: &str) {
    prompt.push_str("Remember to use simple, everyday language ");
    prompt.push_str(audience);
    prompt.push('\n');
}

fn push_step_reminder(prompt: &mut String, separator: &str, options: &str) {
    prompt.push_str(&format!(
        "Actively use `{}` and `{}` tools where appropriate to drive the action. \
Ensure at least one paragraph of detail, \
and then provide {options} following the '{separator}' separator. \
Each option should start with a relevant emoji that represents that choice. ",
        CapabilityKind::MoveCharacter.name(),
        CapabilityKind::SpeakToCharacter.name(),
    ));
    push_language_rules(prompt, "that both kids and adults can understand easily.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::narrative_parser::OPTIONS_SEPARATOR;
    use crate::model::character::Character;

    fn registry() -> CharacterRegistry {
        CharacterRegistry::from_roster(vec![
            Character::new("Elara", "Brave Adventurer"),
            Character::new("Kael", "Mysterious Companion"),
        ])
        .unwrap()
    }

    #[test]
    fn system_prompt_names_cast_genre_and_separator() {
        let prompt = PromptBuilder::system_prompt("Sci-Fi", &registry(), OPTIONS_SEPARATOR);

        assert!(prompt.contains("this sci-fi world"));
        assert!(prompt.contains("'Elara' (a Brave Adventurer), 'Kael' (a Mysterious Companion)"));
        assert!(prompt.contains("'--- Options ---' separator"));
        assert!(prompt.contains("`move_character`"));
        assert!(prompt.contains("`speak_to_character`"));
    }

    #[test]
    fn opening_prompt_lists_names() {
        let prompt = PromptBuilder::opening_prompt(&registry(), OPTIONS_SEPARATOR);
        assert!(prompt.starts_with("Describe the starting scene with Elara, Kael."));
        assert!(prompt.contains("the first 3 options"));
    }

    #[test]
    fn step_prompts_quote_the_player() {
        let free = PromptBuilder::free_text_prompt("  open the chest ", OPTIONS_SEPARATOR);
        assert!(free.starts_with("open the chest\n\nDescribe the events that unfold."));

        let choice = PromptBuilder::choice_prompt("🗝️ Open it", OPTIONS_SEPARATOR);
        assert!(choice.starts_with("The user chooses this option: '🗝️ Open it'."));
        assert!(choice.contains("3 new options following the '--- Options ---' separator"));
    }
}
