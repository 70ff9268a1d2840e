/// Separator between narrative prose and the list of choices. The system
/// prompt tells the model to use exactly this string.
pub const OPTIONS_SEPARATOR: &str = "--- Options ---";

/// A model response split into prose and the player's next choices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedResponse {
    pub narrative: String,
    /// Everything after the separator, trimmed. Kept for debugging.
    pub options_block: String,
    pub choices: Vec<String>,
}

/// Split `text` on the first `separator`.
///
/// Without a separator the whole (trimmed) text is narrative. Numbered lines
/// ("2. 🏃 Run") lose their numbering; other non-empty lines are kept as they
/// are. No de-duplication and no limit on how many choices come back.
pub fn parse_narrative(text: &str, separator: &str) -> ParsedResponse {
    let Some((narrative, options)) = text.split_once(separator) else {
        return ParsedResponse {
            narrative: text.trim().to_string(),
            ..ParsedResponse::default()
        };
    };

    let options_block = options.trim().to_string();
    let mut choices = Vec::new();

    for line in options_block.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match strip_numbering(line) {
            Some(rest) => {
                let rest = rest.trim();
                if !rest.is_empty() {
                    choices.push(rest.to_string());
                }
            }
            None => choices.push(line.to_string()),
        }
    }

    ParsedResponse {
        narrative: narrative.trim().to_string(),
        options_block,
        choices,
    }
}

/// "12. text" -> Some(" text"); anything without digits + '.' -> None.
fn strip_numbering(line: &str) -> Option<&str> {
    let rest = line.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() == line.len() {
        return None;
    }
    rest.strip_prefix('.')
}
