//! Fixed conversation text for the builder.
//!
//! The system instruction steers the generation service toward a concise
//! Discord bot specification; the remaining strings are what the assistant
//! side of a session says at each step.

use viper_types::error::GenerationError;
use viper_types::spec::BotSpecification;

/// System instruction sent with every generation request.
pub const SYSTEM_INSTRUCTION: &str = "\
You are Viper AI, an architect of Discord bots. \
Given a user's description of the bot they want, design a focused bot: \
choose a professional bot name, write a concise technical description of \
its purpose, list exactly 5 essential slash commands (each starting with \
'/'), and suggest a set of high-tier features. Be concise and technical, \
no filler. Respond only with JSON matching the provided schema.";

/// Opening assistant message of every session.
pub const GREETING: &str = "\
Viper architect online. Describe the Discord bot you want and I will draft \
its command protocol.";

/// Assistant message appended when generation fails.
pub const FAILURE_MESSAGE: &str = "\
Operational error: the reasoning core did not return a usable design. \
Please refine your description and try again.";

/// Build the user turn for a generation request.
pub fn build_generation_prompt(description: &str) -> String {
    format!("Design a Discord bot for the following request:\n\n{description}")
}

/// Summarize a generated specification as the assistant's reply.
///
/// Shows the name, intent and commands, then asks for credentials.
pub fn summarize_specification(spec: &BotSpecification) -> String {
    let mut out = format!(
        "**Protocol drafted: {}**\n\n**Intent:** {}\n\n**Commands:**\n",
        spec.name, spec.description
    );

    if spec.commands.is_empty() {
        out.push_str("(none)\n");
    } else {
        for command in &spec.commands {
            out.push_str(&format!("• {command}\n"));
        }
    }

    if !spec.features.is_empty() {
        out.push_str("\n**Features:**\n");
        for feature in &spec.features {
            out.push_str(&format!("• {feature}\n"));
        }
    }

    out.push_str("\nContainer provisioned. Provide the bot credentials to finalize deployment.");
    out
}

/// Assistant message for a failed generation.
///
/// Configuration problems get the actionable detail; everything else gets
/// the generic apology.
pub fn failure_message(error: &GenerationError) -> String {
    match error {
        GenerationError::Configuration(err) => format!("{FAILURE_MESSAGE}\n\n({err})"),
        _ => FAILURE_MESSAGE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use viper_types::error::ConfigurationError;

    fn spec() -> BotSpecification {
        BotSpecification {
            name: "ModGuard".to_string(),
            description: "Keeps the server tidy.".to_string(),
            commands: vec!["/ban".to_string(), "/kick".to_string()],
            features: vec![],
        }
    }

    #[test]
    fn test_summary_contains_name_intent_and_commands() {
        let summary = summarize_specification(&spec());
        assert!(summary.contains("ModGuard"));
        assert!(summary.contains("Keeps the server tidy."));
        assert!(summary.contains("• /ban\n"));
        assert!(summary.contains("• /kick\n"));
        assert!(summary.contains("credentials"));
        assert!(!summary.contains("Features"));
    }

    #[test]
    fn test_summary_handles_empty_commands_and_features() {
        let mut spec = spec();
        spec.commands.clear();
        spec.features = vec!["Audit log".to_string()];
        let summary = summarize_specification(&spec);
        assert!(summary.contains("(none)"));
        assert!(summary.contains("• Audit log"));
    }

    #[test]
    fn test_failure_message_mentions_missing_key() {
        let err = GenerationError::Configuration(ConfigurationError::MissingCredential(
            "API_KEY".to_string(),
        ));
        assert!(failure_message(&err).contains("API_KEY"));
        assert_eq!(failure_message(&GenerationError::EmptyPrompt), FAILURE_MESSAGE);
    }

    #[test]
    fn test_instruction_requests_five_commands_and_features() {
        assert!(SYSTEM_INSTRUCTION.contains("exactly 5 essential slash commands"));
        assert!(SYSTEM_INSTRUCTION.contains("features"));
        assert!(SYSTEM_INSTRUCTION.contains("JSON"));
    }

    #[test]
    fn test_generation_prompt_embeds_description() {
        let prompt = build_generation_prompt("a moderation bot");
        assert!(prompt.ends_with("a moderation bot"));
    }
}
