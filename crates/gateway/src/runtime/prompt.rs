//! Prompt context assembly: one system entry, the windowed history, then the
//! new user message.
//!
//! The system entry is a pure function of the user profile. No clock, no
//! randomness, so identical inputs produce byte-identical prompts.

use std::fmt::Write as _;

use wf_domain::tool::Message;
use wf_domain::turn::UserProfile;
use wf_tools::COUNTRY_INFO_TOOL;

/// Rendered in place of the profile section when nothing is known.
pub const PROFILE_NOT_PROVIDED: &str = "No user profile provided.";

/// Build the full prompt context for one request.
pub fn compose(
    profile: Option<&UserProfile>,
    history: Vec<Message>,
    new_text: &str,
) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(system_prompt(profile)));
    messages.extend(history);
    messages.push(Message::user(new_text));
    messages
}

/// Render the system instruction for `profile`.
pub fn system_prompt(profile: Option<&UserProfile>) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str(ROLE);
    out.push_str("\n## User profile\n");
    out.push_str(&profile_section(profile));
    out.push('\n');
    out.push_str(RESPONSE_RULES);
    out.push_str(&tool_rules());
    out.push_str(PRIORITIES);
    out.push_str(EXAMPLES);
    out
}

fn profile_section(profile: Option<&UserProfile>) -> String {
    let profile = match profile {
        Some(p) if !p.is_empty() => p,
        _ => return format!("{PROFILE_NOT_PROVIDED}\n"),
    };

    let fields = [
        ("Name", &profile.name),
        ("Favourite country", &profile.country),
        ("Favourite continent", &profile.continent),
        ("Favourite city", &profile.city),
    ];

    let mut out = String::new();
    for (label, value) in fields {
        if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            // Writing to a String cannot fail.
            let _ = writeln!(out, "- {label}: {v}");
        }
    }
    out
}

fn tool_rules() -> String {
    format!(
        "\n## Looking up country facts\n\
         - When the user asks about a country's capital, currency, timezone or language, \
         call `{COUNTRY_INFO_TOOL}` with the full English country name.\n\
         - Call it at most once per reply.\n\
         - If the lookup returns an error, say so briefly and answer from general knowledge.\n"
    )
}

// ── Static sections ───────────────────────────────────────────────

const ROLE: &str = "\
# Role
You are a warm, well-travelled assistant. You help people discover destinations, \
plan trips and understand world geography. Stay on travel and geography topics; \
politely steer anything else back to travel.
";

const RESPONSE_RULES: &str = "\
## How to respond
- Format every reply as Markdown:
  - `##` headers for main sections (for example \"## Visiting Portugal\")
  - **bold** for key facts
  - `-` bullet lists for options and tips
  - short paragraphs separated by blank lines
- Use the profile above when it helps: with several preferences, connect them; \
with one or two, lean on those; with none, suggest inspiring ideas and ask what \
the user enjoys.
- Keep the tone friendly, curious and encouraging.
";

const PRIORITIES: &str = "
## Priorities
1. Advice that uses every preference in the profile.
2. Advice that uses the preferences that are present.
3. General travel inspiration when the profile is empty.
4. Clear answers to world geography questions.
5. Nothing unrelated to travel or geography.
";

const EXAMPLES: &str = "
## Examples

User: \"I'll be in Lisbon for a weekend. Where should I stay?\"
Assistant: \"## Where to Stay in Lisbon

**Good bases for a short trip:**
- **Baixa** - flat, central and close to the river
- **Alfama** - old-town charm and fado bars
- **Príncipe Real** - quieter streets with cafés and gardens

**Tip:** Lisbon is hilly, so staying near a metro stop saves your legs.\"

User: \"My favourite country is Mexico.\"
Assistant: \"Great pick! From Oaxaca's markets to the cenotes of Yucatán there is a lot \
to explore. Are you after food, ancient history, or beaches?\"

User: \"I think Africa is my favourite continent.\"
Assistant: \"Africa has so much range, from Moroccan medinas to Kenyan safaris. \
Is there a region or kind of trip you have in mind?\"

User: \"I love Vienna.\"
Assistant: \"Vienna is wonderful for music, coffee houses and grand architecture. \
Would you like a one-day plan or tips for a longer stay?\"

User: \"I'm not sure where to go. I just want somewhere that feels inspiring.\"
Assistant: \"Let's find it together! Do you prefer big cities or wild landscapes? \
History or adventure? Tell me a little and I'll suggest a few places.\"
";

#[cfg(test)]
mod tests {
    use super::*;
    use wf_domain::tool::Role;

    fn profile() -> UserProfile {
        UserProfile {
            name: Some("Ada".into()),
            country: Some("Japan".into()),
            continent: None,
            city: Some("Kyoto".into()),
        }
    }

    #[test]
    fn system_entry_first_user_entry_last() {
        let history = vec![Message::user("earlier"), Message::assistant("reply")];
        let msgs = compose(Some(&profile()), history, "What about Osaka?");
        assert_eq!(msgs.len(), 4);
        assert_eq!(msgs[0].role, Role::System);
        assert_eq!(msgs[1].content.text(), Some("earlier"));
        assert_eq!(msgs[3].role, Role::User);
        assert_eq!(msgs[3].content.text(), Some("What about Osaka?"));
    }

    #[test]
    fn identical_inputs_give_identical_prompt() {
        let a = system_prompt(Some(&profile()));
        let b = system_prompt(Some(&profile()));
        assert_eq!(a, b);
        assert_eq!(system_prompt(None), system_prompt(None));
    }

    #[test]
    fn absent_profile_renders_sentinel() {
        assert!(system_prompt(None).contains(PROFILE_NOT_PROVIDED));
        assert!(system_prompt(Some(&UserProfile::default())).contains(PROFILE_NOT_PROVIDED));
    }

    #[test]
    fn present_fields_listed_absent_fields_omitted() {
        let prompt = system_prompt(Some(&profile()));
        assert!(prompt.contains("- Name: Ada"));
        assert!(prompt.contains("- Favourite country: Japan"));
        assert!(prompt.contains("- Favourite city: Kyoto"));
        assert!(!prompt.contains("Favourite continent"));
        assert!(!prompt.contains(PROFILE_NOT_PROVIDED));
    }

    #[test]
    fn blank_field_is_treated_as_absent() {
        let p = UserProfile {
            city: Some("   ".into()),
            country: Some("Peru".into()),
            ..Default::default()
        };
        let prompt = system_prompt(Some(&p));
        assert!(!prompt.contains("Favourite city"));
        assert!(prompt.contains("- Favourite country: Peru"));
    }

    #[test]
    fn prompt_mentions_tool_by_name() {
        assert!(system_prompt(None).contains("`getCountryInfo`"));
    }
}
