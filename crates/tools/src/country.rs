//! `getCountryInfo`: static travel facts keyed by country name.

use serde::{Deserialize, Serialize};
use serde_json::json;
use wf_domain::tool::{ToolCall, ToolDefinition};

use crate::executor::{ToolError, ToolExecutor, ToolOutput};

pub const COUNTRY_INFO_TOOL: &str = "getCountryInfo";

const NOT_FOUND_HINT: &str =
    "Use the full English country name, e.g. 'United Kingdom'. If the country is correct, \
     answer from general knowledge and say the details could not be verified.";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Schema
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Arguments the model passes to `getCountryInfo`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CountryQuery {
    pub country: String,
}

/// Facts returned for a known country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryInfo {
    pub country: &'static str,
    pub capital: &'static str,
    pub currency: &'static str,
    pub timezone: &'static str,
    pub language: &'static str,
    pub travel_fact: &'static str,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: COUNTRY_INFO_TOOL.into(),
        description:
            "Returns capital, currency, timezone, language, and a travel fact for a given country"
                .into(),
        parameters: json!({
            "type": "object",
            "properties": {
                "country": {
                    "type": "string",
                    "description": "The full country name, e.g. 'United Kingdom'"
                }
            },
            "required": ["country"]
        }),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Lookup
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Find a country by name or common alias.
///
/// Matching ignores case and surrounding/repeated whitespace.
pub fn lookup(name: &str) -> Option<&'static CountryInfo> {
    let key = normalize(name);
    if key.is_empty() {
        return None;
    }
    let canonical = ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, target)| *target);

    COUNTRIES.iter().find(|c| match canonical {
        Some(target) => c.country == target,
        None => normalize(c.country) == key,
    })
}

fn normalize(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Executor
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The `getCountryInfo` tool backed by the static table.
#[derive(Debug, Clone, Copy, Default)]
pub struct CountryInfoTool;

impl CountryInfoTool {
    /// Look up `query.country`. Unknown countries produce an
    /// `{error, hint}` payload, never a fault.
    pub fn run(&self, query: &CountryQuery) -> ToolOutput {
        match lookup(&query.country) {
            Some(info) => ToolOutput::ok(json!(info)),
            None => {
                tracing::debug!(country = %query.country, "country not in table");
                ToolOutput::error(json!({
                    "error": format!("No information found for '{}'", query.country.trim()),
                    "hint": NOT_FOUND_HINT,
                }))
            }
        }
    }
}

impl ToolExecutor for CountryInfoTool {
    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![definition()]
    }

    fn execute(&self, call: &ToolCall) -> Result<ToolOutput, ToolError> {
        if call.tool_name != COUNTRY_INFO_TOOL {
            return Err(ToolError::UnknownTool(call.tool_name.clone()));
        }
        let query: CountryQuery = serde_json::from_value(call.arguments.clone()).map_err(|e| {
            ToolError::InvalidArguments {
                tool: call.tool_name.clone(),
                message: e.to_string(),
            }
        })?;
        Ok(self.run(&query))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Data
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Normalized alias → canonical `country` value.
const ALIASES: &[(&str, &str)] = &[
    ("uk", "United Kingdom"),
    ("great britain", "United Kingdom"),
    ("britain", "United Kingdom"),
    ("england", "United Kingdom"),
    ("usa", "United States"),
    ("us", "United States"),
    ("united states of america", "United States"),
    ("america", "United States"),
    ("holland", "Netherlands"),
    ("the netherlands", "Netherlands"),
    ("viet nam", "Vietnam"),
];

static COUNTRIES: &[CountryInfo] = &[
    CountryInfo {
        country: "France",
        capital: "Paris",
        currency: "Euro (EUR)",
        timezone: "Central European Time (UTC+1)",
        language: "French",
        travel_fact: "France is the most visited country in the world.",
    },
    CountryInfo {
        country: "Italy",
        capital: "Rome",
        currency: "Euro (EUR)",
        timezone: "Central European Time (UTC+1)",
        language: "Italian",
        travel_fact: "Italy has more UNESCO World Heritage Sites than any other country.",
    },
    CountryInfo {
        country: "Spain",
        capital: "Madrid",
        currency: "Euro (EUR)",
        timezone: "Central European Time (UTC+1)",
        language: "Spanish",
        travel_fact: "Dinner in Spain is rarely served before 9 pm.",
    },
    CountryInfo {
        country: "Portugal",
        capital: "Lisbon",
        currency: "Euro (EUR)",
        timezone: "Western European Time (UTC+0)",
        language: "Portuguese",
        travel_fact: "Portugal is the world's largest producer of cork.",
    },
    CountryInfo {
        country: "Germany",
        capital: "Berlin",
        currency: "Euro (EUR)",
        timezone: "Central European Time (UTC+1)",
        language: "German",
        travel_fact: "Germany has more than 20,000 castles.",
    },
    CountryInfo {
        country: "Netherlands",
        capital: "Amsterdam",
        currency: "Euro (EUR)",
        timezone: "Central European Time (UTC+1)",
        language: "Dutch",
        travel_fact: "There are more bicycles than people in the Netherlands.",
    },
    CountryInfo {
        country: "Greece",
        capital: "Athens",
        currency: "Euro (EUR)",
        timezone: "Eastern European Time (UTC+2)",
        language: "Greek",
        travel_fact: "Greece has around 6,000 islands, of which only about 200 are inhabited.",
    },
    CountryInfo {
        country: "United Kingdom",
        capital: "London",
        currency: "Pound sterling (GBP)",
        timezone: "Greenwich Mean Time (UTC+0)",
        language: "English",
        travel_fact: "The London Underground, opened in 1863, is the oldest metro system in the world.",
    },
    CountryInfo {
        country: "Iceland",
        capital: "Reykjavík",
        currency: "Icelandic króna (ISK)",
        timezone: "Greenwich Mean Time (UTC+0)",
        language: "Icelandic",
        travel_fact: "Iceland is one of the few places on Earth with no mosquitoes.",
    },
    CountryInfo {
        country: "Japan",
        capital: "Tokyo",
        currency: "Japanese yen (JPY)",
        timezone: "Japan Standard Time (UTC+9)",
        language: "Japanese",
        travel_fact: "Shinkansen bullet trains have an average delay measured in seconds.",
    },
    CountryInfo {
        country: "China",
        capital: "Beijing",
        currency: "Renminbi (CNY)",
        timezone: "China Standard Time (UTC+8)",
        language: "Mandarin Chinese",
        travel_fact: "China uses a single time zone despite spanning five geographical ones.",
    },
    CountryInfo {
        country: "India",
        capital: "New Delhi",
        currency: "Indian rupee (INR)",
        timezone: "India Standard Time (UTC+5:30)",
        language: "Hindi, English",
        travel_fact: "Indian Railways runs one of the largest rail networks in the world.",
    },
    CountryInfo {
        country: "Thailand",
        capital: "Bangkok",
        currency: "Thai baht (THB)",
        timezone: "Indochina Time (UTC+7)",
        language: "Thai",
        travel_fact: "Thailand is the only Southeast Asian country never colonised by a European power.",
    },
    CountryInfo {
        country: "Vietnam",
        capital: "Hanoi",
        currency: "Vietnamese đồng (VND)",
        timezone: "Indochina Time (UTC+7)",
        language: "Vietnamese",
        travel_fact: "Hang Son Doong in Vietnam is the largest known cave in the world.",
    },
    CountryInfo {
        country: "Australia",
        capital: "Canberra",
        currency: "Australian dollar (AUD)",
        timezone: "Australian Eastern Standard Time (UTC+10), plus two other zones",
        language: "English",
        travel_fact: "The Great Barrier Reef is the largest coral reef system in the world.",
    },
    CountryInfo {
        country: "New Zealand",
        capital: "Wellington",
        currency: "New Zealand dollar (NZD)",
        timezone: "New Zealand Standard Time (UTC+12)",
        language: "English, Māori",
        travel_fact: "Wellington is the southernmost capital city of a sovereign state.",
    },
    CountryInfo {
        country: "United States",
        capital: "Washington, D.C.",
        currency: "United States dollar (USD)",
        timezone: "Six main zones, from Eastern (UTC-5) to Hawaii (UTC-10)",
        language: "English",
        travel_fact: "The United States has 63 national parks.",
    },
    CountryInfo {
        country: "Canada",
        capital: "Ottawa",
        currency: "Canadian dollar (CAD)",
        timezone: "Six zones, from Newfoundland (UTC-3:30) to Pacific (UTC-8)",
        language: "English, French",
        travel_fact: "Canada has the longest coastline of any country.",
    },
    CountryInfo {
        country: "Mexico",
        capital: "Mexico City",
        currency: "Mexican peso (MXN)",
        timezone: "Central Standard Time (UTC-6)",
        language: "Spanish",
        travel_fact: "Mexico gave the world chocolate, chillies and corn.",
    },
    CountryInfo {
        country: "Brazil",
        capital: "Brasília",
        currency: "Brazilian real (BRL)",
        timezone: "Brasília Time (UTC-3)",
        language: "Portuguese",
        travel_fact: "Brazil holds about 60% of the Amazon rainforest.",
    },
    CountryInfo {
        country: "Argentina",
        capital: "Buenos Aires",
        currency: "Argentine peso (ARS)",
        timezone: "Argentina Time (UTC-3)",
        language: "Spanish",
        travel_fact: "Aconcagua in Argentina is the highest mountain outside Asia.",
    },
    CountryInfo {
        country: "Peru",
        capital: "Lima",
        currency: "Peruvian sol (PEN)",
        timezone: "Peru Time (UTC-5)",
        language: "Spanish, Quechua",
        travel_fact: "Machu Picchu sits about 2,430 metres above sea level.",
    },
    CountryInfo {
        country: "Egypt",
        capital: "Cairo",
        currency: "Egyptian pound (EGP)",
        timezone: "Eastern European Time (UTC+2)",
        language: "Arabic",
        travel_fact: "The Great Pyramid of Giza is the only surviving Wonder of the Ancient World.",
    },
    CountryInfo {
        country: "Morocco",
        capital: "Rabat",
        currency: "Moroccan dirham (MAD)",
        timezone: "UTC+1",
        language: "Arabic, Berber",
        travel_fact: "The medina of Fez is one of the largest car-free urban areas in the world.",
    },
    CountryInfo {
        country: "Kenya",
        capital: "Nairobi",
        currency: "Kenyan shilling (KES)",
        timezone: "East Africa Time (UTC+3)",
        language: "Swahili, English",
        travel_fact: "Nairobi National Park lies within sight of the city's skyline.",
    },
    CountryInfo {
        country: "South Africa",
        capital: "Pretoria (executive), Cape Town (legislative), Bloemfontein (judicial)",
        currency: "South African rand (ZAR)",
        timezone: "South Africa Standard Time (UTC+2)",
        language: "12 official languages, including Zulu, Xhosa, Afrikaans and English",
        travel_fact: "South Africa has three capital cities.",
    },
];
