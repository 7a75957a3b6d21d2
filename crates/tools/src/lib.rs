//! Tools the model may call mid-stream.
//!
//! - `getCountryInfo`: capital, currency, timezone, language and a travel
//!   fact for a named country, served from a static table.

pub mod country;
pub mod executor;

pub use country::{CountryInfo, CountryInfoTool, CountryQuery, COUNTRY_INFO_TOOL};
pub use executor::{ToolError, ToolExecutor, ToolOutput};
