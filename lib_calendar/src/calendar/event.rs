//! # Calendar Event Model
//!
//! Typed representation of one economic-calendar release as streamed by the
//! Trading Economics feed, plus the helpers shared by the live decoder:
//! quantity parsing (percent and magnitude-suffix forms) and derivation of
//! the composite subscription symbol.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Delimiter between the country token and the ticker token of a symbol.
pub const SYMBOL_DELIMITER: &str = "//";

/// Reserved marker embedded in universe-selection symbols. Symbols carrying
/// it are never matched by the base-category filter rule.
pub const UNIVERSE_MARKER: &str = "-UNIVERSE-";

/// Importance of a calendar release on the vendor's ordinal scale.
///
/// The feed reports importance as a 1-based code; `0` is undefined and
/// anything above `3` is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Importance {
    Low,
    Medium,
    High,
}

impl Importance {
    /// Maps the 1-based vendor code onto the ordinal scale.
    pub fn from_vendor_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Importance::Low),
            2 => Some(Importance::Medium),
            3 => Some(Importance::High),
            _ => None,
        }
    }
}

/// Security category of a derived symbol. The calendar feed only ever emits
/// base-category custom data; the variant exists so the subscription gate
/// can state its filter rule explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SecurityCategory {
    Base,
}

/// Composite symbolic identifier used as the subscription key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EventSymbol {
    /// The identifier string, e.g. `UNITED-STATES//UNITEDSTAEXIHOMSAL`.
    pub value: String,
    /// Security category, always `Base` for decoded calendar events.
    pub category: SecurityCategory,
}

impl EventSymbol {
    /// Derives the symbol from a raw country and ticker.
    ///
    /// Both tokens are uppercased with spaces replaced by hyphens, joined by
    /// [`SYMBOL_DELIMITER`]. Deterministic: equal inputs always produce the
    /// same identifier, and distinct (country, ticker) pairs cannot collide
    /// because the delimiter never appears inside a normalized token.
    pub fn from_country_ticker(country: &str, ticker: &str) -> Self {
        let country_token = country.trim().to_uppercase().replace(' ', "-");
        let ticker_token = ticker.trim().to_uppercase().replace(' ', "-");
        Self {
            value: format!("{}{}{}", country_token, SYMBOL_DELIMITER, ticker_token),
            category: SecurityCategory::Base,
        }
    }

    /// True when the identifier carries the reserved universe marker.
    pub fn is_universe(&self) -> bool {
        self.value.contains(UNIVERSE_MARKER)
    }
}

impl std::fmt::Display for EventSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// One normalized economic-calendar release.
///
/// Built exclusively by the decoder; a record missing any mandatory field is
/// not constructible because decoding such a message fails outright.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarEvent {
    /// Opaque feed-assigned identifier of the calendar entry.
    pub calendar_id: String,
    /// Country the release refers to, as transmitted.
    pub country: String,
    /// Indicator category, e.g. "Unemployment Rate".
    pub category: String,
    /// Human-readable event name as transmitted.
    pub event: String,
    /// Vendor ticker for the indicator.
    pub ticker: String,
    /// Released value. Mandatory.
    pub actual: f64,
    /// Previous release value, if transmitted.
    pub previous: Option<f64>,
    /// Market consensus forecast, if transmitted.
    pub forecast: Option<f64>,
    /// The vendor's own forecast, if transmitted.
    pub te_forecast: Option<f64>,
    /// Revised previous value, if transmitted.
    pub revised: Option<f64>,
    /// Whether the raw values of this message carried a percent marker.
    /// Shared by all five quantities of one message, never mixed per field.
    pub is_percentage: bool,
    /// Importance on the ordinal scale.
    pub importance: Importance,
    /// Event timestamp; decode-time clock when the feed omits the date.
    pub last_update: DateTime<Utc>,
    /// Originating institution, if transmitted.
    pub source: Option<String>,
    /// Reference period of the release, if transmitted.
    pub reference: Option<String>,
    /// Derived composite subscription key.
    pub symbol: EventSymbol,
}

/// Parses one raw quantity string into an absolute decimal value.
///
/// Percent markers are stripped and the value divided by 100 when
/// `is_percentage` is set (the flag is derived once per message, so a plain
/// "8" next to "8.2%" is still scaled). Otherwise magnitude suffixes
/// K/M/B/T multiply by 10^3..10^12. Returns `None` for anything that does
/// not parse as a number.
pub fn parse_quantity(raw: &str, is_percentage: bool) -> Option<f64> {
    let cleaned = raw.trim().replace('%', "");
    if cleaned.is_empty() {
        return None;
    }

    let (body, multiplier) = match cleaned.chars().last() {
        Some('K') | Some('k') => (&cleaned[..cleaned.len() - 1], 1e3),
        Some('M') | Some('m') => (&cleaned[..cleaned.len() - 1], 1e6),
        Some('B') | Some('b') => (&cleaned[..cleaned.len() - 1], 1e9),
        Some('T') | Some('t') => (&cleaned[..cleaned.len() - 1], 1e12),
        _ => (cleaned.as_str(), 1.0),
    };

    let value: f64 = body.trim().parse().ok()?;
    let scaled = value * multiplier;

    if is_percentage {
        Some(scaled / 100.0)
    } else {
        Some(scaled)
    }
}
