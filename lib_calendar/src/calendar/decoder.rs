//! # Live Stream Decoder
//!
//! Turns one raw message from the calendar stream into a typed outcome:
//! either the exact keepalive payload or a fully populated
//! [`CalendarEvent`]. Decoding is all-or-nothing; a message missing a
//! mandatory field or carrying an unparseable quantity never produces a
//! partially populated record.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::calendar::event::{parse_quantity, CalendarEvent, EventSymbol, Importance};

/// The exact keepalive payload emitted by the feed every 45 seconds.
/// Case-sensitive, no embedded whitespace variation tolerated.
pub const KEEPALIVE_PAYLOAD: &str = "{\"topic\":\"keepalive\"}";

/// Errors produced while decoding one stream message.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

/// Classification of one complete stream message.
#[derive(Debug)]
pub enum StreamMessage {
    /// The periodic no-op confirming the connection is alive.
    Keepalive,
    /// A decodable calendar release.
    Event(CalendarEvent),
}

/// Classifies a raw message as keepalive or calendar event.
///
/// The caller is expected to have stripped stray CR/LF control characters
/// inserted by the transport before calling this.
pub fn classify(raw: &str) -> Result<StreamMessage, DecodeError> {
    if raw == KEEPALIVE_PAYLOAD {
        return Ok(StreamMessage::Keepalive);
    }
    decode_event(raw).map(StreamMessage::Event)
}

/// Decodes one raw calendar message into a [`CalendarEvent`].
///
/// Pure function of the input text apart from the clock fallback used when
/// the feed omits the `date` field.
pub fn decode_event(raw: &str) -> Result<CalendarEvent, DecodeError> {
    let token: Value = serde_json::from_str(raw)
        .map_err(|e| DecodeError::MalformedPayload(format!("invalid json: {e}")))?;

    let calendar_id = mandatory_field(&token, "calendarId")?;
    let country = mandatory_field(&token, "country")?;
    let category = mandatory_field(&token, "category")?;
    let event = mandatory_field(&token, "event")?;
    let ticker = mandatory_field(&token, "ticker")?;

    let actual_raw = mandatory_field(&token, "actual")?;
    let previous_raw = optional_field(&token, "previous")?;
    let forecast_raw = optional_field(&token, "forecast")?;
    let te_forecast_raw = optional_field(&token, "teforecast")?;
    let revised_raw = optional_field(&token, "revised")?;

    // One percent flag per message: any raw value carrying the marker makes
    // all five quantities parse as percentages.
    let is_percentage = std::iter::once(Some(&actual_raw))
        .chain([
            previous_raw.as_ref(),
            forecast_raw.as_ref(),
            te_forecast_raw.as_ref(),
            revised_raw.as_ref(),
        ])
        .flatten()
        .any(|s| s.contains('%'));

    let actual = parse_quantity(&actual_raw, is_percentage).ok_or_else(|| {
        DecodeError::MalformedPayload(format!("unparseable actual value '{actual_raw}'"))
    })?;
    let previous = convert_optional(previous_raw, is_percentage, "previous")?;
    let forecast = convert_optional(forecast_raw, is_percentage, "forecast")?;
    let te_forecast = convert_optional(te_forecast_raw, is_percentage, "teforecast")?;
    let revised = convert_optional(revised_raw, is_percentage, "revised")?;

    let importance_code = token
        .get("importance")
        .and_then(Value::as_i64)
        .ok_or_else(|| DecodeError::MalformedPayload("missing importance code".to_string()))?;
    let importance = Importance::from_vendor_code(importance_code).ok_or_else(|| {
        DecodeError::MalformedPayload(format!("importance code {importance_code} out of range"))
    })?;

    let last_update = match optional_field(&token, "date")? {
        Some(date_raw) => parse_event_date(&date_raw).ok_or_else(|| {
            DecodeError::MalformedPayload(format!("unparseable date '{date_raw}'"))
        })?,
        None => Utc::now(),
    };

    let source = optional_field(&token, "source")?;
    let reference = optional_field(&token, "reference")?;
    let symbol = EventSymbol::from_country_ticker(&country, &ticker);

    Ok(CalendarEvent {
        calendar_id,
        country,
        category,
        event,
        ticker,
        actual,
        previous,
        forecast,
        te_forecast,
        revised,
        is_percentage,
        importance,
        last_update,
        source,
        reference,
        symbol,
    })
}

/// Reads a key that must be present. Numbers are stringified because the
/// feed flips between numeric and string encodings for ids and values.
fn mandatory_field(token: &Value, key: &str) -> Result<String, DecodeError> {
    optional_field(token, key)?
        .ok_or_else(|| DecodeError::MalformedPayload(format!("missing mandatory field '{key}'")))
}

/// Reads an optional key. JSON null counts as absent; bool/array/object
/// values are malformed rather than silently coerced.
fn optional_field(token: &Value, key: &str) -> Result<Option<String>, DecodeError> {
    match token.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(DecodeError::MalformedPayload(format!(
            "unexpected value for '{key}': {other}"
        ))),
    }
}

/// Converts a present optional quantity, failing hard when it does not
/// parse. A present-but-unparseable field is a malformed message, never a
/// silent null.
fn convert_optional(
    raw: Option<String>,
    is_percentage: bool,
    key: &str,
) -> Result<Option<f64>, DecodeError> {
    match raw {
        None => Ok(None),
        Some(s) => parse_quantity(&s, is_percentage)
            .map(Some)
            .ok_or_else(|| {
                DecodeError::MalformedPayload(format!("unparseable {key} value '{s}'"))
            }),
    }
}

/// Parses the feed's event timestamp. The stream usually sends naive
/// `2020-03-20T10:00:00` stamps; RFC 3339 with an offset is accepted too.
fn parse_event_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}
