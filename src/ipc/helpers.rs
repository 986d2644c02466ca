use chrono::NaiveDate;

use crate::ipc::error::HandlerErr;

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_optional_str(params: &serde_json::Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn get_required_path(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    get_optional_str(params, key).ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

/// `null`, a missing key or an empty string mean "no date".
pub fn get_optional_date(
    params: &serde_json::Value,
    key: &str,
) -> Result<Option<NaiveDate>, HandlerErr> {
    let Some(raw) = get_optional_str(params, key) else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| HandlerErr::bad_params(format!("{} must be YYYY-MM-DD", key)))
}

pub fn get_required_enum<T>(
    params: &serde_json::Value,
    key: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, HandlerErr> {
    let raw = get_required_str(params, key)?;
    parse(&raw).ok_or_else(|| {
        HandlerErr::bad_params(format!("invalid {}", key))
            .with_details(serde_json::json!({ "value": raw }))
    })
}
