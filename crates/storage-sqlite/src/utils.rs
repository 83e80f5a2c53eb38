//! Column encodings shared by the repositories.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;

use carehome_core::Result;

use crate::errors::StorageError;

/// Stores a unit enum as its bare serde name, e.g. `GIVEN`.
pub(crate) fn enum_to_db<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.trim_matches('"').to_string())
}

pub(crate) fn enum_from_db<T: DeserializeOwned>(value: &str) -> Result<T> {
    Ok(serde_json::from_str(&format!("\"{}\"", value))?)
}

/// Decimals are kept as text so doses never pass through a float.
pub(crate) fn decimal_to_db(value: Decimal) -> String {
    value.normalize().to_string()
}

pub(crate) fn decimal_from_db(value: &str) -> Result<Decimal> {
    Ok(Decimal::from_str(value)
        .map_err(|e| StorageError::InvalidValue(format!("'{}' is not a decimal: {}", value, e)))?)
}

pub(crate) fn json_to_db<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

pub(crate) fn json_from_db<T: DeserializeOwned>(value: &str) -> Result<T> {
    Ok(serde_json::from_str(value)?)
}
