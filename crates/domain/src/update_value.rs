//! Update value types for precise PATCH operations
//!
//! Distinguishes between "set to value", "set to null" and "don't update".
//! Fields of this type must be annotated with `#[serde(default)]` so that an
//! omitted field deserializes to `NoChange` while an explicit `null` becomes `Unset`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a precise update operation for PATCH semantics
///
/// ```rust
/// use scheduler_domain::UpdateValue;
///
/// let cron_update = UpdateValue::Set("0 0 * * * *".to_string());
/// let clear_cron = UpdateValue::<String>::Unset;
/// let untouched = UpdateValue::<String>::NoChange;
/// assert!(cron_update.is_change() && clear_cron.is_unset() && !untouched.is_change());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UpdateValue<T> {
    /// Set the field to the specified value
    Set(T),
    /// Set the field to null/remove the value (for nullable fields)
    Unset,
    /// Do not modify the field
    NoChange,
}

impl<T> Default for UpdateValue<T> {
    fn default() -> Self {
        UpdateValue::NoChange
    }
}

impl<T> UpdateValue<T> {
    pub fn is_change(&self) -> bool {
        !matches!(self, UpdateValue::NoChange)
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, UpdateValue::Unset)
    }

    /// Apply this update to an existing nullable value
    pub fn apply_to(self, existing: Option<T>) -> Option<T> {
        match self {
            UpdateValue::Set(value) => Some(value),
            UpdateValue::Unset => None,
            UpdateValue::NoChange => existing,
        }
    }
}

impl<'de, T> Deserialize<'de> for UpdateValue<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // 字段缺失时不会调用此函数，由 #[serde(default)] 提供 NoChange
        match Option::<T>::deserialize(deserializer)? {
            Some(value) => Ok(UpdateValue::Set(value)),
            None => Ok(UpdateValue::Unset),
        }
    }
}

impl<T> fmt::Display for UpdateValue<T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateValue::Set(value) => write!(f, "Set({value})"),
            UpdateValue::Unset => write!(f, "Unset"),
            UpdateValue::NoChange => write!(f, "NoChange"),
        }
    }
}
