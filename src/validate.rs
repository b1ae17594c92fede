use std::collections::HashMap;

use crate::error::ApiError;

/// Collects per-field validation problems and converts them into a single 400
/// response listing every failure, not just the first.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: HashMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.entry(field.to_string()).or_insert_with(|| message.into());
    }

    /// Records an error when `value` is absent or blank; returns the trimmed
    /// value otherwise.
    pub fn require_str<'a>(
        &mut self,
        field: &str,
        value: Option<&'a str>,
        message: &str,
    ) -> Option<&'a str> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Some(v),
            _ => {
                self.add(field, message);
                None
            }
        }
    }

    pub fn require_id(&mut self, field: &str, value: Option<i64>, message: &str) -> Option<i64> {
        match value {
            Some(v) => Some(v),
            None => {
                self.add(field, message);
                None
            }
        }
    }

    pub fn check_length(&mut self, field: &str, value: &str, min: usize, max: usize, message: &str) {
        let len = value.chars().count();
        if len < min || len > max {
            self.add(field, message);
        }
    }

    pub fn check_range(&mut self, field: &str, value: i32, min: i32, max: i32, message: &str) {
        if value < min || value > max {
            self.add(field, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation(self.errors))
        }
    }
}
