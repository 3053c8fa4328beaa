use super::*;

use crate::validator;

impl SkemaConfig {
    /// Validate the document against the attached schema.
    ///
    /// A config without a schema is always valid.
    pub fn validate(&self) -> Result<bool, SkemaError> {
        match &self.schema {
            Some(schema) => validator::validate(schema, &self.document),
            None => Ok(true),
        }
    }

    /// Validate and turn a mismatch into an error pointing at the source line.
    pub fn require_valid(&self) -> Result<(), SkemaError> {
        let Some(schema) = &self.schema else {
            return Ok(());
        };
        let Some(mismatch) = validator::check(schema, &self.document)? else {
            return Ok(());
        };

        let path = mismatch.segments.join(".");
        let (line, snippet) = helpers::find_config_line(&path, &self.raw_content);
        Err(SkemaError::Validation {
            message: mismatch.to_string(),
            line,
            hint: Some(format!("→ {}", snippet)),
        })
    }

    /// Get a value with validation - returns detailed error with line info if validation fails
    pub fn get_validated<T, F>(
        &self,
        path: &str,
        validator: F,
        valid_values: &str,
    ) -> Result<T, SkemaError>
    where
        T: FromNode,
        F: FnOnce(&T) -> bool,
    {
        let typed_value: T = self.get(path)?;

        if !validator(&typed_value) {
            let (line, snippet) = helpers::find_config_line(path, &self.raw_content);
            return Err(SkemaError::Validation {
                message: format!("Invalid value for `{}`, expected: {}", path, valid_values),
                line,
                hint: Some(format!("Valid values are: {}\n  → {}", valid_values, snippet)),
            });
        }

        Ok(typed_value)
    }

    /// Get a string value and validate it's one of the allowed values (case-insensitive)
    pub fn get_string_enum(
        &self,
        path: &str,
        allowed_values: &[&str],
    ) -> Result<String, SkemaError> {
        let value: String = self.get(path)?;
        let lower_value = value.to_lowercase();

        if !allowed_values.iter().any(|v| v.to_lowercase() == lower_value) {
            let (line, snippet) = helpers::find_config_line(path, &self.raw_content);
            return Err(SkemaError::Validation {
                message: format!("Invalid value '{}' for `{}`", value, path),
                line,
                hint: Some(format!(
                    "Expected one of: {}\n  → {}",
                    allowed_values.join(", "),
                    snippet
                )),
            });
        }

        Ok(value)
    }
}
