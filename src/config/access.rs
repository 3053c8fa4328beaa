use super::*;

impl SkemaConfig {
    /// Get a typed value from the configuration using dot notation.
    ///
    /// Numeric segments index arrays. Automatically handles both `snake_case`
    /// and `kebab-case` key names.
    ///
    /// # Examples
    /// ```no_run
    /// # use skema::SkemaConfig;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// # let config = SkemaConfig::from_file("server.conf")?;
    /// let host: String = config.get("server.host")?;
    /// let port: u16 = config.get("server.port")?;
    /// let first_tag: String = config.get("tags.0")?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    /// Returns error if path doesn't exist or value can't be converted to type T.
    pub fn get<T: FromNode>(&self, path: &str) -> Result<T, SkemaError> {
        let id = self.get_node(path)?;
        T::from_node(self.tree(), id).map_err(|e| with_path(e, path))
    }

    /// Get an optional typed value - returns `None` if key doesn't exist.
    pub fn get_optional<T: FromNode>(&self, path: &str) -> Result<Option<T>, SkemaError> {
        match self.get_node(path) {
            Ok(id) => Ok(Some(T::from_node(self.tree(), id).map_err(|e| with_path(e, path))?)),
            Err(SkemaError::PathNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Get a value with a fallback default.
    ///
    /// # Examples
    /// ```no_run
    /// # use skema::SkemaConfig;
    /// # let config = SkemaConfig::from_str("").unwrap();
    /// let timeout = config.get_or("server.timeout", 30u64);
    /// let debug = config.get_or("debug", false);
    /// ```
    pub fn get_or<T: FromNode>(&self, path: &str, default: T) -> T {
        self.get(path).unwrap_or(default)
    }

    /// Check if a configuration path exists.
    pub fn has(&self, path: &str) -> bool {
        self.get_node(path).is_ok()
    }

    /// Get all keys of the map at `path`; the empty path is the root.
    pub fn get_keys(&self, path: &str) -> Result<Vec<String>, SkemaError> {
        let id = self.get_node(path)?;
        match self.value(id) {
            Value::Map(entries) => Ok(entries.keys().cloned().collect()),
            other => Err(SkemaError::Type {
                path: path.to_string(),
                expected: "map".into(),
                found: other.type_name().into(),
            }),
        }
    }

    /// Node at `path`. The empty path is the root.
    pub fn get_node(&self, path: &str) -> Result<NodeId, SkemaError> {
        let not_found = || SkemaError::PathNotFound { path: path.to_string() };

        let mut id = self.document.root;
        if path.trim().is_empty() {
            return Ok(id);
        }
        for seg in path.split('.') {
            id = match self.value(id) {
                Value::Map(_) => helpers::variants(seg)
                    .iter()
                    .find_map(|key| self.tree().lookup(id, key))
                    .ok_or_else(not_found)?,
                Value::Array(items) => seg
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| items.get(i).copied())
                    .ok_or_else(not_found)?,
                _ => return Err(not_found()),
            };
        }
        Ok(id)
    }
}

/// Attach the requested path to a conversion error.
fn with_path(e: SkemaError, path: &str) -> SkemaError {
    match e {
        SkemaError::Type { expected, found, .. } => SkemaError::Type {
            path: path.to_string(),
            expected,
            found,
        },
        other => other,
    }
}
