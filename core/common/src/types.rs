//! Common types used throughout cfgvault.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

/// Key of an object in a remote object store.
///
/// Keys are `/`-separated and independent of the backing transport, so the
/// same key addresses a file below a directory store or an object in a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectKey {
    components: Vec<String>,
}

impl ObjectKey {
    /// Create the empty key, addressing the root of the store.
    pub fn root() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    /// Create a key from string components.
    ///
    /// # Errors
    /// - Returns error if any component is empty, `.`/`..`, or contains a separator
    pub fn from_components(components: Vec<String>) -> crate::Result<Self> {
        for comp in &components {
            validate_component(comp)?;
        }
        Ok(Self { components })
    }

    /// Parse a key string such as `ssh/id.pub`.
    ///
    /// Leading and trailing separators are ignored.
    pub fn parse(key: &str) -> crate::Result<Self> {
        let key = key.trim_matches('/');
        if key.is_empty() {
            return Ok(Self::root());
        }

        let components: Vec<String> = key.split('/').map(String::from).collect();
        Self::from_components(components)
    }

    /// Check if this is the root key.
    pub fn is_root(&self) -> bool {
        self.components.is_empty()
    }

    /// Get the parent key, if any.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            None
        } else {
            let mut components = self.components.clone();
            components.pop();
            Some(Self { components })
        }
    }

    /// Get the last component.
    pub fn name(&self) -> Option<&str> {
        self.components.last().map(|s| s.as_str())
    }

    /// Join this key with a child component.
    pub fn join(&self, child: &str) -> crate::Result<Self> {
        validate_component(child)?;
        let mut components = self.components.clone();
        components.push(child.to_string());
        Ok(Self { components })
    }

    /// Prefix this key with every component of `prefix`.
    pub fn under(&self, prefix: &ObjectKey) -> Self {
        let mut components = prefix.components.clone();
        components.extend(self.components.iter().cloned());
        Self { components }
    }

    /// Check whether `prefix` is a leading part of this key.
    pub fn starts_with(&self, prefix: &ObjectKey) -> bool {
        self.components.len() >= prefix.components.len()
            && self.components[..prefix.components.len()] == prefix.components[..]
    }

    /// Get the key components.
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Render the key in its `a/b/c` form.
    pub fn as_key_string(&self) -> String {
        self.components.join("/")
    }
}

fn validate_component(comp: &str) -> crate::Result<()> {
    if comp.is_empty() {
        return Err(crate::Error::Validation(
            "Object key component cannot be empty".to_string(),
        ));
    }
    if comp == "." || comp == ".." {
        return Err(crate::Error::Validation(format!(
            "Object key component cannot be '{}'",
            comp
        )));
    }
    if comp.contains('/') || comp.contains('\\') {
        return Err(crate::Error::Validation(
            "Object key component cannot contain separators".to_string(),
        ));
    }
    Ok(())
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_key_string())
    }
}

/// Secret text that zeroizes on drop and never prints its contents.
#[derive(Clone, Default, PartialEq, Eq, Zeroize)]
#[zeroize(drop)]
pub struct SensitiveString(String);

impl SensitiveString {
    /// Wrap a secret.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the secret.
    ///
    /// The returned slice should be used immediately and not stored.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Get the length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for SensitiveString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SensitiveString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for SensitiveString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SensitiveString([REDACTED; {} bytes])", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_object_key_root() {
        let key = ObjectKey::parse("/").unwrap();
        assert!(key.is_root());
        assert_eq!(key.as_key_string(), "");
    }

    #[test]
    fn test_object_key_parse() {
        let key = ObjectKey::parse("ssh/id.pub").unwrap();
        assert_eq!(key.components(), &["ssh", "id.pub"]);
        assert_eq!(key.name(), Some("id.pub"));
        assert_eq!(key.parent().unwrap().as_key_string(), "ssh");
    }

    #[test]
    fn test_object_key_rejects_traversal() {
        assert!(ObjectKey::parse("ssh/../etc").is_err());
        assert!(ObjectKey::parse("a//b").is_err());
        assert!(ObjectKey::root().join("a/b").is_err());
    }

    #[test]
    fn test_object_key_under_prefix() {
        let prefix = ObjectKey::parse("team/prod").unwrap();
        let key = ObjectKey::parse("state.json").unwrap().under(&prefix);
        assert_eq!(key.as_key_string(), "team/prod/state.json");
        assert!(key.starts_with(&prefix));
        assert!(!prefix.starts_with(&key));
    }

    #[test]
    fn test_sensitive_string_redacts() {
        let secret = SensitiveString::new("hunter2");
        let rendered = format!("{:?}", secret);
        assert!(!rendered.contains("hunter2"));
        assert_eq!(secret.expose(), "hunter2");
        assert_eq!(secret.len(), 7);
    }

    proptest! {
        #[test]
        fn prop_object_key_display_parses_back(parts in prop::collection::vec("[a-z0-9_-]{1,8}", 0..5)) {
            let key = ObjectKey::from_components(parts.clone()).unwrap();
            let reparsed = ObjectKey::parse(&key.to_string()).unwrap();
            prop_assert_eq!(reparsed.components(), &parts[..]);
        }
    }
}
