//! Name types for channels, routes and nodes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error type for name validation failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The name is empty or contains only whitespace.
    EmptyName,
    /// The name contains a path separator.
    InvalidName(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyName => write!(f, "Name cannot be empty"),
            ValidationError::InvalidName(name) => {
                write!(f, "Invalid name '{name}': must not contain '/'")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

fn validate_segment(s: &str) -> Result<(), ValidationError> {
    if s.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if s.contains('/') {
        return Err(ValidationError::InvalidName(s.to_string()));
    }
    Ok(())
}

macro_rules! name_conversions {
    ($ty:ident) => {
        impl $ty {
            /// Returns the string representation of this name.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the name and returns the inner String.
            #[must_use]
            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<&str> for $ty {
            type Error = ValidationError;

            fn try_from(s: &str) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $ty {
            type Error = ValidationError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(&s)
            }
        }

        impl TryFrom<&String> for $ty {
            type Error = ValidationError;

            fn try_from(s: &String) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }
    };
}

/// Name of a publish/subscribe channel.
///
/// Other URL-reserved characters are allowed; the gateway percent-encodes
/// the name when it builds a request path.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct ChannelName(String);

impl ChannelName {
    /// Creates a `ChannelName`, validating it is a single non-empty segment.
    ///
    /// # Errors
    /// Returns `ValidationError::EmptyName` if the name is blank.
    /// Returns `ValidationError::InvalidName` if the name contains `/`.
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        validate_segment(s)?;
        Ok(Self(s.to_string()))
    }
}

name_conversions!(ChannelName);

/// Name of another node reachable through the sidecar.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct NodeName(String);

impl NodeName {
    /// Creates a `NodeName`, validating it is a single non-empty segment.
    ///
    /// # Errors
    /// Returns `ValidationError::EmptyName` if the name is blank.
    /// Returns `ValidationError::InvalidName` if the name contains `/`.
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        validate_segment(s)?;
        Ok(Self(s.to_string()))
    }
}

name_conversions!(NodeName);

/// Path of a request/response route, stored without its leading separator.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct RouteName(String);

impl RouteName {
    /// Creates a `RouteName`, stripping a single leading `/`.
    ///
    /// Inner separators are kept, so `"/v1/status"` becomes `"v1/status"`.
    ///
    /// # Errors
    /// Returns `ValidationError::EmptyName` if nothing is left after stripping.
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let path = s.strip_prefix('/').unwrap_or(s);
        if path.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(Self(path.to_string()))
    }

    /// Key under which the route lives in the handler registry.
    #[must_use]
    pub fn key(&self) -> String {
        format!("route/{}", self.0)
    }
}

name_conversions!(RouteName);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_name_new() {
        let name = ChannelName::new("orders").unwrap();
        assert_eq!(name.as_str(), "orders");
        assert_eq!(name.to_string(), "orders");
    }

    #[test]
    fn test_channel_name_empty() {
        assert_eq!(ChannelName::new(""), Err(ValidationError::EmptyName));
        assert_eq!(ChannelName::new("   "), Err(ValidationError::EmptyName));
    }

    #[test]
    fn test_channel_name_rejects_separator() {
        let result = ChannelName::new("a/b");
        assert!(matches!(result, Err(ValidationError::InvalidName(_))));
    }

    #[test]
    fn test_channel_name_keeps_reserved_characters() {
        for raw in ["orders?x=1", "orders#eu", "a%2Fb"] {
            assert_eq!(ChannelName::new(raw).unwrap().as_str(), raw);
        }
    }

    #[test]
    fn test_route_name_strips_single_leading_separator() {
        assert_eq!(RouteName::new("/status").unwrap().as_str(), "status");
        assert_eq!(RouteName::new("status").unwrap().as_str(), "status");
        assert_eq!(RouteName::new("//status").unwrap().as_str(), "/status");
        assert_eq!(RouteName::new("/v1/status").unwrap().as_str(), "v1/status");
    }

    #[test]
    fn test_route_name_key() {
        let route = RouteName::new("/status").unwrap();
        assert_eq!(route.key(), "route/status");
    }

    #[test]
    fn test_route_name_empty() {
        assert_eq!(RouteName::new("/"), Err(ValidationError::EmptyName));
        assert_eq!(RouteName::new(""), Err(ValidationError::EmptyName));
    }

    #[test]
    fn test_node_name_try_from() {
        let node = NodeName::try_from("nodeB").unwrap();
        assert_eq!(node.into_string(), "nodeB");
        assert!(NodeName::try_from(String::new()).is_err());
    }

    #[test]
    fn test_validation_error_display() {
        assert_eq!(ValidationError::EmptyName.to_string(), "Name cannot be empty");
        assert_eq!(
            ValidationError::InvalidName("a/b".into()).to_string(),
            "Invalid name 'a/b': must not contain '/'"
        );
    }
}
