//! Branded ID newtypes.
//!
//! [`CorrelationId`] joins one bridge request to its response. It follows the
//! `req_<unix-millis>_<suffix>` shape the plugin already logs, with a 7 char
//! lowercase alphanumeric suffix drawn from the thread RNG.
//!
//! [`ConnectionId`] names one accepted plugin socket (UUID v7, time-ordered).

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const SUFFIX_LEN: usize = 7;
const SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

macro_rules! branded_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create from an existing string value.
            #[must_use]
            pub fn from_string(s: String) -> Self {
                Self(s)
            }

            /// Return the inner string as a slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

branded_id! {
    /// Correlation token carried by a request and echoed by its response.
    CorrelationId
}

branded_id! {
    /// Identifier for one accepted plugin WebSocket.
    ConnectionId
}

impl CorrelationId {
    /// Generate a fresh `req_<millis>_<suffix>` id.
    #[must_use]
    pub fn generate() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis());
        let mut rng = rand::rng();
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| char::from(SUFFIX_ALPHABET[rng.random_range(0..SUFFIX_ALPHABET.len())]))
            .collect();
        Self(format!("req_{millis}_{suffix}"))
    }
}

impl ConnectionId {
    /// Create a new connection id (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(format!("conn_{}", Uuid::now_v7().simple()))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn correlation_id_shape() {
        let id = CorrelationId::generate();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "req");
        assert!(parts[1].parse::<u128>().is_ok());
        assert_eq!(parts[2].len(), SUFFIX_LEN);
        assert!(parts[2].bytes().all(|b| SUFFIX_ALPHABET.contains(&b)));
    }

    #[test]
    fn correlation_ids_do_not_collide() {
        let ids: HashSet<CorrelationId> = (0..1_000).map(|_| CorrelationId::generate()).collect();
        assert_eq!(ids.len(), 1_000);
    }

    #[test]
    fn connection_id_prefix() {
        let id = ConnectionId::new();
        assert!(id.as_str().starts_with("conn_"));
        assert_ne!(id, ConnectionId::new());
    }

    #[test]
    fn display_and_deref() {
        let id = CorrelationId::from("req_1_abc");
        assert_eq!(format!("{id}"), "req_1_abc");
        let s: &str = &id;
        assert_eq!(s, "req_1_abc");
    }

    #[test]
    fn serde_is_transparent() {
        let id = CorrelationId::from("req_42_zzzzzzz");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"req_42_zzzzzzz\"");
        let back: CorrelationId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn into_string() {
        let id = ConnectionId::from("conn_x");
        let s: String = id.into();
        assert_eq!(s, "conn_x");
    }
}
