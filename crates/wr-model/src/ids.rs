//! Identifier newtypes
//!
//! Every identifier in the report backend is an opaque string. Wrapping them
//! keeps a document id from being passed where a problem id is expected.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier
            #[inline]
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw identifier
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the identifier is the empty string
            #[inline]
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Identifier of a request (a batch of scanned forms)
    RequestId
);

string_id!(
    /// Identifier of one scanned document within a request
    DocumentId
);

string_id!(
    /// Identifier of one problem instance on a document
    ProblemId
);

string_id!(
    /// Upstream-assigned identifier of a common-problem group
    GroupKey
);

string_id!(
    /// Upstream-assigned identifier of a ward section in the ward-wise report
    WardId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_display_raw_value() {
        let id = RequestId::new("req-1");
        assert_eq!(id.to_string(), "req-1");
        assert_eq!(id.as_str(), "req-1");
    }

    #[test]
    fn ids_serialize_transparently() {
        let id = DocumentId::from("doc-7");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"doc-7\"");

        let back: DocumentId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
