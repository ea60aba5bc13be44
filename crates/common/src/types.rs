use serde::{Deserialize, Serialize};

/// Declares a string-backed identifier newtype.
///
/// Each identifier is a distinct type so a `UserId` can never be passed where
/// a `TicketId` is expected, while still serializing as a bare JSON string.
macro_rules! branded_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from any string-like value.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the identifier, returning the inner string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

branded_id!(
    /// Unique identifier of a ticket aggregate.
    TicketId
);

branded_id!(
    /// Unique identifier of a comment on a ticket.
    CommentId
);

branded_id!(
    /// Identifier of a staff user (reporter, assignee, comment author).
    UserId
);

branded_id!(
    /// Identifier of a customer, resolved by the customer-identity context.
    CustomerId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_preserve_their_value() {
        let id = TicketId::new("t-1");
        assert_eq!(id.as_str(), "t-1");
        assert_eq!(id.to_string(), "t-1");
        assert_eq!(id.into_inner(), "t-1".to_string());
    }

    #[test]
    fn ids_convert_from_strings() {
        let user: UserId = "u1".into();
        let customer: CustomerId = String::from("c9").into();
        assert_eq!(user.as_ref(), "u1");
        assert_eq!(customer.as_str(), "c9");
    }

    #[test]
    fn ids_serialize_as_bare_strings() {
        let id = CommentId::new("comment-7");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"comment-7\"");

        let back: CommentId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
