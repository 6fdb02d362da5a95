use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};
use thiserror::Error;
use uuid::Uuid;

/// Identifier of the sentinel project that receives tasks of deleted projects.
pub const INBOX_PROJECT_ID: &str = "inbox";

/// Error raised when parsing an identifier from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// The input was empty or whitespace only.
    #[error("{kind} must not be empty")]
    Empty {
        /// Identifier type that failed to parse.
        kind: &'static str,
    },
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh identifier (UUID v7 text).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            /// Borrow the identifier text.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(IdError::Empty { kind: $kind });
                }
                Ok(Self(trimmed.to_owned()))
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                s.serialize_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(d: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let s = String::deserialize(d)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

string_id!(
    /// Identifier of a task.
    TaskId,
    "task id"
);
string_id!(
    /// Identifier of a project. The sentinel `inbox` id is a regular value.
    ProjectId,
    "project id"
);
string_id!(
    /// Identifier of a label.
    LabelId,
    "label id"
);
string_id!(
    /// Identifier of a subtask, unique within its task.
    SubtaskId,
    "subtask id"
);
string_id!(
    /// Identifier of a comment.
    CommentId,
    "comment id"
);
string_id!(
    /// Identifier of a user (creator, assignee, comment author, owner).
    UserId,
    "user id"
);
string_id!(
    /// Reference to an attachment stored outside the task state.
    AttachmentId,
    "attachment id"
);

impl ProjectId {
    /// The sentinel inbox project id.
    #[must_use]
    pub fn inbox() -> Self {
        Self(INBOX_PROJECT_ID.to_owned())
    }

    /// Whether this id refers to the inbox sentinel.
    #[must_use]
    pub fn is_inbox(&self) -> bool {
        self.0 == INBOX_PROJECT_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_are_uuid_v7() {
        let id = TaskId::new();
        let parsed = Uuid::parse_str(id.as_str())
            .unwrap_or_else(|err| panic!("fresh id must be a uuid: {err}"));
        assert_eq!(parsed.get_version_num(), 7);
    }

    #[test]
    fn existing_ids_are_kept_verbatim() {
        let id: LabelId = "label-1"
            .parse()
            .unwrap_or_else(|err| panic!("must parse label id: {err}"));
        assert_eq!(id.as_str(), "label-1");
        assert_eq!(id.to_string(), "label-1");
    }

    #[test]
    fn blank_ids_are_rejected() {
        assert_eq!(
            "  ".parse::<TaskId>(),
            Err(IdError::Empty { kind: "task id" })
        );
        assert!(serde_json::from_str::<ProjectId>("\"\"").is_err());
    }

    #[test]
    fn inbox_sentinel_round_trips() {
        let inbox = ProjectId::inbox();
        assert!(inbox.is_inbox());
        let parsed: ProjectId = "inbox"
            .parse()
            .unwrap_or_else(|err| panic!("must parse inbox: {err}"));
        assert_eq!(parsed, inbox);
        assert!(!ProjectId::new().is_inbox());
    }
}
