//! Newtype domain identifiers.
//!
//! Every domain concept that has an identity is represented as a distinct newtype
//! wrapping a primitive, so a [`StageId`] cannot be passed where a
//! [`PipelineName`] is expected even though both are strings under the hood.
//!
//! String identifiers wrap a `Cow<'static, str>` so the built-in pipeline
//! definitions can be declared as `const` items while identifiers read from
//! configuration or prompt files stay owned.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, const from_static(),
// as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Cow<'static, str>);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(Cow::Owned(v))) }
            }

            /// Creates an identifier from a string literal.
            ///
            /// Intended for `const` definitions; an empty literal is a
            /// programming error and fails const evaluation.
            pub const fn from_static(value: &'static str) -> Self {
                assert!(!value.is_empty(), "identifier literal must not be empty");
                Self(Cow::Borrowed(value))
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single pipeline execution run.
///
/// Generated fresh for every run; propagated through spans so all activity
/// from a single run can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PipelineRunId(Uuid);

impl PipelineRunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for PipelineRunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: string-backed
// ---------------------------------------------------------------------------

string_id! {
    /// Identifies a stage by its name within a pipeline definition
    /// (e.g. `"analysis"`, `"review"`).
    StageId
}

string_id! {
    /// Identifies a pipeline kind (e.g. `"bot"`, `"post"`).
    PipelineName
}

string_id! {
    /// A file-system path, relative to the output directory, that an
    /// artifact is persisted to.
    ArtifactPath
}

string_id! {
    /// Identifies a prompt definition in the prompt library by its
    /// `prompt_id` field.
    PromptId
}
