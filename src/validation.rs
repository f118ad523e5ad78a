//! Request-parameter gates.
//!
//! A gate is a pure check over a single string: it either accepts the value
//! or refuses it with a [`ValidationError`]. Gates hold no state and do no
//! I/O, so they can be shared freely between concurrent requests and chained
//! into a [`Pipeline`] without knowing about each other.

use std::{fmt, sync::Arc};

use uuid::{Uuid, Variant};

use crate::error::ValidationError;

/// Length of the canonical 8-4-4-4-12 rendering.
const HYPHENATED_LEN: usize = 36;

pub trait Gate: Send + Sync {
    /// Accept `input` or explain why it was refused.
    fn check(&self, input: &str) -> Result<(), ValidationError>;
}

impl<F> Gate for F
where
    F: Fn(&str) -> Result<(), ValidationError> + Send + Sync,
{
    fn check(&self, input: &str) -> Result<(), ValidationError> {
        self(input)
    }
}

/// How strict the UUID gate is about version and variant.
///
/// Every rule only accepts the hyphenated textual form; hex digits may be
/// upper or lower case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UuidRule {
    /// Any 8-4-4-4-12 hex string, including the nil UUID.
    Any,
    /// RFC 4122 variant with a version between 1 and 5.
    #[default]
    Rfc4122,
    /// RFC 4122 variant with exactly this version.
    Version(u8),
}

impl UuidRule {
    pub fn accepts(&self, input: &str) -> bool {
        // `Uuid::parse_str` also takes the simple, braced and urn forms
        if input.len() != HYPHENATED_LEN {
            return false;
        }

        let uuid = match Uuid::parse_str(input) {
            Ok(uuid) => uuid,
            Err(_) => return false,
        };

        match self {
            UuidRule::Any => true,
            UuidRule::Rfc4122 => {
                uuid.get_variant() == Variant::RFC4122
                    && (1..=5).contains(&uuid.get_version_num())
            }
            UuidRule::Version(version) => {
                uuid.get_variant() == Variant::RFC4122
                    && uuid.get_version_num() == usize::from(*version)
            }
        }
    }
}

impl Gate for UuidRule {
    fn check(&self, input: &str) -> Result<(), ValidationError> {
        if self.accepts(input) {
            Ok(())
        } else {
            Err(ValidationError::malformed("UUID", input))
        }
    }
}

/// Check `input` against the default UUID rule and hand it back untouched.
pub fn validate_uuid(input: &str) -> Result<String, ValidationError> {
    UuidRule::default().check(input)?;
    Ok(input.to_owned())
}

/// An ordered chain of gates. The first gate to refuse the input decides the
/// error and the remaining gates are skipped.
#[derive(Clone, Default)]
pub struct Pipeline {
    gates: Vec<Arc<dyn Gate>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// A pipeline holding only the default UUID gate.
    pub fn uuid() -> Self {
        Self::new().with(UuidRule::default())
    }

    pub fn with(mut self, gate: impl Gate + 'static) -> Self {
        self.gates.push(Arc::new(gate));
        self
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    pub fn run(&self, input: String) -> Result<String, ValidationError> {
        self.check(&input)?;
        Ok(input)
    }
}

impl Gate for Pipeline {
    fn check(&self, input: &str) -> Result<(), ValidationError> {
        self.gates.iter().try_for_each(|gate| gate.check(input))
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("gates", &self.gates.len())
            .finish()
    }
}
