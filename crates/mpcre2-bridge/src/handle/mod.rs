//! Handles: the host's view of engine resources
//!
//! The host has no pointer type, so every engine object it holds is a
//! decimal token. A token does not carry an address. It names a slot in the
//! bridge's `HandleTable` together with the slot's generation:
//!
//! ```text
//! token = decimal( generation << 32 | slot )
//! ```
//!
//! Generations start at 1 and advance whenever a slot is freed, so a token
//! kept after its resource was freed is reported as stale instead of reaching
//! the engine.

pub mod codec;
pub mod table;

use std::fmt;
use thiserror::Error;

pub use table::{HandleTable, Resource, ResourceKind};

/// Generation counter for detecting stale tokens
pub type Generation = u32;

/// Reserved generation values
pub mod generation {
    use super::Generation;

    /// Never issued; a token carrying it is invalid
    pub const UNINITIALIZED: Generation = 0;
    /// First valid generation
    pub const FIRST: Generation = 1;
}

/// Handle errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandleError {
    /// Not a decimal number
    #[error("Cannot convert {0} to a pointer")]
    Malformed(String),

    /// Well-formed but never issued by this bridge
    #[error("handle {0} does not name a bridge resource")]
    Invalid(String),

    /// Issued, but the resource has since been freed
    #[error("handle {0} refers to a resource that was already freed")]
    Stale(String),

    #[error("handle {token} names a {actual}, expected a {expected}")]
    KindMismatch {
        token: String,
        expected: ResourceKind,
        actual: ResourceKind,
    },

    /// A sentinel was passed where a resource is mandatory
    #[error("a {0} handle is required here")]
    Required(ResourceKind),

    /// The default general context belongs to the bridge
    #[error("handle {0} is owned by the bridge and cannot be freed")]
    Pinned(String),
}

/// A generation-tagged reference to a table slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: Generation,
}

impl Handle {
    pub(crate) fn new(index: u32, generation: Generation) -> Self {
        Self { index, generation }
    }

    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> Generation {
        self.generation
    }

    fn to_bits(self) -> u64 {
        (u64::from(self.generation) << 32) | u64::from(self.index)
    }

    fn from_bits(bits: u64) -> Self {
        Self {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }

    /// The token handed to the host
    pub fn token(self) -> String {
        codec::encode(self.to_bits())
    }

    /// Parse a host token; sentinels yield `None`
    pub fn parse(token: &str) -> Result<Option<Self>, HandleError> {
        Ok(codec::decode(token)?.map(Self::from_bits))
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_bits())
    }
}
