use std::fmt;
use std::io;

/// Errors reported by the dearomatization machinery.
///
/// Unsupported requests (fixing a triple bond, operating on storage in
/// [`NoDearomatizations`](crate::storage::DearomatizationMode::NoDearomatizations)
/// mode) are reported as `false` returns on the relevant operations, not as
/// errors.
#[derive(Debug)]
pub enum Error {
    /// An internal invariant was violated: negative connectivity budget,
    /// missing atom label on a group atom, mismatched fix state, or a
    /// heteroatom-state expansion whose matching no longer exists.
    Internal(&'static str),
    /// A storage append or load violated the append-only, group-ordered
    /// layout.
    Ordering(&'static str),
    /// The configured assignment cap was hit during enumeration.
    BudgetExceeded,
    /// Transport failure during binary save/load.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal(msg) => write!(f, "internal error: {}", msg),
            Self::Ordering(msg) => write!(f, "storage ordering violated: {}", msg),
            Self::BudgetExceeded => write!(f, "dearomatization budget exceeded"),
            Self::Io(e) => write!(f, "i/o error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
