//! Kekulé structure machinery for aromatic molecular graphs.
//!
//! A molecule whose aromatic systems carry [`BondOrder::Aromatic`] bonds
//! can be *dearomatized*: every maximal connected aromatic subgraph (a
//! *group*) admits zero or more assignments of alternating single/double
//! orders consistent with each atom's valence. This crate enumerates those
//! assignments as perfect matchings ([`Dearomatizer`]), stores them
//! bit-packed ([`DearomatizationsStorage`]), realizes a chosen assignment
//! on the molecule ([`MoleculeDearomatizer`]), and answers online
//! bond-fixing queries against the stored set
//! ([`DearomatizationMatcher`]).

pub mod aromatize;
pub mod atom;
pub mod bits;
pub mod bond;
pub mod dearomatize;
pub mod element;
pub mod error;
pub mod groups;
pub mod matcher;
pub mod matching;
pub mod mol;
pub mod rings;
pub mod storage;
pub mod traits;

pub use atom::{Aromaticity, Atom, Radical};
pub use bond::{Bond, BondOrder};
pub use dearomatize::{Dearomatizer, GrayCodes, MoleculeDearomatizer};
pub use error::Error;
pub use groups::AromaticGroups;
pub use matcher::DearomatizationMatcher;
pub use matching::{AlternatingPath, MatchConstraints, Matching, MatchingGraph};
pub use mol::Mol;
pub use storage::{DearomatizationMode, DearomatizationsStorage};
pub use traits::{
    HasAromaticity, HasAtomicNum, HasBondOrder, HasFormalCharge, HasHydrogenCount, HasRadical,
};

#[cfg(test)]
pub(crate) mod testkit;
