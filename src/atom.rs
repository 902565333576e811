/// Radical state of an atom.
///
/// The electron and orbital bookkeeping in [`element`](crate::element)
/// depends on this: a doublet has one unpaired electron in one orbital, a
/// singlet two paired electrons in one orbital, a triplet two unpaired
/// electrons in two orbitals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Radical {
    /// Not a radical (the common case).
    #[default]
    None,
    /// Two paired electrons, one orbital.
    Singlet,
    /// One unpaired electron.
    Doublet,
    /// Two unpaired electrons, two orbitals.
    Triplet,
}

impl Radical {
    /// Electrons withdrawn from the bonding budget.
    pub fn electrons(self) -> i32 {
        match self {
            Self::None => 0,
            Self::Singlet | Self::Triplet => 2,
            Self::Doublet => 1,
        }
    }

    /// Orbitals occupied by the radical electrons.
    pub fn orbitals(self) -> i32 {
        match self {
            Self::None => 0,
            Self::Singlet | Self::Doublet => 1,
            Self::Triplet => 2,
        }
    }
}

/// Aromaticity classification of an atom.
///
/// Group detection skips atoms explicitly marked `Aliphatic`; `Unknown`
/// atoms participate (an aromatizer that ran before dearomatization will
/// have marked both sides explicitly).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Aromaticity {
    /// Member of a perceived aromatic system.
    Aromatic,
    /// Explicitly not aromatic.
    Aliphatic,
    /// Not yet classified.
    #[default]
    Unknown,
}

/// Default atom type for a molecular graph node.
///
/// Stores the intrinsic properties the dearomatization machinery consumes.
/// Computed properties (ring membership, group id) live elsewhere.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Atom {
    /// Atomic number (1 = H, 6 = C, 7 = N, …). `0` marks a pseudo or
    /// label-less atom; such atoms never join an aromatic group.
    pub atomic_num: u8,
    /// Formal charge in elementary charge units.
    pub formal_charge: i8,
    /// Radical state.
    pub radical: Radical,
    /// Number of suppressed hydrogens. Not graph nodes; they count toward
    /// valence when candidate assignments are verified.
    pub hydrogen_count: u8,
    /// Aromaticity flag set by a prior perception pass.
    pub aromaticity: Aromaticity,
}

impl crate::traits::HasAtomicNum for Atom {
    fn atomic_num(&self) -> u8 {
        self.atomic_num
    }
}

impl crate::traits::HasFormalCharge for Atom {
    fn formal_charge(&self) -> i8 {
        self.formal_charge
    }
}

impl crate::traits::HasRadical for Atom {
    fn radical(&self) -> Radical {
        self.radical
    }
}

impl crate::traits::HasHydrogenCount for Atom {
    fn hydrogen_count(&self) -> u8 {
        self.hydrogen_count
    }
}

impl crate::traits::HasAromaticity for Atom {
    fn aromaticity(&self) -> Aromaticity {
        self.aromaticity
    }
}
