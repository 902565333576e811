/// Bond order, including the unresolved aromatic state.
///
/// A molecule entering dearomatization carries `Aromatic` orders on the
/// bonds of its aromatic systems; realizing a Kekulé assignment rewrites
/// those to `Single`/`Double` in place. `Zero` encodes a connectivity-only
/// bond (e.g. from a tautomer super-structure) and is ignored by group
/// detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondOrder {
    /// Order-less connectivity bond. Ignored entirely.
    Zero,
    /// A single bond (bond order 1).
    #[default]
    Single,
    /// A double bond (bond order 2).
    Double,
    /// A triple bond (bond order 3).
    Triple,
    /// An aromatic bond awaiting a concrete single/double assignment.
    Aromatic,
}

impl BondOrder {
    /// Contribution to an atom's valence. An aromatic bond counts as one;
    /// connectivity budgets account for its possible second order
    /// separately.
    pub fn valence_contribution(self) -> u8 {
        match self {
            Self::Zero => 0,
            Self::Single | Self::Aromatic => 1,
            Self::Double => 2,
            Self::Triple => 3,
        }
    }
}

/// Default bond type for a molecular graph edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bond {
    /// The bond order, possibly aromatic.
    pub order: BondOrder,
}

impl Bond {
    pub fn new(order: BondOrder) -> Self {
        Self { order }
    }
}

impl crate::traits::HasBondOrder for Bond {
    fn bond_order(&self) -> BondOrder {
        self.order
    }
}
