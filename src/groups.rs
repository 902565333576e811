//! Partition of a molecule into maximal connected aromatic subgraphs.

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::atom::Aromaticity;
use crate::bond::BondOrder;
use crate::element;
use crate::error::Error;
use crate::mol::Mol;
use crate::storage::DearomatizationsStorage;
use crate::traits::{HasAromaticity, HasAtomicNum, HasBondOrder, HasFormalCharge, HasRadical};

/// The aromatic-group partition of a molecule.
///
/// Every aromatic, labeled, non-aliphatic atom belongs to exactly one
/// group; groups are numbered in discovery order. Alongside the partition
/// this records, per atom, whether its connectivity budget leaves room for
/// an incident double bond (`accepts_double`).
pub struct AromaticGroups {
    group_of: Vec<Option<usize>>,
    accepts_double: Vec<bool>,
    group_count: usize,
}

/// Extracted structure of one group.
#[derive(Debug, Clone, Default)]
pub struct GroupData {
    /// Group vertices in molecule iteration order.
    pub vertices: Vec<NodeIndex>,
    /// Aromatic bonds of the group; position defines the local bond index.
    pub bonds: Vec<EdgeIndex>,
    /// Molecule edge index to local bond index.
    pub bonds_inv: Vec<Option<usize>>,
    /// Group vertices that can either donate a lone pair or carry a double
    /// bond, making their role a free choice.
    pub hetero_atoms: Vec<NodeIndex>,
}

/// Group structure rebuilt from a populated storage rather than from the
/// molecule; used when expanding heteroatom-state storage.
#[derive(Debug, Clone, Default)]
pub struct StoredGroupData {
    /// Group vertices in first-seen order along the stored bond list.
    pub vertices: Vec<NodeIndex>,
    /// Molecule edge index to local bond index.
    pub bonds_inv: Vec<Option<usize>>,
    /// Molecule vertex index to local heteroatom index.
    pub hetero_inv: Vec<Option<usize>>,
}

impl AromaticGroups {
    /// Partition the molecule.
    ///
    /// `external_conn` supplies per-vertex connectivity contributions not
    /// visible in the graph (e.g. attachment points of a super-structure).
    /// Fails if some atom's non-aromatic connections already exceed its
    /// element's connectivity budget.
    pub fn detect<A, B>(mol: &Mol<A, B>, external_conn: Option<&[i32]>) -> Result<Self, Error>
    where
        A: HasAtomicNum + HasFormalCharge + HasRadical + HasAromaticity,
        B: HasBondOrder,
    {
        let n = mol.atom_count();
        let mut group_of: Vec<Option<usize>> = vec![None; n];
        let mut accepts_double = vec![false; n];
        let mut group_count = 0;

        let mut stack: Vec<NodeIndex> = Vec::new();
        for start in mol.atoms() {
            if group_of[start.index()].is_some() {
                continue;
            }
            let atom = mol.atom(start);
            if atom.aromaticity() == Aromaticity::Aliphatic || atom.atomic_num() == 0 {
                continue;
            }

            let group = group_count;
            group_count += 1;
            group_of[start.index()] = Some(group);
            stack.push(start);

            while let Some(v) = stack.pop() {
                let mut non_aromatic_conn = external_conn.map_or(0, |ec| ec[v.index()]);
                for e in mol.bonds_of(v) {
                    let order = mol.bond(e).bond_order();
                    match order {
                        // Connectivity-only bonds carry no order at all.
                        BondOrder::Zero => continue,
                        BondOrder::Aromatic => {
                            non_aromatic_conn += 1;
                            let (a, b) = mol.bond_endpoints(e).expect("live edge");
                            let w = if a == v { b } else { a };
                            if group_of[w.index()].is_none() {
                                group_of[w.index()] = Some(group);
                                stack.push(w);
                            }
                        }
                        _ => non_aromatic_conn += order.valence_contribution() as i32,
                    }
                }

                let atom = mol.atom(v);
                let max_connectivity = element::maximum_connectivity(
                    atom.atomic_num(),
                    atom.formal_charge(),
                    atom.radical(),
                    true,
                );
                let budget = max_connectivity - non_aromatic_conn;
                if budget < 0 {
                    return Err(Error::Internal("negative aromatic connectivity budget"));
                }
                accepts_double[v.index()] = budget > 0;
            }
        }

        Ok(Self {
            group_of,
            accepts_double,
            group_count,
        })
    }

    pub fn group_count(&self) -> usize {
        self.group_count
    }

    pub fn group_of(&self, v: NodeIndex) -> Option<usize> {
        self.group_of[v.index()]
    }

    pub fn accepts_double(&self, v: NodeIndex) -> bool {
        self.accepts_double[v.index()]
    }

    /// Extract the structure of one group. Heteroatom classification is
    /// optional because it queries the element tables per vertex.
    pub fn group_data<A, B>(
        &self,
        mol: &Mol<A, B>,
        group: usize,
        need_heteroatoms: bool,
    ) -> Result<GroupData, Error>
    where
        A: HasAtomicNum + HasFormalCharge + HasRadical,
        B: HasBondOrder,
    {
        let mut data = GroupData {
            bonds_inv: vec![None; mol.bond_count()],
            ..GroupData::default()
        };

        for v in mol.atoms() {
            if self.group_of[v.index()] != Some(group) {
                continue;
            }
            data.vertices.push(v);

            if need_heteroatoms {
                let atom = mol.atom(v);
                let label = atom.atomic_num();
                if label == 0 {
                    return Err(Error::Internal("missing atom label in aromatic group"));
                }
                let charge = atom.formal_charge();
                let radical = atom.radical();

                let max_connectivity =
                    element::maximum_connectivity(label, charge, radical, false);
                let (vacant, lone_pairs) = element::vacant_pi_orbitals(
                    element::group_number(label),
                    charge,
                    radical,
                    max_connectivity,
                );

                if self.accepts_double[v.index()] && (vacant > 0 || lone_pairs > 0) {
                    data.hetero_atoms.push(v);
                }
            }
        }

        for e in mol.bonds() {
            if mol.bond(e).bond_order() != BondOrder::Aromatic {
                continue;
            }
            let (beg, _) = mol.bond_endpoints(e).expect("live edge");
            if self.group_of[beg.index()] == Some(group) {
                data.bonds_inv[e.index()] = Some(data.bonds.len());
                data.bonds.push(e);
            }
        }

        Ok(data)
    }

    /// Write the group structure (bond lists and, when requested,
    /// heteroatom lists) into a storage.
    pub fn construct_groups<A, B>(
        &self,
        mol: &Mol<A, B>,
        storage: &mut DearomatizationsStorage,
        need_heteroatoms: bool,
    ) -> Result<(), Error>
    where
        A: HasAtomicNum + HasFormalCharge + HasRadical,
        B: HasBondOrder,
    {
        if storage.groups_count() == 0 && self.group_count != 0 {
            storage.set_groups_count(self.group_count);
        }
        storage.clear_indices();

        for group in 0..self.group_count {
            let data = self.group_data(mol, group, need_heteroatoms)?;
            storage.set_group(group, &data.bonds, &data.hetero_atoms)?;
        }
        Ok(())
    }

    /// Rebuild vertex and index mappings of a group from a storage that
    /// already carries its bond (and heteroatom) lists.
    pub fn stored_group_data<A, B>(
        &self,
        mol: &Mol<A, B>,
        storage: &DearomatizationsStorage,
        group: usize,
    ) -> StoredGroupData {
        let mut data = StoredGroupData {
            bonds_inv: vec![None; mol.bond_count()],
            hetero_inv: vec![None; mol.atom_count()],
            ..StoredGroupData::default()
        };
        let mut seen = vec![false; mol.atom_count()];

        for (i, &e) in storage.group_bonds(group).iter().enumerate() {
            data.bonds_inv[e.index()] = Some(i);
            let (beg, end) = mol.bond_endpoints(e).expect("stored edge");
            for v in [beg, end] {
                if !seen[v.index()] {
                    seen[v.index()] = true;
                    data.vertices.push(v);
                }
            }
        }

        for (i, &h) in storage.group_hetero_atoms(group).iter().enumerate() {
            data.hetero_inv[h.index()] = Some(i);
        }

        data
    }
}
