//! Hückel aromaticity perception over concrete bond orders.
//!
//! The dearomatization engine uses this as a verifier: a candidate Kekulé
//! assignment is applied to the group submolecule and accepted only if
//! every group bond is perceived aromatic again.

use std::collections::HashSet;

use petgraph::graph::NodeIndex;

use crate::bond::BondOrder;
use crate::element;
use crate::mol::Mol;
use crate::rings::RingInfo;
use crate::traits::{HasAtomicNum, HasBondOrder, HasFormalCharge, HasHydrogenCount, HasRadical};

const SP2_CAPABLE: [u8; 9] = [
    5,  // B
    6,  // C
    7,  // N
    8,  // O
    15, // P
    16, // S
    33, // As
    34, // Se
    52, // Te
];

/// Perceive aromatic bonds. Returns one flag per edge index.
///
/// Expects concrete (non-aromatic) bond orders; rings containing a bond
/// with an unresolved `Aromatic` order are never perceived aromatic.
pub fn aromatic_bonds<A, B>(mol: &Mol<A, B>) -> Vec<bool>
where
    A: HasAtomicNum + HasFormalCharge + HasRadical + HasHydrogenCount,
    B: HasBondOrder,
{
    let ring_info = RingInfo::sssr(mol);
    let rings = ring_info.rings();

    let mut atom_aromatic = vec![false; mol.atom_count()];
    let mut bond_aromatic = vec![false; mol.bond_count()];
    let mut accepted = vec![false; rings.len()];

    for (i, ring) in rings.iter().enumerate() {
        if is_aromatic_ring(mol, ring) {
            accepted[i] = true;
            mark_ring(mol, ring, &mut atom_aromatic, &mut bond_aromatic);
        }
    }

    for system in fused_ring_systems(rings) {
        if system.len() < 2 {
            continue;
        }
        loop {
            let mut changed = false;
            for &ring_idx in &system {
                if accepted[ring_idx] {
                    continue;
                }
                let ring = &rings[ring_idx];
                if is_aromatic_ring_in_fused_system(mol, ring, &atom_aromatic) {
                    accepted[ring_idx] = true;
                    mark_ring(mol, ring, &mut atom_aromatic, &mut bond_aromatic);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
    }

    bond_aromatic
}

fn mark_ring<A, B>(
    mol: &Mol<A, B>,
    ring: &[NodeIndex],
    atom_aromatic: &mut [bool],
    bond_aromatic: &mut [bool],
) {
    let len = ring.len();
    for i in 0..len {
        atom_aromatic[ring[i].index()] = true;
        if let Some(edge) = mol.bond_between(ring[i], ring[(i + 1) % len]) {
            bond_aromatic[edge.index()] = true;
        }
    }
}

fn fused_ring_systems(rings: &[Vec<NodeIndex>]) -> Vec<Vec<usize>> {
    let n = rings.len();
    let mut adj = vec![vec![false; n]; n];
    for i in 0..n {
        let set_i: HashSet<NodeIndex> = rings[i].iter().copied().collect();
        for j in (i + 1)..n {
            let shared = rings[j].iter().filter(|a| set_i.contains(a)).count();
            if shared >= 2 {
                adj[i][j] = true;
                adj[j][i] = true;
            }
        }
    }

    let mut visited = vec![false; n];
    let mut components = Vec::new();
    for i in 0..n {
        if visited[i] {
            continue;
        }
        let mut component = Vec::new();
        let mut stack = vec![i];
        while let Some(cur) = stack.pop() {
            if visited[cur] {
                continue;
            }
            visited[cur] = true;
            component.push(cur);
            for j in 0..n {
                if adj[cur][j] && !visited[j] {
                    stack.push(j);
                }
            }
        }
        components.push(component);
    }
    components
}

fn ring_preconditions<A, B>(mol: &Mol<A, B>, ring: &[NodeIndex]) -> bool
where
    A: HasAtomicNum + HasFormalCharge + HasRadical + HasHydrogenCount,
    B: HasBondOrder,
{
    if ring.len() < 3 {
        return false;
    }

    for &atom_idx in ring {
        if !SP2_CAPABLE.contains(&mol.atom(atom_idx).atomic_num()) {
            return false;
        }
    }

    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        if let Some(edge) = mol.bond_between(a, b) {
            let order = mol.bond(edge).bond_order();
            if order == BondOrder::Triple || order == BondOrder::Aromatic {
                return false;
            }
        }
    }

    true
}

fn is_aromatic_ring<A, B>(mol: &Mol<A, B>, ring: &[NodeIndex]) -> bool
where
    A: HasAtomicNum + HasFormalCharge + HasRadical + HasHydrogenCount,
    B: HasBondOrder,
{
    if !ring_preconditions(mol, ring) {
        return false;
    }

    let mut pi_total: u8 = 0;
    for (i, &atom_idx) in ring.iter().enumerate() {
        match pi_electrons(mol, atom_idx, ring, i) {
            Some(e) => pi_total = pi_total.saturating_add(e),
            None => return false,
        }
    }

    is_huckel(pi_total)
}

fn is_aromatic_ring_in_fused_system<A, B>(
    mol: &Mol<A, B>,
    ring: &[NodeIndex],
    atom_aromatic: &[bool],
) -> bool
where
    A: HasAtomicNum + HasFormalCharge + HasRadical + HasHydrogenCount,
    B: HasBondOrder,
{
    if !ring_preconditions(mol, ring) {
        return false;
    }
    ring.iter()
        .all(|&atom_idx| is_sp2_in_fused_system(mol, atom_idx, atom_aromatic))
}

fn is_sp2_in_fused_system<A, B>(mol: &Mol<A, B>, atom_idx: NodeIndex, atom_aromatic: &[bool]) -> bool
where
    A: HasAtomicNum + HasFormalCharge + HasRadical + HasHydrogenCount,
    B: HasBondOrder,
{
    if atom_aromatic[atom_idx.index()] {
        return true;
    }

    let atom = mol.atom(atom_idx);
    if atom.radical() != crate::atom::Radical::None || !within_valence(mol, atom_idx) {
        return false;
    }
    let anum = atom.atomic_num();
    let charge = atom.formal_charge();
    let has_double = has_any_double_bond(mol, atom_idx);
    let total_degree = mol.neighbors(atom_idx).count() as u8 + atom.hydrogen_count();

    match anum {
        6 => match charge {
            0 => has_double,
            1 | -1 => true,
            _ => false,
        },
        7 => match charge {
            0 => has_double || total_degree <= 3,
            1 => has_double,
            _ => false,
        },
        8 | 16 | 34 | 52 => true,
        5 => has_double,
        15 | 33 => has_double || total_degree <= 3,
        _ => false,
    }
}

fn pi_electrons<A, B>(
    mol: &Mol<A, B>,
    atom_idx: NodeIndex,
    ring: &[NodeIndex],
    pos_in_ring: usize,
) -> Option<u8>
where
    A: HasAtomicNum + HasFormalCharge + HasRadical + HasHydrogenCount,
    B: HasBondOrder,
{
    let atom = mol.atom(atom_idx);
    if atom.radical() != crate::atom::Radical::None {
        return None;
    }
    if !within_valence(mol, atom_idx) {
        return None;
    }

    let anum = atom.atomic_num();
    let charge = atom.formal_charge();

    let has_double = has_any_double_bond(mol, atom_idx);
    let has_double_in_ring = has_double_to_ring_neighbor(mol, atom_idx, ring, pos_in_ring);
    let total_degree = mol.neighbors(atom_idx).count() as u8 + atom.hydrogen_count();

    match anum {
        6 => match charge {
            0 => {
                if has_double_in_ring {
                    Some(1)
                } else {
                    None
                }
            }
            -1 => Some(2),
            1 => {
                if has_double {
                    Some(1)
                } else {
                    Some(0)
                }
            }
            _ => None,
        },
        7 => match charge {
            0 => {
                if has_double {
                    Some(1)
                } else if total_degree <= 3 {
                    Some(2)
                } else {
                    None
                }
            }
            1 => {
                if has_double_in_ring {
                    Some(1)
                } else {
                    None
                }
            }
            _ => None,
        },
        8 | 16 | 34 | 52 => {
            if has_double_in_ring {
                Some(1)
            } else {
                Some(2)
            }
        }
        5 => {
            if has_double {
                Some(1)
            } else {
                Some(0)
            }
        }
        15 | 33 => {
            if has_double {
                Some(1)
            } else if total_degree <= 3 {
                Some(2)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Concrete valence (bond orders plus suppressed hydrogens) must not exceed
/// the element's connectivity budget. Over-valent atoms contribute no π
/// electrons, which rejects assignments that put a double bond on an atom
/// whose hydrogens already saturate it.
fn within_valence<A, B>(mol: &Mol<A, B>, atom_idx: NodeIndex) -> bool
where
    A: HasAtomicNum + HasFormalCharge + HasRadical + HasHydrogenCount,
    B: HasBondOrder,
{
    let atom = mol.atom(atom_idx);
    let order_sum: i32 = mol
        .bonds_of(atom_idx)
        .map(|e| mol.bond(e).bond_order().valence_contribution() as i32)
        .sum();
    let total = order_sum + atom.hydrogen_count() as i32;
    total
        <= element::maximum_connectivity(
            atom.atomic_num(),
            atom.formal_charge(),
            atom.radical(),
            false,
        )
}

fn has_any_double_bond<A, B>(mol: &Mol<A, B>, atom_idx: NodeIndex) -> bool
where
    B: HasBondOrder,
{
    mol.bonds_of(atom_idx)
        .any(|e| mol.bond(e).bond_order() == BondOrder::Double)
}

fn has_double_to_ring_neighbor<A, B>(
    mol: &Mol<A, B>,
    atom_idx: NodeIndex,
    ring: &[NodeIndex],
    pos_in_ring: usize,
) -> bool
where
    B: HasBondOrder,
{
    let len = ring.len();
    let prev = ring[(pos_in_ring + len - 1) % len];
    let next = ring[(pos_in_ring + 1) % len];

    for neighbor in [prev, next] {
        if let Some(edge) = mol.bond_between(atom_idx, neighbor) {
            if mol.bond(edge).bond_order() == BondOrder::Double {
                return true;
            }
        }
    }
    false
}

fn is_huckel(pi_electrons: u8) -> bool {
    if pi_electrons < 2 {
        return false;
    }
    (pi_electrons - 2).is_multiple_of(4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Atom;
    use crate::bond::Bond;

    fn carbon(h: u8) -> Atom {
        Atom {
            atomic_num: 6,
            hydrogen_count: h,
            ..Atom::default()
        }
    }

    fn ring_mol(atoms: Vec<Atom>, orders: &[BondOrder]) -> Mol<Atom, Bond> {
        let mut mol = Mol::new();
        let n = atoms.len();
        let idx: Vec<_> = atoms.into_iter().map(|a| mol.add_atom(a)).collect();
        for i in 0..n {
            mol.add_bond(idx[i], idx[(i + 1) % n], Bond::new(orders[i]));
        }
        mol
    }

    #[test]
    fn kekulized_benzene_all_bonds_aromatic() {
        use BondOrder::{Double, Single};
        let mol = ring_mol(
            (0..6).map(|_| carbon(1)).collect(),
            &[Double, Single, Double, Single, Double, Single],
        );
        assert!(aromatic_bonds(&mol).iter().all(|&b| b));
    }

    #[test]
    fn cyclohexane_not_aromatic() {
        let mol = ring_mol((0..6).map(|_| carbon(2)).collect(), &[BondOrder::Single; 6]);
        assert!(aromatic_bonds(&mol).iter().all(|&b| !b));
    }

    #[test]
    fn cyclobutadiene_not_aromatic() {
        use BondOrder::{Double, Single};
        let mol = ring_mol(
            (0..4).map(|_| carbon(1)).collect(),
            &[Double, Single, Double, Single],
        );
        assert!(aromatic_bonds(&mol).iter().all(|&b| !b));
    }

    #[test]
    fn pyrrole_lone_pair_form_aromatic() {
        use BondOrder::{Double, Single};
        let mut atoms = vec![Atom {
            atomic_num: 7,
            hydrogen_count: 1,
            ..Atom::default()
        }];
        atoms.extend((0..4).map(|_| carbon(1)));
        // N-C2=C3-C4=C5-N
        let mol = ring_mol(atoms, &[Single, Double, Single, Double, Single]);
        assert!(aromatic_bonds(&mol).iter().all(|&b| b));
    }

    #[test]
    fn protonated_pyrrole_nitrogen_cannot_hold_double_bond() {
        use BondOrder::{Double, Single};
        let mut atoms = vec![Atom {
            atomic_num: 7,
            hydrogen_count: 1,
            ..Atom::default()
        }];
        atoms.extend((0..4).map(|_| carbon(1)));
        // N=C2-C3=C4-C5-N puts four bonds on the N-H.
        let mol = ring_mol(atoms, &[Double, Single, Double, Single, Single]);
        assert!(aromatic_bonds(&mol).iter().all(|&b| !b));
    }

    #[test]
    fn pyridine_aromatic() {
        use BondOrder::{Double, Single};
        let mut atoms = vec![Atom {
            atomic_num: 7,
            ..Atom::default()
        }];
        atoms.extend((0..5).map(|_| carbon(1)));
        let mol = ring_mol(atoms, &[Double, Single, Double, Single, Double, Single]);
        assert!(aromatic_bonds(&mol).iter().all(|&b| b));
    }

    #[test]
    fn furan_lone_pair_form_aromatic() {
        use BondOrder::{Double, Single};
        let mut atoms = vec![Atom {
            atomic_num: 8,
            ..Atom::default()
        }];
        atoms.extend((0..4).map(|_| carbon(1)));
        let mol = ring_mol(atoms, &[Single, Double, Single, Double, Single]);
        assert!(aromatic_bonds(&mol).iter().all(|&b| b));
    }

    #[test]
    fn radical_atom_blocks_perception() {
        use crate::atom::Radical;
        use BondOrder::{Double, Single};
        let mut atoms: Vec<Atom> = (0..6).map(|_| carbon(1)).collect();
        atoms[0].radical = Radical::Doublet;
        atoms[0].hydrogen_count = 0;
        let mol = ring_mol(atoms, &[Double, Single, Double, Single, Double, Single]);
        assert!(aromatic_bonds(&mol).iter().all(|&b| !b));
    }

    #[test]
    fn naphthalene_kekule_form_aromatic() {
        use BondOrder::{Double, Single};
        let mut mol = Mol::<Atom, Bond>::new();
        let h = [1, 1, 1, 1, 0, 0, 1, 1, 1, 1];
        let atoms: Vec<_> = h.iter().map(|&hc| mol.add_atom(carbon(hc))).collect();
        let bonds = [
            (0, 1, Double),
            (1, 2, Single),
            (2, 3, Double),
            (3, 4, Single),
            (4, 5, Double),
            (5, 0, Single),
            (4, 6, Single),
            (6, 7, Double),
            (7, 8, Single),
            (8, 9, Double),
            (9, 5, Single),
        ];
        for (a, b, o) in bonds {
            mol.add_bond(atoms[a], atoms[b], Bond::new(o));
        }
        assert!(aromatic_bonds(&mol).iter().all(|&b| b));
    }

    #[test]
    fn huckel_rule() {
        assert!(!is_huckel(0));
        assert!(!is_huckel(1));
        assert!(is_huckel(2));
        assert!(!is_huckel(4));
        assert!(is_huckel(6));
        assert!(!is_huckel(8));
        assert!(is_huckel(10));
        assert!(is_huckel(14));
    }
}
