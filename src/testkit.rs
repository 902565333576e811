//! Programmatically built molecules shared by the unit tests.
//!
//! Every builder produces a molecule the way it would look after
//! aromaticity perception: ring bonds carry `BondOrder::Aromatic`, ring
//! atoms are flagged `Aromatic`, everything else `Aliphatic`.

use petgraph::graph::NodeIndex;

use crate::atom::{Aromaticity, Atom};
use crate::bond::{Bond, BondOrder};
use crate::mol::Mol;

fn aromatic_atom(atomic_num: u8, hydrogen_count: u8) -> Atom {
    Atom {
        atomic_num,
        hydrogen_count,
        aromaticity: Aromaticity::Aromatic,
        ..Atom::default()
    }
}

fn close_aromatic_ring(mol: &mut Mol<Atom, Bond>, ring: &[NodeIndex]) {
    for i in 0..ring.len() {
        mol.add_bond(
            ring[i],
            ring[(i + 1) % ring.len()],
            Bond::new(BondOrder::Aromatic),
        );
    }
}

pub(crate) fn benzene() -> Mol<Atom, Bond> {
    let mut mol = Mol::new();
    let ring: Vec<_> = (0..6).map(|_| mol.add_atom(aromatic_atom(6, 1))).collect();
    close_aromatic_ring(&mut mol, &ring);
    mol
}

pub(crate) fn pyridine() -> Mol<Atom, Bond> {
    let mut mol = Mol::new();
    let mut ring = vec![mol.add_atom(aromatic_atom(7, 0))];
    ring.extend((0..5).map(|_| mol.add_atom(aromatic_atom(6, 1))));
    close_aromatic_ring(&mut mol, &ring);
    mol
}

pub(crate) fn pyrrole() -> Mol<Atom, Bond> {
    let mut mol = Mol::new();
    let mut ring = vec![mol.add_atom(aromatic_atom(7, 1))];
    ring.extend((0..4).map(|_| mol.add_atom(aromatic_atom(6, 1))));
    close_aromatic_ring(&mut mol, &ring);
    mol
}

pub(crate) fn furan() -> Mol<Atom, Bond> {
    let mut mol = Mol::new();
    let mut ring = vec![mol.add_atom(aromatic_atom(8, 0))];
    ring.extend((0..4).map(|_| mol.add_atom(aromatic_atom(6, 1))));
    close_aromatic_ring(&mut mol, &ring);
    mol
}

pub(crate) fn thiophene() -> Mol<Atom, Bond> {
    let mut mol = Mol::new();
    let mut ring = vec![mol.add_atom(aromatic_atom(16, 0))];
    ring.extend((0..4).map(|_| mol.add_atom(aromatic_atom(6, 1))));
    close_aromatic_ring(&mut mol, &ring);
    mol
}

pub(crate) fn imidazole() -> Mol<Atom, Bond> {
    let mut mol = Mol::new();
    let ring = vec![
        mol.add_atom(aromatic_atom(7, 1)), // N1-H
        mol.add_atom(aromatic_atom(6, 1)),
        mol.add_atom(aromatic_atom(7, 0)), // N3
        mol.add_atom(aromatic_atom(6, 1)),
        mol.add_atom(aromatic_atom(6, 1)),
    ];
    close_aromatic_ring(&mut mol, &ring);
    mol
}

/// Two fused six-rings; atoms 4 and 5 are the bridgeheads.
pub(crate) fn naphthalene() -> Mol<Atom, Bond> {
    let mut mol = Mol::new();
    let h = [1, 1, 1, 1, 0, 0, 1, 1, 1, 1];
    let atoms: Vec<_> = h.iter().map(|&hc| mol.add_atom(aromatic_atom(6, hc))).collect();
    for (a, b) in [
        (0, 1),
        (1, 2),
        (2, 3),
        (3, 4),
        (4, 5),
        (5, 0),
        (4, 6),
        (6, 7),
        (7, 8),
        (8, 9),
        (9, 5),
    ] {
        mol.add_bond(atoms[a], atoms[b], Bond::new(BondOrder::Aromatic));
    }
    mol
}

/// Three linearly fused six-rings; bridgeheads 4, 5, 7, 8.
pub(crate) fn anthracene() -> Mol<Atom, Bond> {
    let mut mol = Mol::new();
    let h = [1, 1, 1, 1, 0, 0, 1, 0, 0, 1, 1, 1, 1, 1];
    let atoms: Vec<_> = h.iter().map(|&hc| mol.add_atom(aromatic_atom(6, hc))).collect();
    for (a, b) in [
        (0, 1),
        (1, 2),
        (2, 3),
        (3, 4),
        (4, 5),
        (5, 0),
        (4, 6),
        (6, 7),
        (7, 8),
        (8, 9),
        (9, 5),
        (7, 10),
        (10, 11),
        (11, 12),
        (12, 13),
        (13, 8),
    ] {
        mol.add_bond(atoms[a], atoms[b], Bond::new(BondOrder::Aromatic));
    }
    mol
}

/// Two disjoint benzene rings joined by a single bond.
pub(crate) fn biphenyl() -> Mol<Atom, Bond> {
    let mut mol = Mol::new();
    let ring1: Vec<_> = (0..6)
        .map(|i| mol.add_atom(aromatic_atom(6, if i == 0 { 0 } else { 1 })))
        .collect();
    let ring2: Vec<_> = (0..6)
        .map(|i| mol.add_atom(aromatic_atom(6, if i == 0 { 0 } else { 1 })))
        .collect();
    close_aromatic_ring(&mut mol, &ring1);
    close_aromatic_ring(&mut mol, &ring2);
    mol.add_bond(ring1[0], ring2[0], Bond::new(BondOrder::Single));
    mol
}

/// Benzene with an exocyclic methyl group.
pub(crate) fn toluene() -> Mol<Atom, Bond> {
    let mut mol = Mol::new();
    let ring: Vec<_> = (0..6)
        .map(|i| mol.add_atom(aromatic_atom(6, if i == 0 { 0 } else { 1 })))
        .collect();
    close_aromatic_ring(&mut mol, &ring);
    let methyl = mol.add_atom(Atom {
        atomic_num: 6,
        hydrogen_count: 3,
        aromaticity: Aromaticity::Aliphatic,
        ..Atom::default()
    });
    mol.add_bond(ring[0], methyl, Bond::new(BondOrder::Single));
    mol
}
