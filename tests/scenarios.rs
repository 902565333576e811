use petgraph::graph::{EdgeIndex, NodeIndex};

use kekule::{
    Aromaticity, Atom, Bond, BondOrder, DearomatizationMatcher, DearomatizationMode,
    DearomatizationsStorage, Dearomatizer, Mol, MoleculeDearomatizer,
};

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn aromatic_atom(atomic_num: u8, hydrogen_count: u8) -> Atom {
    Atom {
        atomic_num,
        hydrogen_count,
        aromaticity: Aromaticity::Aromatic,
        ..Atom::default()
    }
}

fn aromatic_ring(mol: &mut Mol<Atom, Bond>, ring: &[NodeIndex]) {
    for i in 0..ring.len() {
        mol.add_bond(
            ring[i],
            ring[(i + 1) % ring.len()],
            Bond::new(BondOrder::Aromatic),
        );
    }
}

fn benzene() -> Mol<Atom, Bond> {
    let mut mol = Mol::new();
    let ring: Vec<_> = (0..6).map(|_| mol.add_atom(aromatic_atom(6, 1))).collect();
    aromatic_ring(&mut mol, &ring);
    mol
}

fn pyridine() -> Mol<Atom, Bond> {
    let mut mol = Mol::new();
    let mut ring = vec![mol.add_atom(aromatic_atom(7, 0))];
    ring.extend((0..5).map(|_| mol.add_atom(aromatic_atom(6, 1))));
    aromatic_ring(&mut mol, &ring);
    mol
}

fn furan() -> Mol<Atom, Bond> {
    let mut mol = Mol::new();
    let mut ring = vec![mol.add_atom(aromatic_atom(8, 0))];
    ring.extend((0..4).map(|_| mol.add_atom(aromatic_atom(6, 1))));
    aromatic_ring(&mut mol, &ring);
    mol
}

fn naphthalene() -> Mol<Atom, Bond> {
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

fn biphenyl() -> Mol<Atom, Bond> {
    let mut mol = Mol::new();
    let ring1: Vec<_> = (0..6)
        .map(|i| mol.add_atom(aromatic_atom(6, if i == 0 { 0 } else { 1 })))
        .collect();
    let ring2: Vec<_> = (0..6)
        .map(|i| mol.add_atom(aromatic_atom(6, if i == 0 { 0 } else { 1 })))
        .collect();
    aromatic_ring(&mut mol, &ring1);
    aromatic_ring(&mut mol, &ring2);
    mol.add_bond(ring1[0], ring2[0], Bond::new(BondOrder::Single));
    mol
}

fn enumerate(mol: &Mol<Atom, Bond>, mode: DearomatizationMode) -> DearomatizationsStorage {
    let mut storage = DearomatizationsStorage::new();
    Dearomatizer::new(mol, None, mode)
        .unwrap()
        .enumerate(&mut storage)
        .unwrap();
    storage
}

fn row_bit(row: &[u8], i: usize) -> bool {
    row[i / 8] & (1 << (i % 8)) != 0
}

// ---------------------------------------------------------------------------
// Scenario A: benzene
// ---------------------------------------------------------------------------

#[test]
fn benzene_save_one_is_alternating() {
    let mol = benzene();
    let storage = enumerate(&mol, DearomatizationMode::SaveOne);
    assert_eq!(storage.groups_count(), 1);
    assert_eq!(storage.group_bonds_count(0), 6);
    assert_eq!(storage.group_dearomatizations_count(0), 1);

    let row = storage.group_dearomatization(0, 0);
    assert_eq!((0..6).filter(|&i| row_bit(row, i)).count(), 3);
    for i in 0..6 {
        assert!(!(row_bit(row, i) && row_bit(row, (i + 1) % 6)));
    }
}

#[test]
fn benzene_save_all_is_a_complementary_pair() {
    let mol = benzene();
    let storage = enumerate(&mol, DearomatizationMode::SaveAll);
    assert_eq!(storage.group_dearomatizations_count(0), 2);
    let a = storage.group_dearomatization(0, 0)[0];
    let b = storage.group_dearomatization(0, 1)[0];
    assert_eq!(a ^ b, 0b0011_1111);
}

#[test]
fn benzene_save_all_every_bond_fixable_to_double() {
    let mol = benzene();
    let mut storage = enumerate(&mol, DearomatizationMode::SaveAll);
    let mut matcher = DearomatizationMatcher::new(&mut storage, &mol, None).unwrap();
    for e in mol.bonds().collect::<Vec<_>>() {
        assert!(matcher.is_able_to_fix_bond(e, BondOrder::Double).unwrap());
    }
}

// ---------------------------------------------------------------------------
// Scenario B: pyridine
// ---------------------------------------------------------------------------

#[test]
fn pyridine_counts_per_mode() {
    let mol = pyridine();

    let storage = enumerate(&mol, DearomatizationMode::SaveAll);
    assert_eq!(storage.group_dearomatizations_count(0), 2);

    // Only the participating nitrogen state admits a perfect matching.
    let storage = enumerate(&mol, DearomatizationMode::SaveJustHeteroatoms);
    assert_eq!(storage.group_hetero_atoms_count(0), 1);
    assert_eq!(storage.group_hetero_state_count(0), 1);
    assert_eq!(storage.group_hetero_state(0, 0), &[0b0000_0001]);

    let storage = enumerate(&mol, DearomatizationMode::SaveOne);
    assert!(storage.group_dearomatizations_count(0) >= 1);
}

// Heteroatom-state fidelity: the lazy expansion realizes the stored state.
#[test]
fn pyridine_expansion_matches_stored_state() {
    let mol = pyridine();
    let mut storage = enumerate(&mol, DearomatizationMode::SaveJustHeteroatoms);
    let nitrogen = mol.atoms().find(|&v| mol.atom(v).atomic_num == 7).unwrap();

    {
        let mut matcher = DearomatizationMatcher::new(&mut storage, &mol, None).unwrap();
        let edge = mol.bonds_of(nitrogen).next().unwrap();
        matcher.is_able_to_fix_bond(edge, BondOrder::Single).unwrap();
    }

    assert_eq!(storage.group_dearomatizations_count(0), 1);
    let row = storage.group_dearomatization(0, 0).to_vec();
    let nitrogen_doubles = storage
        .group_bonds(0)
        .iter()
        .enumerate()
        .filter(|&(i, &e)| {
            let (a, b) = mol.bond_endpoints(e).unwrap();
            (a == nitrogen || b == nitrogen) && row_bit(&row, i)
        })
        .count();
    assert_eq!(nitrogen_doubles, 1);
}

// ---------------------------------------------------------------------------
// Scenario C: naphthalene
// ---------------------------------------------------------------------------

#[test]
fn naphthalene_has_exactly_three_assignments() {
    let mol = naphthalene();
    let storage = enumerate(&mol, DearomatizationMode::SaveAll);
    assert_eq!(storage.groups_count(), 1);
    assert_eq!(storage.group_bonds_count(0), 11);
    assert_eq!(storage.group_dearomatizations_count(0), 3);
}

// Equivalence: a SaveAll answer is a pure lookup over the stored rows.
#[test]
fn naphthalene_fixability_agrees_with_stored_rows() {
    let mol = naphthalene();
    let mut storage = enumerate(&mol, DearomatizationMode::SaveAll);
    let rows: Vec<Vec<u8>> = (0..storage.group_dearomatizations_count(0))
        .map(|i| storage.group_dearomatization(0, i).to_vec())
        .collect();
    let bonds = storage.group_bonds(0).to_vec();

    let mut matcher = DearomatizationMatcher::new(&mut storage, &mol, None).unwrap();
    for (i, &e) in bonds.iter().enumerate() {
        let double_possible = rows.iter().any(|r| row_bit(r, i));
        let single_possible = rows.iter().any(|r| !row_bit(r, i));
        assert_eq!(
            matcher.is_able_to_fix_bond(e, BondOrder::Double).unwrap(),
            double_possible
        );
        assert_eq!(
            matcher.is_able_to_fix_bond(e, BondOrder::Single).unwrap(),
            single_possible
        );
    }
}

// ---------------------------------------------------------------------------
// Scenario D: furan
// ---------------------------------------------------------------------------

#[test]
fn furan_oxygen_stays_in_lone_pair_form() {
    let mol = furan();
    let storage = enumerate(&mol, DearomatizationMode::SaveOne);
    assert_eq!(storage.group_dearomatizations_count(0), 1);

    let oxygen = mol.atoms().find(|&v| mol.atom(v).atomic_num == 8).unwrap();
    let row = storage.group_dearomatization(0, 0);
    for (i, &e) in storage.group_bonds(0).iter().enumerate() {
        let (a, b) = mol.bond_endpoints(e).unwrap();
        if a == oxygen || b == oxygen {
            assert!(!row_bit(row, i));
        }
    }
}

// ---------------------------------------------------------------------------
// Scenario E: biphenyl
// ---------------------------------------------------------------------------

#[test]
fn biphenyl_dearomatizes_both_groups() {
    let mut mol = biphenyl();
    let storage = enumerate(&mol, DearomatizationMode::SaveOne);
    assert_eq!(storage.groups_count(), 2);
    assert_eq!(storage.group_dearomatizations_count(0), 1);
    assert_eq!(storage.group_dearomatizations_count(1), 1);

    assert!(MoleculeDearomatizer::dearomatize_molecule(&mut mol).unwrap());
    let doubles = mol
        .bonds()
        .filter(|&e| mol.bond(e).order == BondOrder::Double)
        .count();
    assert_eq!(doubles, 6);
    assert!(mol.bonds().all(|e| mol.bond(e).order != BondOrder::Aromatic));
}

// ---------------------------------------------------------------------------
// Scenario F: fix then unfix
// ---------------------------------------------------------------------------

#[test]
fn fix_blocks_adjacent_double_until_unfixed() {
    let mol = benzene();
    let mut storage = enumerate(&mol, DearomatizationMode::SaveOne);
    let mut matcher = DearomatizationMatcher::new(&mut storage, &mol, None).unwrap();
    let e0 = EdgeIndex::new(0);
    let e1 = EdgeIndex::new(1);

    assert!(matcher.is_able_to_fix_bond(e0, BondOrder::Double).unwrap());
    assert!(matcher.fix_bond(e0, BondOrder::Double).unwrap());
    assert!(!matcher.is_able_to_fix_bond(e1, BondOrder::Double).unwrap());
    matcher.unfix_bond(e0).unwrap();
    assert!(matcher.is_able_to_fix_bond(e1, BondOrder::Double).unwrap());
    assert!(matcher.fix_bond(e1, BondOrder::Double).unwrap());
}

#[test]
fn fix_unfix_round_trip_restores_acceptance() {
    let mol = naphthalene();
    let mut storage = enumerate(&mol, DearomatizationMode::SaveAll);
    let bonds: Vec<EdgeIndex> = mol.bonds().collect();
    let mut matcher = DearomatizationMatcher::new(&mut storage, &mol, None).unwrap();

    let baseline: Vec<(bool, bool)> = bonds
        .iter()
        .map(|&e| {
            (
                matcher.is_able_to_fix_bond(e, BondOrder::Single).unwrap(),
                matcher.is_able_to_fix_bond(e, BondOrder::Double).unwrap(),
            )
        })
        .collect();

    assert!(matcher.fix_bond(bonds[0], BondOrder::Double).unwrap());
    assert!(matcher.fix_bond(bonds[2], BondOrder::Double).unwrap());
    matcher.unfix_bond(bonds[0]).unwrap();
    matcher.unfix_bond(bonds[2]).unwrap();

    let restored: Vec<(bool, bool)> = bonds
        .iter()
        .map(|&e| {
            (
                matcher.is_able_to_fix_bond(e, BondOrder::Single).unwrap(),
                matcher.is_able_to_fix_bond(e, BondOrder::Double).unwrap(),
            )
        })
        .collect();
    assert_eq!(baseline, restored);
}

// ---------------------------------------------------------------------------
// Binary round trips
// ---------------------------------------------------------------------------

#[test]
fn save_all_round_trips_through_binary() {
    let mol = naphthalene();
    let storage = enumerate(&mol, DearomatizationMode::SaveAll);
    let mut buf = Vec::new();
    storage.save_binary(&mut buf).unwrap();

    // A fresh storage learns the group structure from the molecule, then
    // loads the rows.
    let mut restored = DearomatizationsStorage::new();
    restored.set_mode(DearomatizationMode::SaveAll);
    let groups = kekule::AromaticGroups::detect(&mol, None).unwrap();
    restored.set_groups_count(groups.group_count());
    groups.construct_groups(&mol, &mut restored, true).unwrap();
    restored.load_binary(&mut buf.as_slice()).unwrap();

    assert_eq!(restored.mode(), storage.mode());
    assert_eq!(
        restored.group_dearomatizations_count(0),
        storage.group_dearomatizations_count(0)
    );
    for i in 0..storage.group_dearomatizations_count(0) {
        assert_eq!(
            restored.group_dearomatization(0, i),
            storage.group_dearomatization(0, i)
        );
    }
}

#[test]
fn heteroatom_storage_round_trips_through_binary() {
    let mol = pyridine();
    let storage = enumerate(&mol, DearomatizationMode::SaveJustHeteroatoms);
    let mut buf = Vec::new();
    storage.save_binary(&mut buf).unwrap();

    let mut restored = DearomatizationsStorage::new();
    restored.set_mode(DearomatizationMode::SaveJustHeteroatoms);
    let groups = kekule::AromaticGroups::detect(&mol, None).unwrap();
    restored.set_groups_count(groups.group_count());
    groups.construct_groups(&mol, &mut restored, true).unwrap();
    restored.load_binary(&mut buf.as_slice()).unwrap();

    assert_eq!(restored.mode(), DearomatizationMode::SaveJustHeteroatoms);
    assert_eq!(restored.group_hetero_state_count(0), 1);
    assert_eq!(
        restored.group_hetero_state(0, 0),
        storage.group_hetero_state(0, 0)
    );
}

// Partition invariant: every aromatic bond's endpoints share one group.
#[test]
fn groups_partition_aromatic_bonds() {
    for mol in [benzene(), pyridine(), naphthalene(), biphenyl()] {
        let groups = kekule::AromaticGroups::detect(&mol, None).unwrap();
        for e in mol.bonds() {
            if mol.bond(e).order != BondOrder::Aromatic {
                continue;
            }
            let (a, b) = mol.bond_endpoints(e).unwrap();
            assert!(groups.group_of(a).is_some());
            assert_eq!(groups.group_of(a), groups.group_of(b));
        }
    }
}
