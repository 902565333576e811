use crate::atom::Radical;

/// Outer-shell electron count ("group number" for main-group elements),
/// indexed by atomic number.
static OUTER_ELECTRONS: [u8; 119] = [
    0,  // dummy
    1, 2,                                                      // H  He
    1, 2, 3, 4, 5, 6, 7, 8,                                    // Li Be B  C  N  O  F  Ne
    1, 2, 3, 4, 5, 6, 7, 8,                                    // Na Mg Al Si P  S  Cl Ar
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 3, 4, 5, 6, 7, 8,  // K  Ca Sc..Zn Ga Ge As Se Br Kr
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 3, 4, 5, 6, 7, 8,  // Rb Sr Y ..Cd In Sn Sb Te I  Xe
    1, 2,                                                      // Cs Ba
    3, 4, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14,             // La Ce..Yb
    3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 3, 4, 5, 6, 7, 8,         // Lu Hf..Hg Tl Pb Bi Po At Rn
    1, 2,                                                      // Fr Ra
    3, 4, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14,             // Ac Th..No
    3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 3, 4, 5, 6, 7, 8,         // Lr Rf..Cn Nh Fl Mc Lv Ts Og
];

/// Outer-shell electron count for an element, 0 if unknown.
pub fn group_number(atomic_num: u8) -> i32 {
    OUTER_ELECTRONS
        .get(atomic_num as usize)
        .copied()
        .unwrap_or(0) as i32
}

/// Period of an element in the periodic table.
pub fn period(atomic_num: u8) -> u8 {
    match atomic_num {
        0 => 0,
        1..=2 => 1,
        3..=10 => 2,
        11..=18 => 3,
        19..=36 => 4,
        37..=54 => 5,
        55..=86 => 6,
        _ => 7,
    }
}

/// Number of bonding orbitals on the outer shell.
///
/// Period-1 elements have only the s orbital; period-2 elements s + 3p.
/// From period 3 on, d orbitals may be counted in when the caller allows
/// hypervalence.
fn orbitals(atomic_num: u8, use_d_orbitals: bool) -> i32 {
    match period(atomic_num) {
        1 => 1,
        2 => 4,
        _ => {
            if use_d_orbitals {
                9
            } else {
                4
            }
        }
    }
}

/// Maximum number of connections (sigma bonds plus extra bond orders) an
/// atom of the given element, charge, and radical state can carry.
///
/// Negative results are possible for nonsensical charge states; callers
/// treat a negative remaining budget as an internal error.
pub fn maximum_connectivity(
    atomic_num: u8,
    charge: i8,
    radical: Radical,
    use_d_orbitals: bool,
) -> i32 {
    let electrons = group_number(atomic_num) - charge as i32 - radical.electrons();
    let orbitals = orbitals(atomic_num, use_d_orbitals);
    if electrons <= orbitals {
        electrons
    } else {
        2 * orbitals - electrons
    }
}

/// Vacant π orbitals and lone pairs of an atom, given its outer-shell
/// electron count and connectivity.
///
/// Returns `(vacant, lone_pairs)`. An atom with either quantity positive
/// has a free choice between donating a lone pair into the ring and
/// carrying a double bond, which is what makes it a heteroatom for the
/// enumeration.
pub fn vacant_pi_orbitals(
    group_number: i32,
    charge: i8,
    radical: Radical,
    connectivity: i32,
) -> (i32, i32) {
    let electrons = group_number - charge as i32 - radical.electrons();
    let lone_pairs = ((electrons - connectivity) / 2).max(0);
    let vacant = (4 - connectivity - lone_pairs - radical.orbitals()).max(0);
    (vacant, lone_pairs)
}
