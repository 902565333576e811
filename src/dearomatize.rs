//! Enumeration of Kekulé structures for the aromatic groups of a molecule.

use petgraph::graph::EdgeIndex;
use tracing::{debug, trace};

use crate::aromatize;
use crate::atom::Atom;
use crate::bits;
use crate::bond::{Bond, BondOrder};
use crate::error::Error;
use crate::groups::AromaticGroups;
use crate::matching::{AlternatingPath, MatchConstraints, Matching, MatchingGraph};
use crate::mol::Mol;
use crate::storage::{DearomatizationMode, DearomatizationsStorage};

/// Reflected Gray code over `bit_count` bits.
///
/// Successive codes differ in exactly one bit, so walking heteroatom
/// configurations needs only one fixation toggle per step. A zero-bit
/// enumeration yields a single (empty) code.
pub struct GrayCodes {
    counter: u64,
    end: u64,
    code: Vec<u8>,
    changed: usize,
}

impl GrayCodes {
    pub fn new(bit_count: usize) -> Result<Self, Error> {
        if bit_count >= 64 {
            return Err(Error::Internal("too many heteroatoms in one group"));
        }
        Ok(Self {
            counter: 0,
            end: 1u64 << bit_count,
            code: vec![0; bits::bytes_for(bit_count)],
            changed: 0,
        })
    }

    /// The current code as a packed bit row.
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn is_done(&self) -> bool {
        self.counter + 1 >= self.end
    }

    /// Advance to the next code; [`bit_change_index`](Self::bit_change_index)
    /// then names the single toggled bit. No effect past the end.
    pub fn next(&mut self) {
        if self.is_done() {
            self.counter = self.end;
            return;
        }
        self.counter += 1;
        self.changed = self.counter.trailing_zeros() as usize;
        let current = bits::get(&self.code, self.changed);
        bits::set(&mut self.code, self.changed, !current);
    }

    pub fn bit_change_index(&self) -> usize {
        self.changed
    }
}

/// Constraints for enumeration: explicitly pinned vertices and edges.
struct FixedSets<'a> {
    vertices: &'a [bool],
    edges: &'a [bool],
}

impl MatchConstraints for FixedSets<'_> {
    fn vertex_usable(&self, v: usize) -> bool {
        !self.vertices[v]
    }

    fn edge_usable(&self, e: usize) -> bool {
        !self.edges[e]
    }
}

/// Enumerates dearomatizations of a molecule into a
/// [`DearomatizationsStorage`].
///
/// The mode is instance state, fixed at construction. Per group, heteroatom
/// configurations are walked by reflected Gray code; each configuration
/// that admits a perfect matching and re-perceives as aromatic contributes
/// per the mode.
pub struct Dearomatizer<'m> {
    mol: &'m Mol<Atom, Bond>,
    groups: AromaticGroups,
    mode: DearomatizationMode,
    assignment_limit: Option<usize>,
}

impl<'m> Dearomatizer<'m> {
    pub fn new(
        mol: &'m Mol<Atom, Bond>,
        external_conn: Option<&[i32]>,
        mode: DearomatizationMode,
    ) -> Result<Self, Error> {
        let groups = AromaticGroups::detect(mol, external_conn)?;
        Ok(Self {
            mol,
            groups,
            mode,
            assignment_limit: None,
        })
    }

    /// Cap the total number of stored rows; enumeration past the cap fails
    /// with [`Error::BudgetExceeded`]. Unlimited by default.
    pub fn set_assignment_limit(&mut self, limit: Option<usize>) {
        self.assignment_limit = limit;
    }

    pub fn groups(&self) -> &AromaticGroups {
        &self.groups
    }

    /// Enumerate all groups into `storage`, replacing its contents.
    pub fn enumerate(&self, storage: &mut DearomatizationsStorage) -> Result<(), Error> {
        storage.clear();
        if self.groups.group_count() == 0 {
            return Ok(());
        }
        storage.set_mode(self.mode);
        storage.set_groups_count(self.groups.group_count());
        self.groups.construct_groups(self.mol, storage, true)?;

        let mut emitted = 0usize;
        for group in 0..self.groups.group_count() {
            self.enumerate_group(group, storage, &mut emitted)?;
        }
        Ok(())
    }

    fn enumerate_group(
        &self,
        group: usize,
        storage: &mut DearomatizationsStorage,
        emitted: &mut usize,
    ) -> Result<(), Error> {
        let data = self.groups.group_data(self.mol, group, true)?;
        debug!(
            group,
            vertices = data.vertices.len(),
            bonds = data.bonds.len(),
            heteroatoms = data.hetero_atoms.len(),
            "enumerating aromatic group"
        );

        let mut local_of = vec![usize::MAX; self.mol.atom_count()];
        for (i, &v) in data.vertices.iter().enumerate() {
            local_of[v.index()] = i;
        }

        // Submolecule: group vertices plus the aromatic edges, local edge
        // index i aligned with bit i of the stored rows.
        let mut sub = Mol::<Atom, Bond>::new();
        for &v in &data.vertices {
            sub.add_atom(self.mol.atom(v).clone());
        }
        let mut local_edges = Vec::with_capacity(data.bonds.len());
        for &e in &data.bonds {
            let (a, b) = self.mol.bond_endpoints(e).expect("group edge");
            let (la, lb) = (local_of[a.index()], local_of[b.index()]);
            sub.add_bond(
                petgraph::graph::NodeIndex::new(la),
                petgraph::graph::NodeIndex::new(lb),
                Bond::new(BondOrder::Aromatic),
            );
            local_edges.push((la, lb));
        }
        let graph = MatchingGraph::new(data.vertices.len(), local_edges);

        let mut vertices_fixed: Vec<bool> = data
            .vertices
            .iter()
            .map(|&v| !self.groups.accepts_double(v))
            .collect();
        let hetero_local: Vec<usize> = data
            .hetero_atoms
            .iter()
            .map(|&h| local_of[h.index()])
            .collect();
        // Heteroatoms start pinned in their lone-pair role.
        for &h in &hetero_local {
            vertices_fixed[h] = true;
        }
        let mut edges_fixed = vec![false; graph.edge_count()];

        let mut matching = Matching::new(&graph);
        let mut gray = GrayCodes::new(hetero_local.len())?;

        loop {
            let covered = matching.find_perfect(&FixedSets {
                vertices: &vertices_fixed,
                edges: &edges_fixed,
            });
            if covered {
                self.process_matching(
                    group,
                    &mut sub,
                    &graph,
                    &mut matching,
                    &mut vertices_fixed,
                    &mut edges_fixed,
                    gray.code(),
                    storage,
                    emitted,
                )?;
            }

            if gray.is_done() {
                break;
            }
            gray.next();
            let h = hetero_local[gray.bit_change_index()];
            if vertices_fixed[h] {
                vertices_fixed[h] = false;
            } else {
                if matching.is_vertex_matched(h) {
                    matching.remove_vertex(h);
                }
                vertices_fixed[h] = true;
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn process_matching(
        &self,
        group: usize,
        sub: &mut Mol<Atom, Bond>,
        graph: &MatchingGraph,
        matching: &mut Matching<'_>,
        vertices_fixed: &mut [bool],
        edges_fixed: &mut [bool],
        hetero_state: &[u8],
        storage: &mut DearomatizationsStorage,
        emitted: &mut usize,
    ) -> Result<(), Error> {
        for e in 0..graph.edge_count() {
            sub.bond_mut(EdgeIndex::new(e)).order = if matching.is_edge_matched(e) {
                BondOrder::Double
            } else {
                BondOrder::Single
            };
        }
        if !aromatize::aromatic_bonds(sub).iter().all(|&a| a) {
            trace!(group, "candidate assignment fails re-aromatization");
            return Ok(());
        }

        match self.mode {
            DearomatizationMode::SaveOne => {
                self.emit(storage, group, &matching.edges_state(), emitted)
            }
            DearomatizationMode::SaveJustHeteroatoms => {
                *emitted += 1;
                self.check_budget(*emitted)?;
                storage.add_group_hetero_atoms_state(group, hetero_state)
            }
            DearomatizationMode::SaveAll => self.enumerate_equivalent(
                group,
                graph,
                matching,
                vertices_fixed,
                edges_fixed,
                storage,
                emitted,
            ),
            DearomatizationMode::NoDearomatizations => Ok(()),
        }
    }

    /// Emit every perfect matching reachable from the current one by
    /// alternating-cycle swaps, honoring pinned vertices and fixed edges.
    ///
    /// For each matched edge that closes an alternating cycle the
    /// recursion branches: keep the edge (pin its endpoints) or swap the
    /// cycle (fix the edge out). The recursion is driven by an explicit
    /// frame stack; restores run when the frames unwind.
    #[allow(clippy::too_many_arguments)]
    fn enumerate_equivalent(
        &self,
        group: usize,
        graph: &MatchingGraph,
        matching: &mut Matching<'_>,
        vertices_fixed: &mut [bool],
        edges_fixed: &mut [bool],
        storage: &mut DearomatizationsStorage,
        emitted: &mut usize,
    ) -> Result<(), Error> {
        enum Frame {
            Enter,
            SwapBranch {
                edge: usize,
                u: usize,
                v: usize,
                path: AlternatingPath,
            },
            Restore {
                edge: usize,
                path: AlternatingPath,
            },
        }

        let mut stack = vec![Frame::Enter];
        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter => {
                    let found = (0..graph.edge_count()).find_map(|e| {
                        if edges_fixed[e] || !matching.is_edge_matched(e) {
                            return None;
                        }
                        let (u, v) = graph.endpoints(e);
                        matching
                            .find_alternating_path(
                                u,
                                v,
                                false,
                                false,
                                &FixedSets {
                                    vertices: vertices_fixed,
                                    edges: edges_fixed,
                                },
                            )
                            .map(|path| (e, u, v, path))
                    });

                    match found {
                        None => self.emit(storage, group, &matching.edges_state(), emitted)?,
                        Some((edge, u, v, path)) => {
                            // Keep the strong edge: endpoints pinned.
                            vertices_fixed[u] = true;
                            vertices_fixed[v] = true;
                            stack.push(Frame::SwapBranch { edge, u, v, path });
                            stack.push(Frame::Enter);
                        }
                    }
                }
                Frame::SwapBranch { edge, u, v, path } => {
                    vertices_fixed[u] = false;
                    vertices_fixed[v] = false;
                    // Swap the cycle: the strong edge leaves the matching
                    // and may not come back in this branch.
                    matching.set_edge_matched(edge, false);
                    matching.apply_path(&path);
                    edges_fixed[edge] = true;
                    stack.push(Frame::Restore { edge, path });
                    stack.push(Frame::Enter);
                }
                Frame::Restore { edge, path } => {
                    edges_fixed[edge] = false;
                    matching.apply_path(&path);
                    matching.set_edge_matched(edge, true);
                }
            }
        }
        Ok(())
    }

    fn emit(
        &self,
        storage: &mut DearomatizationsStorage,
        group: usize,
        row: &[u8],
        emitted: &mut usize,
    ) -> Result<(), Error> {
        *emitted += 1;
        self.check_budget(*emitted)?;
        trace!(group, "storing assignment");
        storage.add_group_dearomatization(group, row)
    }

    fn check_budget(&self, emitted: usize) -> Result<(), Error> {
        match self.assignment_limit {
            Some(limit) if emitted > limit => Err(Error::BudgetExceeded),
            _ => Ok(()),
        }
    }
}

/// Applies stored assignments back onto the molecule.
pub struct MoleculeDearomatizer<'a> {
    mol: &'a mut Mol<Atom, Bond>,
    storage: &'a DearomatizationsStorage,
}

impl<'a> MoleculeDearomatizer<'a> {
    pub fn new(mol: &'a mut Mol<Atom, Bond>, storage: &'a DearomatizationsStorage) -> Self {
        Self { mol, storage }
    }

    /// Rewrite the group's aromatic bonds to the single/double orders of
    /// the chosen stored assignment.
    pub fn dearomatize_group(&mut self, group: usize, index: usize) {
        let row = self.storage.group_dearomatization(group, index);
        for (i, &e) in self.storage.group_bonds(group).iter().enumerate() {
            self.mol.bond_mut(e).order = if bits::get(row, i) {
                BondOrder::Double
            } else {
                BondOrder::Single
            };
        }
    }

    /// Enumerate one assignment per group and realize it. Returns whether
    /// every group produced an assignment.
    pub fn dearomatize_molecule(mol: &mut Mol<Atom, Bond>) -> Result<bool, Error> {
        let mut storage = DearomatizationsStorage::new();
        {
            let dearomatizer = Dearomatizer::new(mol, None, DearomatizationMode::SaveOne)?;
            dearomatizer.enumerate(&mut storage)?;
        }

        let mut all_dearomatized = true;
        let mut applier = MoleculeDearomatizer::new(mol, &storage);
        for group in 0..storage.groups_count() {
            if storage.group_dearomatizations_count(group) != 0 {
                applier.dearomatize_group(group, 0);
            } else {
                all_dearomatized = false;
            }
        }
        Ok(all_dearomatized)
    }
}
