//! Online bond fixing against stored dearomatizations.
//!
//! The matcher answers "can this aromatic bond be fixed to that order?"
//! and commits such fixes incrementally, keeping at least one stored
//! assignment (the active one) consistent with everything fixed so far.
//! Where necessary it modifies the active assignment in place via
//! augmenting alternating paths, or switches to another stored assignment
//! after reconciling the fixed bonds one by one.

use petgraph::graph::{EdgeIndex, NodeIndex};
use tracing::debug;

use crate::atom::Atom;
use crate::bits;
use crate::bond::{Bond, BondOrder};
use crate::error::Error;
use crate::groups::AromaticGroups;
use crate::matching::{MatchConstraints, Matching, MatchingGraph};
use crate::mol::Mol;
use crate::storage::{DearomatizationMode, DearomatizationsStorage};

#[derive(Debug, Clone, Copy)]
struct GroupInfo {
    /// Byte offset of this group's rows in the fixed-bond masks.
    offset: usize,
    /// Index of the stored assignment currently consistent with the
    /// fixed bonds.
    active: usize,
    /// Heteroatom-state rows still await expansion into assignments.
    needs_expansion: bool,
}

/// Edge usability from a packed fixed-bond mask over local bond indices.
struct MaskedEdges<'a> {
    mask: &'a [u8],
}

impl MatchConstraints for MaskedEdges<'_> {
    fn edge_usable(&self, e: usize) -> bool {
        !bits::get(self.mask, e)
    }
}

/// Vertex usability for heteroatom-state expansion: heteroatoms follow the
/// state row (bit set = participates in a double bond), other vertices
/// follow their connectivity budget.
struct HeteroStateVertices<'a> {
    hetero_of: &'a [Option<usize>],
    accepts: &'a [bool],
    state: &'a [u8],
}

impl MatchConstraints for HeteroStateVertices<'_> {
    fn vertex_usable(&self, v: usize) -> bool {
        match self.hetero_of[v] {
            Some(h) => bits::get(self.state, h),
            None => self.accepts[v],
        }
    }
}

/// Incremental bond-fixing layer over a populated storage.
pub struct DearomatizationMatcher<'a> {
    mol: &'a Mol<Atom, Bond>,
    storage: &'a mut DearomatizationsStorage,
    groups: AromaticGroups,
    prepared: bool,
    group_info: Vec<GroupInfo>,
    edge_group: Vec<Option<(usize, usize)>>,
    matched_edges: Vec<u8>,
    matched_edges_state: Vec<u8>,
    vertices_fix_count: Vec<u32>,
    last_accepted: Option<(EdgeIndex, BondOrder)>,
}

impl<'a> DearomatizationMatcher<'a> {
    pub fn new(
        storage: &'a mut DearomatizationsStorage,
        mol: &'a Mol<Atom, Bond>,
        external_conn: Option<&[i32]>,
    ) -> Result<Self, Error> {
        let groups = AromaticGroups::detect(mol, external_conn)?;
        Ok(Self {
            mol,
            storage,
            groups,
            prepared: false,
            group_info: Vec::new(),
            edge_group: Vec::new(),
            matched_edges: Vec::new(),
            matched_edges_state: Vec::new(),
            vertices_fix_count: Vec::new(),
            last_accepted: None,
        })
    }

    /// Whether `edge` may be fixed to `order` consistently with the
    /// already-fixed bonds and some stored assignment. A `true` answer
    /// arms [`fix_bond`](Self::fix_bond) for the same pair.
    ///
    /// Triple bonds are unsupported and report `false`, as does an edge
    /// outside every aromatic group or a storage without dearomatizations.
    pub fn is_able_to_fix_bond(
        &mut self,
        edge: EdgeIndex,
        order: BondOrder,
    ) -> Result<bool, Error> {
        if self.storage.mode() == DearomatizationMode::NoDearomatizations {
            return Ok(false);
        }
        if order != BondOrder::Single && order != BondOrder::Double {
            return Ok(false);
        }
        self.ensure_prepared()?;

        let Some((group, local)) = self.edge_group[edge.index()] else {
            return Ok(false);
        };
        self.prepare_group(group)?;
        if self.storage.group_dearomatizations_count(group) == 0 {
            return Ok(false);
        }

        let desired = order == BondOrder::Double;

        // A committed bond constrains itself: the only acceptable order is
        // the one it was fixed to.
        let offset = self.group_info[group].offset;
        let width = bits::bytes_for(self.storage.group_bonds_count(group));
        if bits::get(&self.matched_edges[offset..offset + width], local) {
            let agrees =
                bits::get(&self.matched_edges_state[offset..offset + width], local) == desired;
            if agrees {
                self.last_accepted = Some((edge, order));
            }
            return Ok(agrees);
        }
        let accepted = if self.storage.mode() == DearomatizationMode::SaveAll {
            self.scan_stored_assignments(group, local, desired)
        } else {
            self.adapt_active_assignment(group, local, desired)?
        };
        if accepted {
            self.last_accepted = Some((edge, order));
        }
        Ok(accepted)
    }

    // SaveAll: every assignment is stored, so fixing is a pure lookup —
    // temporarily treat the bond as fixed and scan for a row agreeing on
    // all fixed positions, starting at the active index.
    fn scan_stored_assignments(&mut self, group: usize, local: usize, desired: bool) -> bool {
        let offset = self.group_info[group].offset;
        let width = bits::bytes_for(self.storage.group_bonds_count(group));
        let nbits = self.storage.group_bonds_count(group);

        let fixed = &mut self.matched_edges[offset..offset + width];
        bits::set(fixed, local, true);
        let state = &mut self.matched_edges_state[offset..offset + width];
        bits::set(state, local, desired);

        let count = self.storage.group_dearomatizations_count(group);
        let active = self.group_info[group].active;
        let mut found = None;
        for i in 0..count {
            let idx = (i + active) % count;
            let row = self.storage.group_dearomatization(group, idx);
            if bits::test_equality_by_mask(
                row,
                &self.matched_edges_state[offset..offset + width],
                &self.matched_edges[offset..offset + width],
                nbits,
            ) {
                found = Some(idx);
                break;
            }
        }

        bits::set(&mut self.matched_edges[offset..offset + width], local, false);
        match found {
            Some(idx) => {
                self.group_info[group].active = idx;
                true
            }
            None => false,
        }
    }

    // SaveOne (or expanded heteroatom storage): three attempts — the
    // active assignment may already agree, may be modified in place by an
    // augmenting path, or another stored assignment may be reconciled
    // with the fixed bonds and made active.
    fn adapt_active_assignment(
        &mut self,
        group: usize,
        local: usize,
        desired: bool,
    ) -> Result<bool, Error> {
        let offset = self.group_info[group].offset;
        let width = bits::bytes_for(self.storage.group_bonds_count(group));
        let active = self.group_info[group].active;

        if bits::get(self.storage.group_dearomatization(group, active), local) == desired {
            bits::set(
                &mut self.matched_edges_state[offset..offset + width],
                local,
                desired,
            );
            return Ok(true);
        }

        let topology = self.group_topology(group);
        let fixed = self.matched_edges[offset..offset + width].to_vec();
        if self.fix_bond_in_matching(group, active, local, desired, &fixed, &topology)? {
            bits::set(
                &mut self.matched_edges_state[offset..offset + width],
                local,
                desired,
            );
            debug!(group, local, desired, "active assignment adapted in place");
            return Ok(true);
        }

        bits::set(&mut self.matched_edges[offset..offset + width], local, true);
        bits::set(
            &mut self.matched_edges_state[offset..offset + width],
            local,
            desired,
        );

        let count = self.storage.group_dearomatizations_count(group);
        for i in 0..count.saturating_sub(1) {
            let candidate = (i + 1 + active) % count;
            if self.reconcile_candidate(group, candidate, &topology)? {
                bits::set(&mut self.matched_edges[offset..offset + width], local, false);
                self.group_info[group].active = candidate;
                debug!(group, candidate, "switched active assignment");
                return Ok(true);
            }
        }

        bits::set(&mut self.matched_edges[offset..offset + width], local, false);
        Ok(false)
    }

    /// Commit a fix. Requires an immediately preceding accepting
    /// [`is_able_to_fix_bond`](Self::is_able_to_fix_bond) for the same
    /// `(edge, order)`; calls it itself otherwise.
    pub fn fix_bond(&mut self, edge: EdgeIndex, order: BondOrder) -> Result<bool, Error> {
        if self.storage.mode() == DearomatizationMode::NoDearomatizations {
            return Ok(false);
        }
        self.ensure_prepared()?;
        let Some((group, local)) = self.edge_group[edge.index()] else {
            return Ok(false);
        };

        if self.last_accepted != Some((edge, order)) {
            if !self.is_able_to_fix_bond(edge, order)? {
                return Ok(false);
            }
            if self.last_accepted != Some((edge, order)) {
                return Err(Error::Internal("bond acceptance was not recorded"));
            }
        }

        let offset = self.group_info[group].offset;
        let width = bits::bytes_for(self.storage.group_bonds_count(group));
        if bits::get(&self.matched_edges_state[offset..offset + width], local)
            != (order == BondOrder::Double)
        {
            return Err(Error::Internal("fixed bond state disagrees with request"));
        }
        if bits::get(&self.matched_edges[offset..offset + width], local) {
            // Already committed with this order.
            self.last_accepted = None;
            return Ok(true);
        }
        bits::set(&mut self.matched_edges[offset..offset + width], local, true);

        let (a, b) = self.mol.bond_endpoints(edge).expect("live edge");
        self.vertices_fix_count[a.index()] += 1;
        self.vertices_fix_count[b.index()] += 1;
        self.last_accepted = None;
        Ok(true)
    }

    /// Release a fixed bond. The active assignment is left as is; the bond
    /// simply stops constraining later queries.
    pub fn unfix_bond(&mut self, edge: EdgeIndex) -> Result<(), Error> {
        if self.storage.mode() == DearomatizationMode::NoDearomatizations {
            return Ok(());
        }
        self.ensure_prepared()?;
        let Some((group, local)) = self.edge_group[edge.index()] else {
            return Ok(());
        };

        let offset = self.group_info[group].offset;
        let width = bits::bytes_for(self.storage.group_bonds_count(group));
        let fixed = &mut self.matched_edges[offset..offset + width];
        if !bits::get(fixed, local) {
            return Ok(());
        }
        bits::set(fixed, local, false);

        let (a, b) = self.mol.bond_endpoints(edge).expect("live edge");
        self.vertices_fix_count[a.index()] -= 1;
        self.vertices_fix_count[b.index()] -= 1;
        Ok(())
    }

    /// Release every fixed bond incident to an atom.
    pub fn unfix_bonds_by_atom(&mut self, atom: NodeIndex) -> Result<(), Error> {
        if self.storage.mode() == DearomatizationMode::NoDearomatizations {
            return Ok(());
        }
        self.ensure_prepared()?;
        if self.vertices_fix_count[atom.index()] == 0 {
            return Ok(());
        }
        let incident: Vec<EdgeIndex> = self.mol.bonds_of(atom).collect();
        for edge in incident {
            self.unfix_bond(edge)?;
        }
        Ok(())
    }

    /// Index of the assignment currently believed consistent for a group.
    pub fn active_assignment(&self, group: usize) -> usize {
        self.group_info[group].active
    }

    fn ensure_prepared(&mut self) -> Result<(), Error> {
        if self.prepared {
            return Ok(());
        }

        if self.storage.mode() == DearomatizationMode::SaveJustHeteroatoms {
            self.storage.clear_bonds_state();
            self.groups.construct_groups(self.mol, self.storage, true)?;
        } else {
            self.groups.construct_groups(self.mol, self.storage, false)?;
        }

        let groups_count = self.storage.groups_count();
        self.group_info = Vec::with_capacity(groups_count);
        self.edge_group = vec![None; self.mol.bond_count()];
        self.vertices_fix_count = vec![0; self.mol.atom_count()];

        let mut offset = 0;
        for group in 0..groups_count {
            self.group_info.push(GroupInfo {
                offset,
                active: 0,
                needs_expansion: self.storage.mode()
                    == DearomatizationMode::SaveJustHeteroatoms,
            });
            for (i, &e) in self.storage.group_bonds(group).iter().enumerate() {
                self.edge_group[e.index()] = Some((group, i));
            }
            offset += bits::bytes_for(self.storage.group_bonds_count(group));
        }

        self.matched_edges = vec![0; offset];
        self.matched_edges_state = vec![0; offset];
        self.last_accepted = None;
        self.prepared = true;
        Ok(())
    }

    // Heteroatom-state rows carry no bond assignments; materialize one
    // assignment per stored state on first touch of the group.
    fn prepare_group(&mut self, group: usize) -> Result<(), Error> {
        if !self.group_info[group].needs_expansion {
            return Ok(());
        }
        self.group_info[group].needs_expansion = false;

        if self.storage.group_hetero_atoms_count(group) != 0
            && self.storage.group_hetero_state_count(group) == 0
        {
            return Ok(());
        }

        let data = self.groups.stored_group_data(self.mol, self.storage, group);
        let topology = self.group_topology(group);
        let accepts: Vec<bool> = data
            .vertices
            .iter()
            .map(|&v| self.groups.accepts_double(v))
            .collect();
        let hetero_of: Vec<Option<usize>> = data
            .vertices
            .iter()
            .map(|&v| data.hetero_inv[v.index()])
            .collect();

        let count = self.storage.group_hetero_state_count(group);
        debug!(group, states = count, "expanding heteroatom states");
        let mut matching = Matching::new(&topology);
        let mut index = 0;
        loop {
            let state = if count != 0 {
                self.storage.group_hetero_state(group, index).to_vec()
            } else {
                Vec::new()
            };
            let usable = HeteroStateVertices {
                hetero_of: &hetero_of,
                accepts: &accepts,
                state: &state,
            };
            if !matching.find_perfect(&usable) {
                return Err(Error::Internal(
                    "stored heteroatom state admits no matching",
                ));
            }
            self.storage
                .add_group_dearomatization(group, &matching.edges_state())?;
            matching.reset();

            index += 1;
            if index >= count {
                break;
            }
        }
        Ok(())
    }

    // Local-index topology of a group, vertices in first-seen order along
    // the stored bond list.
    fn group_topology(&self, group: usize) -> MatchingGraph {
        let mut local_of = vec![usize::MAX; self.mol.atom_count()];
        let mut vertex_count = 0;
        let mut edges = Vec::with_capacity(self.storage.group_bonds_count(group));
        for &e in self.storage.group_bonds(group) {
            let (a, b) = self.mol.bond_endpoints(e).expect("stored edge");
            for v in [a, b] {
                if local_of[v.index()] == usize::MAX {
                    local_of[v.index()] = vertex_count;
                    vertex_count += 1;
                }
            }
            edges.push((local_of[a.index()], local_of[b.index()]));
        }
        MatchingGraph::new(vertex_count, edges)
    }

    // Force local bond `local` of a stored assignment to the desired
    // state by finding an alternating path between its endpoints (both
    // parities strong for a double, weak for a single) and XOR-ing it.
    // Bonds selected by `mask` may not change state. The modified row is
    // written back to storage and persists.
    fn fix_bond_in_matching(
        &mut self,
        group: usize,
        assignment: usize,
        local: usize,
        desired: bool,
        mask: &[u8],
        topology: &MatchingGraph,
    ) -> Result<bool, Error> {
        let row = self.storage.group_dearomatization(group, assignment).to_vec();
        let mut matching = Matching::new(topology);
        matching.load_edges_state(&row);

        let (u, v) = topology.endpoints(local);
        let Some(path) =
            matching.find_alternating_path(u, v, desired, desired, &MaskedEdges { mask })
        else {
            return Ok(false);
        };

        if desired {
            matching.apply_path(&path);
            matching.set_edge_matched(local, true);
        } else {
            matching.set_edge_matched(local, false);
            matching.apply_path(&path);
        }

        self.storage
            .assignment_slice_mut(group, assignment)
            .copy_from_slice(&matching.edges_state());
        Ok(true)
    }

    // Try to massage a candidate assignment into agreeing with every
    // fixed bond. Disagreements are repaired one at a time; bonds already
    // agreeing (or repaired) are frozen so a later repair cannot undo
    // them. Each successful repair strictly shrinks the disagreement set.
    fn reconcile_candidate(
        &mut self,
        group: usize,
        candidate: usize,
        topology: &MatchingGraph,
    ) -> Result<bool, Error> {
        let offset = self.group_info[group].offset;
        let width = bits::bytes_for(self.storage.group_bonds_count(group));
        let nbits = self.storage.group_bonds_count(group);
        let fixed = self.matched_edges[offset..offset + width].to_vec();
        let state = self.matched_edges_state[offset..offset + width].to_vec();

        loop {
            let row = self.storage.group_dearomatization(group, candidate);
            let mut disagreeing = None;
            'bytes: for i in 0..width {
                let mut dif = fixed[i] & (state[i] ^ row[i]);
                while dif != 0 {
                    let local = i * 8 + dif.trailing_zeros() as usize;
                    if local >= nbits {
                        break 'bytes;
                    }
                    disagreeing = Some(local);
                    break 'bytes;
                }
            }
            let Some(local) = disagreeing else {
                return Ok(true);
            };

            // Fixed bonds agreeing with the candidate must keep their
            // state while this one is repaired.
            let agreeing: Vec<u8> = (0..width)
                .map(|i| {
                    let row = self.storage.group_dearomatization(group, candidate);
                    fixed[i] & !(state[i] ^ row[i])
                })
                .collect();
            let desired = bits::get(&state, local);
            if !self.fix_bond_in_matching(group, candidate, local, desired, &agreeing, topology)? {
                return Ok(false);
            }
        }
    }
}
