//! Bit-packed, append-only storage for enumerated dearomatizations.
//!
//! Per group the storage keeps the ordered aromatic bond list (defining
//! local bond indices), a sequence of bond-assignment rows (one bit per
//! group bond, 1 = double), and optionally a sequence of heteroatom-state
//! rows. All rows live in flat byte arrays, contiguous in group order;
//! appends are only legal at the tail of the highest group written so far.

use std::io::{Read, Write};

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::bits;
use crate::error::Error;

/// What the enumerator was asked to keep.
///
/// The numeric values are part of the binary format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DearomatizationMode {
    /// Storage holds nothing; fixing operations report `false`.
    #[default]
    NoDearomatizations = 0,
    /// One assignment per feasible heteroatom configuration.
    SaveOne = 1,
    /// Every valid assignment.
    SaveAll = 2,
    /// Only heteroatom-state rows; assignments are materialized lazily.
    SaveJustHeteroatoms = 3,
}

impl DearomatizationMode {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::NoDearomatizations),
            1 => Some(Self::SaveOne),
            2 => Some(Self::SaveAll),
            3 => Some(Self::SaveJustHeteroatoms),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Slice {
    offset: usize,
    count: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct GroupEntry {
    arom_bonds: Slice,
    hetero_indices: Slice,
    bonds_state: Slice,
    hetero_state: Slice,
}

/// Container for the dearomatizations of one molecule.
#[derive(Debug, Default)]
pub struct DearomatizationsStorage {
    mode: DearomatizationMode,
    groups: Vec<GroupEntry>,
    arom_bonds: Vec<EdgeIndex>,
    hetero_indices: Vec<NodeIndex>,
    bonds_state: Vec<u8>,
    hetero_state: Vec<u8>,
}

impl DearomatizationsStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> DearomatizationMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: DearomatizationMode) {
        self.mode = mode;
    }

    pub fn clear(&mut self) {
        self.groups.clear();
        self.clear_indices();
        self.clear_bonds_state();
        self.hetero_state.clear();
        self.mode = DearomatizationMode::NoDearomatizations;
    }

    /// Drop the bond and heteroatom index lists (group slices reset);
    /// stored state rows are untouched.
    pub fn clear_indices(&mut self) {
        self.arom_bonds.clear();
        self.hetero_indices.clear();
        for entry in &mut self.groups {
            entry.arom_bonds = Slice::default();
            entry.hetero_indices = Slice::default();
        }
    }

    /// Drop all bond-assignment rows, keeping group structure and
    /// heteroatom-state rows.
    pub fn clear_bonds_state(&mut self) {
        self.bonds_state.clear();
        for entry in &mut self.groups {
            entry.bonds_state = Slice::default();
        }
    }

    /// Reset the group table to `count` empty groups. Must precede any
    /// `set_group`.
    pub fn set_groups_count(&mut self, count: usize) {
        self.groups.clear();
        self.groups.resize(count, GroupEntry::default());
    }

    pub fn groups_count(&self) -> usize {
        self.groups.len()
    }

    /// Record the bond list (and, in heteroatom mode, the heteroatom list)
    /// of a group. Groups must be set in increasing order, once each.
    pub fn set_group(
        &mut self,
        group: usize,
        bonds: &[EdgeIndex],
        hetero_atoms: &[NodeIndex],
    ) -> Result<(), Error> {
        let entry = self
            .groups
            .get_mut(group)
            .ok_or(Error::Ordering("set_group before set_groups_count"))?;

        entry.arom_bonds.offset = self.arom_bonds.len();
        entry.arom_bonds.count = bonds.len();

        entry.hetero_indices.offset = self.hetero_indices.len();
        if self.mode == DearomatizationMode::SaveJustHeteroatoms {
            entry.hetero_indices.count = hetero_atoms.len();
            self.hetero_indices.extend_from_slice(hetero_atoms);
        } else {
            entry.hetero_indices.count = 0;
        }

        self.arom_bonds.extend_from_slice(bonds);
        Ok(())
    }

    pub fn group_bonds(&self, group: usize) -> &[EdgeIndex] {
        let s = &self.groups[group].arom_bonds;
        &self.arom_bonds[s.offset..s.offset + s.count]
    }

    pub fn group_bonds_count(&self, group: usize) -> usize {
        self.groups[group].arom_bonds.count
    }

    pub fn group_hetero_atoms(&self, group: usize) -> &[NodeIndex] {
        let s = &self.groups[group].hetero_indices;
        &self.hetero_indices[s.offset..s.offset + s.count]
    }

    pub fn group_hetero_atoms_count(&self, group: usize) -> usize {
        self.groups[group].hetero_indices.count
    }

    fn bonds_row_width(&self, group: usize) -> usize {
        bits::bytes_for(self.groups[group].arom_bonds.count)
    }

    fn hetero_row_width(&self, group: usize) -> usize {
        bits::bytes_for(self.groups[group].hetero_indices.count)
    }

    /// Append a bond-assignment row for a group. Only the tail group (the
    /// highest-numbered group with rows so far) may grow.
    pub fn add_group_dearomatization(&mut self, group: usize, row: &[u8]) -> Result<(), Error> {
        let width = self.bonds_row_width(group);
        let entry = &self.groups[group];

        let expected = self
            .bonds_state
            .len()
            .checked_sub(width * entry.bonds_state.count);
        if entry.bonds_state.count != 0 && Some(entry.bonds_state.offset) != expected {
            return Err(Error::Ordering(
                "dearomatization appended after a later group",
            ));
        }
        if row.len() < width {
            return Err(Error::Internal("assignment row narrower than the group"));
        }

        if entry.bonds_state.count == 0 {
            self.groups[group].bonds_state.offset = self.bonds_state.len();
        }
        self.bonds_state.extend_from_slice(&row[..width]);
        self.groups[group].bonds_state.count += 1;
        Ok(())
    }

    /// Append a heteroatom-state row for a group, under the same tail
    /// discipline.
    pub fn add_group_hetero_atoms_state(&mut self, group: usize, row: &[u8]) -> Result<(), Error> {
        let width = self.hetero_row_width(group);
        let entry = &self.groups[group];

        let expected = self
            .hetero_state
            .len()
            .checked_sub(width * entry.hetero_state.count);
        if entry.hetero_state.count != 0 && Some(entry.hetero_state.offset) != expected {
            return Err(Error::Ordering(
                "heteroatom state appended after a later group",
            ));
        }
        if row.len() < width {
            return Err(Error::Internal("heteroatom row narrower than the group"));
        }

        if entry.hetero_state.count == 0 {
            self.groups[group].hetero_state.offset = self.hetero_state.len();
        }
        self.hetero_state.extend_from_slice(&row[..width]);
        self.groups[group].hetero_state.count += 1;
        Ok(())
    }

    pub fn group_dearomatizations_count(&self, group: usize) -> usize {
        self.groups[group].bonds_state.count
    }

    /// Borrow one stored assignment row. The slice is invalidated by any
    /// mutating call on the storage.
    pub fn group_dearomatization(&self, group: usize, index: usize) -> &[u8] {
        let width = self.bonds_row_width(group);
        let offset = self.groups[group].bonds_state.offset + index * width;
        &self.bonds_state[offset..offset + width]
    }

    /// Mutable access to one stored assignment row, for the matcher's
    /// in-place augmenting modifications. The exclusive borrow guarantees
    /// no concurrent readers.
    pub fn assignment_slice_mut(&mut self, group: usize, index: usize) -> &mut [u8] {
        let width = self.bonds_row_width(group);
        let offset = self.groups[group].bonds_state.offset + index * width;
        &mut self.bonds_state[offset..offset + width]
    }

    pub fn group_hetero_state_count(&self, group: usize) -> usize {
        self.groups[group].hetero_state.count
    }

    pub fn group_hetero_state(&self, group: usize, index: usize) -> &[u8] {
        let width = self.hetero_row_width(group);
        let offset = self.groups[group].hetero_state.offset + index * width;
        &self.hetero_state[offset..offset + width]
    }

    /// Serialize to the binary format: mode byte, packed-short group
    /// count, then per-group packed-short row counts followed by the
    /// packed-short byte length of the flat row array and its raw bytes.
    pub fn save_binary<W: Write>(&self, out: &mut W) -> Result<(), Error> {
        out.write_all(&[self.mode as u8])?;
        write_packed_short(out, self.groups.len())?;

        if self.mode != DearomatizationMode::SaveJustHeteroatoms {
            let mut expected = 0;
            for (i, entry) in self.groups.iter().enumerate() {
                if entry.bonds_state.count != 0 && entry.bonds_state.offset != expected {
                    return Err(Error::Ordering("assignment rows are not contiguous"));
                }
                expected += entry.bonds_state.count * self.bonds_row_width(i);
                write_packed_short(out, entry.bonds_state.count)?;
            }
            write_packed_short(out, self.bonds_state.len())?;
            out.write_all(&self.bonds_state)?;
        } else {
            let mut expected = 0;
            for (i, entry) in self.groups.iter().enumerate() {
                if entry.hetero_state.count != 0 && entry.hetero_state.offset != expected {
                    return Err(Error::Ordering("heteroatom rows are not contiguous"));
                }
                expected += entry.hetero_state.count * self.hetero_row_width(i);
                write_packed_short(out, entry.hetero_state.count)?;
            }
            write_packed_short(out, self.hetero_state.len())?;
            out.write_all(&self.hetero_state)?;
        }
        Ok(())
    }

    /// Deserialize rows written by [`save_binary`](Self::save_binary).
    ///
    /// The stream carries only counts and raw rows; row widths come from
    /// the group structure, so the caller must have populated it (via
    /// `construct_groups` against the same molecule) beforehand. Offsets
    /// are rebuilt by prefix-summing `count × row_width`.
    pub fn load_binary<R: Read>(&mut self, input: &mut R) -> Result<(), Error> {
        let mode = DearomatizationMode::from_byte(read_byte(input)?)
            .ok_or(Error::Internal("unknown dearomatization mode byte"))?;
        let groups_count = read_packed_short(input)?;
        if groups_count != self.groups.len() {
            return Err(Error::Ordering(
                "group count in stream disagrees with constructed groups",
            ));
        }
        self.mode = mode;

        if mode != DearomatizationMode::SaveJustHeteroatoms {
            self.clear_bonds_state();
            let mut offset = 0;
            for g in 0..groups_count {
                let count = read_packed_short(input)?;
                self.groups[g].bonds_state = Slice { offset, count };
                offset += count * self.bonds_row_width(g);
            }
            let total = read_packed_short(input)?;
            if total != offset {
                return Err(Error::Ordering(
                    "row byte count disagrees with group widths",
                ));
            }
            self.bonds_state = vec![0; total];
            input.read_exact(&mut self.bonds_state)?;
        } else {
            self.hetero_state.clear();
            for entry in &mut self.groups {
                entry.hetero_state = Slice::default();
            }
            let mut offset = 0;
            for g in 0..groups_count {
                let count = read_packed_short(input)?;
                self.groups[g].hetero_state = Slice { offset, count };
                offset += count * self.hetero_row_width(g);
            }
            let total = read_packed_short(input)?;
            if total != offset {
                return Err(Error::Ordering(
                    "row byte count disagrees with group widths",
                ));
            }
            self.hetero_state = vec![0; total];
            input.read_exact(&mut self.hetero_state)?;
        }
        Ok(())
    }
}

fn read_byte<R: Read>(input: &mut R) -> Result<u8, Error> {
    let mut buf = [0u8; 1];
    input.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// One byte for values below 255; otherwise 0xFF followed by the value as
/// a little-endian u16.
fn write_packed_short<W: Write>(out: &mut W, value: usize) -> Result<(), Error> {
    if value < 255 {
        out.write_all(&[value as u8])?;
    } else {
        let v = u16::try_from(value)
            .map_err(|_| Error::Internal("value does not fit a packed short"))?;
        out.write_all(&[0xFF])?;
        out.write_all(&v.to_le_bytes())?;
    }
    Ok(())
}

fn read_packed_short<R: Read>(input: &mut R) -> Result<usize, Error> {
    let first = read_byte(input)?;
    if first < 255 {
        return Ok(first as usize);
    }
    let mut buf = [0u8; 2];
    input.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf) as usize)
}
