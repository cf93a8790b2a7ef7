//! Dense renumbering of the instrument programs used by a piece.

use crate::{merge::NoteInterval, pack::BITS_PROGRAM, prelude::*};

/// Bijection between the programs used by a piece and the dense indices `0..len()`.
///
/// Dense indices are handed out in order of first appearance.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ProgramMap {
    /// Dense index of each original program, if used.
    dense: [Option<u7>; 128],
    /// Original program of each dense index.
    programs: Vec<u7>,
}
impl Default for ProgramMap {
    fn default() -> ProgramMap {
        ProgramMap {
            dense: [None; 128],
            programs: Vec::new(),
        }
    }
}
impl ProgramMap {
    /// Assign dense indices to the programs of `notes`, in order, and rewrite each note's program
    /// in place.
    ///
    /// The table is not clamped: if more programs are used than the packed encoding can address,
    /// a warning is logged and the extra indices will be truncated by the encoder.
    pub fn remap(notes: &mut [NoteInterval]) -> ProgramMap {
        let mut map = ProgramMap::default();
        for note in notes.iter_mut() {
            note.program = map.insert(note.program);
        }
        if map.len() > 1 << BITS_PROGRAM {
            log::warn!(
                "{} programs in use, only {} fit in the packed encoding",
                map.len(),
                1 << BITS_PROGRAM
            );
        }
        map
    }

    /// Get the dense index of `program`, assigning the next free one if unseen.
    pub fn insert(&mut self, program: u7) -> u7 {
        let slot = &mut self.dense[program.as_int() as usize];
        match *slot {
            Some(idx) => idx,
            None => {
                //At most 128 distinct programs, so the index always fits
                let idx = u7::new(self.programs.len() as u8);
                *slot = Some(idx);
                self.programs.push(program);
                idx
            }
        }
    }

    /// Dense index assigned to an original program.
    #[inline]
    pub fn dense_index(&self, program: u7) -> Option<u7> {
        self.dense[program.as_int() as usize]
    }

    /// Original program behind a dense index.
    #[inline]
    pub fn program(&self, dense: u7) -> Option<u7> {
        self.programs.get(dense.as_int() as usize).copied()
    }

    /// Original programs, indexed by dense index.
    #[inline]
    pub fn programs(&self) -> &[u7] {
        &self.programs
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}
