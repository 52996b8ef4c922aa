use std::collections::BTreeMap;

use serde::Serialize;

use crate::scope::{ScopeLevel, ScriptScope};

/// Identifies a rule by the scope that owns it and its load index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PuzzleRef {
    pub scope: ScopeLevel,
    pub index: usize,
}

/// Maps each state key to the rules that must be re-checked when it changes.
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    table: BTreeMap<u32, Vec<PuzzleRef>>,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `puzzle` under `key`. Registering the same pair twice is a
    /// no-op; returns whether anything was added.
    pub fn add(&mut self, key: u32, puzzle: PuzzleRef) -> bool {
        let entries = self.table.entry(key).or_default();
        if entries.contains(&puzzle) {
            return false;
        }
        entries.push(puzzle);
        true
    }

    /// Registers every rule in `scope` under its own key and each key its
    /// criteria compare.
    pub fn add_scope(&mut self, scope: &ScriptScope) {
        for (index, puzzle) in scope.puzzles().iter().enumerate() {
            let puzzle_ref = PuzzleRef {
                scope: scope.level(),
                index,
            };
            for key in puzzle.referenced_keys() {
                self.add(key, puzzle_ref);
            }
        }
    }

    /// Rules registered for `key`, in registration order.
    pub fn dependents(&self, key: u32) -> &[PuzzleRef] {
        self.table.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }

    pub fn key_count(&self) -> usize {
        self.table.len()
    }
}
