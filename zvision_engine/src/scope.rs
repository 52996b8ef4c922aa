use std::rc::Rc;

use serde::Serialize;
use zvision_formats::Puzzle;

use crate::controls::Control;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeLevel {
    Universe,
    World,
    Room,
    NodeView,
}

impl ScopeLevel {
    pub const ALL: [ScopeLevel; 4] = [
        ScopeLevel::Universe,
        ScopeLevel::World,
        ScopeLevel::Room,
        ScopeLevel::NodeView,
    ];

    /// Most specific scope first, the order scopes are evaluated each frame.
    pub const FRAME_ORDER: [ScopeLevel; 4] = [
        ScopeLevel::NodeView,
        ScopeLevel::Room,
        ScopeLevel::World,
        ScopeLevel::Universe,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ScopeLevel::Universe => "universe",
            ScopeLevel::World => "world",
            ScopeLevel::Room => "room",
            ScopeLevel::NodeView => "nodeview",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Rules and controls loaded from one script, plus the double-buffered
/// queue of rules waiting to be re-evaluated.
#[derive(Debug)]
pub struct ScriptScope {
    level: ScopeLevel,
    script: Option<String>,
    puzzles: Vec<Rc<Puzzle>>,
    pub(crate) controls: Vec<Control>,
    queued: Vec<bool>,
    scope_queue: Vec<usize>,
    exec_queue: Vec<usize>,
    proc_count: u8,
}

/// Rule indices chosen for one evaluation pass.
#[derive(Debug, PartialEq, Eq)]
pub struct ScopePass {
    /// Passes already run since the scope was loaded, capped at 2.
    pub counter: u8,
    pub rules: Vec<usize>,
}

impl ScriptScope {
    pub fn new(level: ScopeLevel) -> Self {
        Self {
            level,
            script: None,
            puzzles: Vec::new(),
            controls: Vec::new(),
            queued: Vec::new(),
            scope_queue: Vec::new(),
            exec_queue: Vec::new(),
            proc_count: 0,
        }
    }

    pub fn level(&self) -> ScopeLevel {
        self.level
    }

    pub fn script(&self) -> Option<&str> {
        self.script.as_deref()
    }

    pub fn puzzles(&self) -> &[Rc<Puzzle>] {
        &self.puzzles
    }

    pub fn puzzle(&self, index: usize) -> Option<Rc<Puzzle>> {
        self.puzzles.get(index).cloned()
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    pub fn proc_count(&self) -> u8 {
        self.proc_count
    }

    pub fn pending(&self) -> &[usize] {
        &self.scope_queue
    }

    pub fn clear(&mut self) {
        self.script = None;
        self.puzzles.clear();
        self.controls.clear();
        self.queued.clear();
        self.scope_queue.clear();
        self.exec_queue.clear();
        self.proc_count = 0;
    }

    pub(crate) fn load(&mut self, script: &str, puzzles: Vec<Puzzle>, controls: Vec<Control>) {
        self.clear();
        self.script = Some(script.to_string());
        self.queued = vec![false; puzzles.len()];
        self.puzzles = puzzles.into_iter().map(Rc::new).collect();
        self.controls = controls;
    }

    /// Appends a rule to the pending queue unless it is already waiting.
    pub fn queue(&mut self, index: usize) -> bool {
        match self.queued.get_mut(index) {
            Some(queued) if !*queued => {
                *queued = true;
                self.scope_queue.push(index);
                true
            }
            _ => false,
        }
    }

    /// Swaps the queues and picks the rules to evaluate. The first two
    /// passes after a load, and every pass when `evaluate_all` is set, visit
    /// every rule in load order.
    pub(crate) fn begin_pass(&mut self, evaluate_all: bool) -> ScopePass {
        std::mem::swap(&mut self.scope_queue, &mut self.exec_queue);
        self.queued.iter_mut().for_each(|queued| *queued = false);

        let rules = if self.proc_count < 2 || evaluate_all {
            (0..self.puzzles.len()).collect()
        } else {
            self.exec_queue.clone()
        };
        ScopePass {
            counter: self.proc_count,
            rules,
        }
    }

    pub(crate) fn finish_pass(&mut self) {
        self.exec_queue.clear();
        if self.proc_count < 2 {
            self.proc_count += 1;
        }
    }
}

#[derive(Debug)]
pub struct ScopeSet {
    scopes: [ScriptScope; 4],
}

impl Default for ScopeSet {
    fn default() -> Self {
        Self {
            scopes: ScopeLevel::ALL.map(ScriptScope::new),
        }
    }
}

impl ScopeSet {
    pub fn get(&self, level: ScopeLevel) -> &ScriptScope {
        &self.scopes[level.index()]
    }

    pub fn get_mut(&mut self, level: ScopeLevel) -> &mut ScriptScope {
        &mut self.scopes[level.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScriptScope> {
        self.scopes.iter()
    }
}
