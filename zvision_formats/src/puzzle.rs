use serde::Serialize;

use crate::action::ResultAction;
use crate::text::parse_leading_int;

/// Per-key behaviour flags stored alongside the state table.
pub mod flags {
    /// Reset the puzzle's completion latch every time its script is loaded.
    pub const ONCE_PER_INST: u32 = 0x01;
    /// Allow the puzzle to fire on the very first pass after a load.
    pub const DO_ME_NOW: u32 = 0x02;
    /// Ignore the completion latch so the puzzle keeps being evaluated.
    pub const DISABLED: u32 = 0x04;

    const NAMES: [(&str, u32); 3] = [
        ("ONCE_PER_INST", ONCE_PER_INST),
        ("DO_ME_NOW", DO_ME_NOW),
        ("DISABLED", DISABLED),
    ];

    pub fn from_name(name: &str) -> Option<u32> {
        NAMES
            .iter()
            .find(|(label, _)| label.eq_ignore_ascii_case(name))
            .map(|(_, bit)| *bit)
    }

    pub fn names(mask: u32) -> Vec<&'static str> {
        NAMES
            .iter()
            .filter(|(_, bit)| mask & bit != 0)
            .map(|(label, _)| *label)
            .collect()
    }
}

/// Either a literal or a reference to another state key, resolved when the
/// value is needed rather than when the script is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ValueSlot {
    Literal(i32),
    Key(u32),
}

impl ValueSlot {
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        match token.find('[') {
            Some(index) => {
                let key = parse_leading_int(&token[index + 1..])?;
                // Negative slot references read as zero.
                Some(match u32::try_from(key) {
                    Ok(key) => ValueSlot::Key(key),
                    Err(_) => ValueSlot::Literal(0),
                })
            }
            None => parse_leading_int(token).map(|value| ValueSlot::Literal(value as i32)),
        }
    }

    pub fn resolve(&self, lookup: impl Fn(u32) -> i32) -> i32 {
        match *self {
            ValueSlot::Literal(value) => value,
            ValueSlot::Key(key) => lookup(key),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CriteriaOperator {
    EqualTo,
    NotEqualTo,
    GreaterThan,
    LessThan,
}

impl CriteriaOperator {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.chars().next()? {
            '=' => Some(CriteriaOperator::EqualTo),
            '!' => Some(CriteriaOperator::NotEqualTo),
            '>' => Some(CriteriaOperator::GreaterThan),
            '<' => Some(CriteriaOperator::LessThan),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            CriteriaOperator::EqualTo => '=',
            CriteriaOperator::NotEqualTo => '!',
            CriteriaOperator::GreaterThan => '>',
            CriteriaOperator::LessThan => '<',
        }
    }

    pub fn holds(self, lhs: i32, rhs: i32) -> bool {
        match self {
            CriteriaOperator::EqualTo => lhs == rhs,
            CriteriaOperator::NotEqualTo => lhs != rhs,
            CriteriaOperator::GreaterThan => lhs > rhs,
            CriteriaOperator::LessThan => lhs < rhs,
        }
    }
}

/// One `[key] op argument` comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CriteriaEntry {
    pub key: u32,
    pub operator: CriteriaOperator,
    pub argument: ValueSlot,
}

impl CriteriaEntry {
    /// Parses a criteria line such as `[4011] = 1` or `[20] > [21]`.
    pub fn parse(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace();
        let key_token = tokens.next()?;
        let key = parse_leading_int(key_token.trim_start_matches('['))?;
        let operator = CriteriaOperator::from_token(tokens.next()?)?;
        let argument = ValueSlot::parse(tokens.next()?)?;
        Some(CriteriaEntry {
            key: u32::try_from(key).ok()?,
            operator,
            argument,
        })
    }

    pub fn holds(&self, lookup: impl Fn(u32) -> i32) -> bool {
        let argument = self.argument.resolve(&lookup);
        self.operator.holds(lookup(self.key), argument)
    }
}

/// A rule: OR'd criteria conjunctions plus the actions run once they match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Puzzle {
    pub key: u32,
    pub criteria: Vec<Vec<CriteriaEntry>>,
    pub results: Vec<ResultAction>,
    pub flags: u32,
}

impl Puzzle {
    pub fn new(key: u32) -> Self {
        Puzzle {
            key,
            criteria: Vec::new(),
            results: Vec::new(),
            flags: 0,
        }
    }

    /// True when no conjunctions exist or the first satisfied one is found.
    pub fn criteria_met(&self, lookup: impl Fn(u32) -> i32) -> bool {
        self.criteria.is_empty()
            || self
                .criteria
                .iter()
                .any(|conjunction| conjunction.iter().all(|entry| entry.holds(&lookup)))
    }

    /// The puzzle's own key followed by every key its criteria compare.
    pub fn referenced_keys(&self) -> impl Iterator<Item = u32> + '_ {
        std::iter::once(self.key).chain(
            self.criteria
                .iter()
                .flat_map(|conjunction| conjunction.iter().map(|entry| entry.key)),
        )
    }
}
