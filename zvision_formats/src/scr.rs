use std::iter::Enumerate;
use std::str::Lines;

use log::warn;
use serde::Serialize;

use crate::action::ResultAction;
use crate::control::{ControlDef, ControlKind, ControlProperty};
use crate::puzzle::{CriteriaEntry, Puzzle, flags};
use crate::text::{
    decode_latin1, parse_leading_int, starts_with_ignore_case, trim_comments_and_whitespace,
};

/// A parse problem that was recovered from. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub line: usize,
    pub message: String,
}

/// Puzzles and controls declared by one `.scr` file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScrFile {
    pub puzzles: Vec<Puzzle>,
    pub controls: Vec<ControlDef>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ScrFile {
    /// Parses script text. Parsing never fails: lines that cannot be
    /// understood are reported through `diagnostics` and skipped.
    pub fn parse(text: &str) -> Self {
        let mut parser = Parser::new(text);
        parser.parse();
        parser.finish()
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::parse(&decode_latin1(bytes))
    }
}

struct Parser<'a> {
    lines: Enumerate<Lines<'a>>,
    current_line: usize,
    file: ScrFile,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate(),
            current_line: 0,
            file: ScrFile::default(),
        }
    }

    fn finish(self) -> ScrFile {
        self.file
    }

    fn next_line(&mut self) -> Option<&'a str> {
        let (index, raw) = self.lines.next()?;
        self.current_line = index + 1;
        Some(trim_comments_and_whitespace(raw))
    }

    fn diagnostic(&mut self, message: String) {
        warn!("script line {}: {}", self.current_line, message);
        self.file.diagnostics.push(Diagnostic {
            line: self.current_line,
            message,
        });
    }

    fn parse(&mut self) {
        while let Some(line) = self.next_line() {
            if line.is_empty() {
                continue;
            }

            let puzzle_header = ["puzzle:", "rule:"]
                .iter()
                .find(|prefix| starts_with_ignore_case(line, prefix))
                .map(|prefix| &line[prefix.len()..]);

            if let Some(rest) = puzzle_header {
                match parse_leading_int(rest).and_then(|key| u32::try_from(key).ok()) {
                    Some(key) => {
                        let puzzle = self.parse_puzzle(key);
                        self.file.puzzles.push(puzzle);
                    }
                    None => {
                        self.diagnostic(format!("puzzle header without a key: {line}"));
                        let _ = self.parse_puzzle(0);
                    }
                }
            } else if starts_with_ignore_case(line, "control:") {
                if let Some(control) = self.parse_control(line) {
                    self.file.controls.push(control);
                }
            }
        }
    }

    fn parse_puzzle(&mut self, key: u32) -> Puzzle {
        let mut puzzle = Puzzle::new(key);
        loop {
            let Some(line) = self.next_line() else {
                self.diagnostic(format!("puzzle {key} is missing its closing brace"));
                break;
            };
            if line.contains('}') {
                break;
            }

            if is_block_header(line, "criteria") {
                if let Some(conjunction) = self.parse_criteria() {
                    puzzle.criteria.push(conjunction);
                }
            } else if is_block_header(line, "results") {
                self.parse_results(&mut puzzle.results);
            } else if is_block_header(line, "flags") {
                puzzle.flags |= self.parse_flags();
            }
        }
        puzzle
    }

    /// Returns `None` for an empty block, which adds no conjunction.
    fn parse_criteria(&mut self) -> Option<Vec<CriteriaEntry>> {
        let mut conjunction = Vec::new();
        while let Some(line) = self.next_line() {
            if line.contains('}') {
                break;
            }
            if line.is_empty() {
                continue;
            }
            match CriteriaEntry::parse(line) {
                Some(entry) => conjunction.push(entry),
                None => self.diagnostic(format!("unreadable criteria: {line}")),
            }
        }
        (!conjunction.is_empty()).then_some(conjunction)
    }

    fn parse_results(&mut self, results: &mut Vec<ResultAction>) {
        while let Some(line) = self.next_line() {
            if line.contains('}') {
                break;
            }
            if line.is_empty() {
                continue;
            }
            match ResultAction::parse(line) {
                Ok(Some(action)) => results.push(action),
                Ok(None) => {}
                Err(err) => self.diagnostic(err.to_string()),
            }
        }
    }

    fn parse_flags(&mut self) -> u32 {
        let mut mask = 0;
        while let Some(line) = self.next_line() {
            if line.contains('}') {
                break;
            }
            if line.is_empty() {
                continue;
            }
            match flags::from_name(line) {
                Some(bit) => mask |= bit,
                None => self.diagnostic(format!("unknown puzzle flag: {line}")),
            }
        }
        mask
    }

    fn parse_control(&mut self, header: &str) -> Option<ControlDef> {
        let rest = &header["control:".len()..];
        let mut tokens = rest.split_whitespace();
        let key = tokens
            .next()
            .and_then(parse_leading_int)
            .and_then(|key| u32::try_from(key).ok());
        let type_name = tokens
            .next()
            .map(|token| token.trim_end_matches('{'))
            .unwrap_or("");

        let properties = self.parse_control_body(header);

        let Some(key) = key else {
            self.diagnostic(format!("control header without a key: {header}"));
            return None;
        };
        let Some(kind) = ControlKind::from_name(type_name) else {
            self.diagnostic(format!("unknown control type '{type_name}' for control {key}"));
            return None;
        };
        Some(ControlDef {
            key,
            kind,
            properties,
        })
    }

    fn parse_control_body(&mut self, header: &str) -> Vec<ControlProperty> {
        let mut depth = brace_delta(header);
        let mut opened = header.contains('{');
        let mut properties = Vec::new();

        if opened && depth <= 0 {
            return properties;
        }

        while let Some(line) = self.next_line() {
            if line.is_empty() {
                continue;
            }
            if line.contains('{') {
                opened = true;
            }
            depth += brace_delta(line);
            if let Some(property) = ControlProperty::parse(line) {
                properties.push(property);
            }
            if opened && depth <= 0 {
                return properties;
            }
        }

        self.diagnostic("control block is missing its closing brace".to_string());
        properties
    }
}

fn is_block_header(line: &str, name: &str) -> bool {
    starts_with_ignore_case(line, name) && line[name.len()..].trim() == "{"
}

fn brace_delta(line: &str) -> i32 {
    line.chars().fold(0, |depth, ch| match ch {
        '{' => depth + 1,
        '}' => depth - 1,
        _ => depth,
    })
}
