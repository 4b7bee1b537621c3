//! Branching story graphs and the interpreter seam the dialogue manager drives.
//!
//! A story is a set of named knots. Each knot plays its lines, then offers
//! its choices, then follows its divert. Choosing runs the choice's own
//! lines and follows the choice's divert, or the knot's divert when the
//! choice has none. Non-sticky choices disappear once taken.

use serde::Deserialize;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::game::constants::dialogue::STICKY_TAG;

#[derive(Debug, Error)]
pub enum StoryError {
    #[error("failed to read story {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] serde_json::Error),

    #[error("unknown story path `{0}`")]
    UnknownPath(String),

    #[error("`{from}` diverts to unknown knot `{to}`")]
    DanglingDivert { from: String, to: String },

    #[error("knot `{0}` diverts in a loop without any content")]
    EmptyLoop(String),

    #[error("choice index {index} out of range ({available} available)")]
    ChoiceOutOfRange { index: usize, available: usize },

    #[error("story has no more content")]
    Exhausted,
}

/// One option offered to the player. `index` is its position in the
/// current choice set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub text: String,
    pub tags: Vec<String>,
    pub index: usize,
}

impl Choice {
    pub fn is_sticky(&self) -> bool {
        self.tags.iter().any(|t| t == STICKY_TAG)
    }
}

/// A running story. Callers step it one line at a time.
pub trait StoryInterpreter {
    fn choose_path(&mut self, path: &str) -> Result<(), StoryError>;

    fn can_continue(&self) -> bool;

    fn continue_line(&mut self) -> Result<String, StoryError>;

    /// Choices offered once the current content is exhausted.
    fn current_choices(&self) -> &[Choice];

    fn choose_choice_index(&mut self, index: usize) -> Result<(), StoryError>;
}

/// Produces a fresh interpreter for every dialogue session.
pub trait StorySource {
    type Interpreter: StoryInterpreter;

    fn instantiate(&self) -> Self::Interpreter;
}

/* --- story graph --- */

#[derive(Debug, Clone, Deserialize)]
struct ChoiceDef {
    text: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    lines: Vec<String>,
    #[serde(default)]
    divert: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Knot {
    #[serde(default)]
    lines: Vec<String>,
    #[serde(default)]
    choices: Vec<ChoiceDef>,
    #[serde(default)]
    divert: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StoryGraph {
    knots: BTreeMap<String, Knot>,
}

/// Parsed and validated story, cheap to clone.
#[derive(Debug, Clone)]
pub struct StoryAsset {
    graph: Arc<StoryGraph>,
}

impl StoryAsset {
    pub fn from_json_str(json: &str) -> Result<Self, StoryError> {
        let graph: StoryGraph = serde_json::from_str(json)?;
        let asset = Self {
            graph: Arc::new(graph),
        };
        asset.validate()?;
        Ok(asset)
    }

    pub fn from_file(path: &Path) -> Result<Self, StoryError> {
        let json = std::fs::read_to_string(path).map_err(|source| StoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn knot_names(&self) -> impl Iterator<Item = &str> {
        self.graph.knots.keys().map(String::as_str)
    }

    pub fn has_knot(&self, name: &str) -> bool {
        self.graph.knots.contains_key(name)
    }

    /// Checks that every divert resolves and no knot loops without content.
    pub fn validate(&self) -> Result<(), StoryError> {
        let knots = &self.graph.knots;
        for (name, knot) in knots {
            let choice_diverts = knot.choices.iter().filter_map(|c| c.divert.as_ref());
            for target in knot.divert.iter().chain(choice_diverts) {
                if !knots.contains_key(target) {
                    return Err(StoryError::DanglingDivert {
                        from: name.clone(),
                        to: target.clone(),
                    });
                }
            }
        }

        for name in knots.keys() {
            let mut seen = HashSet::new();
            let mut cursor = name.as_str();
            while let Some(knot) = knots.get(cursor) {
                if !knot.lines.is_empty() || !knot.choices.is_empty() {
                    break;
                }
                if !seen.insert(cursor) {
                    return Err(StoryError::EmptyLoop(name.clone()));
                }
                match &knot.divert {
                    Some(next) => cursor = next.as_str(),
                    None => break,
                }
            }
        }
        Ok(())
    }
}

impl StorySource for StoryAsset {
    type Interpreter = StoryRunner;

    fn instantiate(&self) -> StoryRunner {
        StoryRunner::new(Arc::clone(&self.graph))
    }
}

/* --- interpreter --- */

// What happens once the queued lines run out
#[derive(Debug, Clone, PartialEq, Eq)]
enum Next {
    /// Offer the knot's choices, else follow its divert
    Knot(String),
    /// Follow the knot's divert only
    KnotDivert(String),
    Divert(String),
    End,
}

#[derive(Debug)]
struct Checkpoint {
    queue: VecDeque<String>,
    next: Next,
    choices: Vec<Choice>,
    choice_refs: Vec<(String, usize)>,
    consumed: HashSet<(String, usize)>,
}

/// Interpreter over a [`StoryAsset`]. Consumed choices are remembered for
/// the lifetime of the runner.
#[derive(Debug)]
pub struct StoryRunner {
    graph: Arc<StoryGraph>,
    queue: VecDeque<String>,
    next: Next,
    choices: Vec<Choice>,
    // (knot, choice definition index) for each entry of `choices`
    choice_refs: Vec<(String, usize)>,
    consumed: HashSet<(String, usize)>,
}

impl StoryRunner {
    fn new(graph: Arc<StoryGraph>) -> Self {
        Self {
            graph,
            queue: VecDeque::new(),
            next: Next::End,
            choices: Vec::new(),
            choice_refs: Vec::new(),
            consumed: HashSet::new(),
        }
    }

    fn knot(&self, name: &str) -> Result<&Knot, StoryError> {
        self.graph
            .knots
            .get(name)
            .ok_or_else(|| StoryError::UnknownPath(name.to_string()))
    }

    fn enter_knot(&mut self, name: &str) -> Result<(), StoryError> {
        let lines = self.knot(name)?.lines.clone();
        self.queue = lines.into();
        self.next = Next::Knot(name.to_string());
        Ok(())
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            queue: self.queue.clone(),
            next: self.next.clone(),
            choices: self.choices.clone(),
            choice_refs: self.choice_refs.clone(),
            consumed: self.consumed.clone(),
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.queue = checkpoint.queue;
        self.next = checkpoint.next;
        self.choices = checkpoint.choices;
        self.choice_refs = checkpoint.choice_refs;
        self.consumed = checkpoint.consumed;
    }

    // A failed step leaves the runner exactly as it was before the call
    fn transaction<R>(
        &mut self,
        step: impl FnOnce(&mut Self) -> Result<R, StoryError>,
    ) -> Result<R, StoryError> {
        let checkpoint = self.checkpoint();
        let result = step(self);
        if result.is_err() {
            self.restore(checkpoint);
        }
        result
    }

    // Follows diverts and surfaces choices until there is content to play,
    // choices to offer, or nothing left.
    fn settle(&mut self) -> Result<(), StoryError> {
        let mut hops = 0;
        while self.queue.is_empty() {
            hops += 1;
            if hops > self.graph.knots.len() * 3 + 3 {
                return Err(StoryError::EmptyLoop(format!("{:?}", self.next)));
            }

            match std::mem::replace(&mut self.next, Next::End) {
                Next::Knot(name) => {
                    self.refresh_choices(&name)?;
                    if !self.choices.is_empty() {
                        return Ok(());
                    }
                    self.next = Next::KnotDivert(name);
                }
                Next::KnotDivert(name) => {
                    if let Some(target) = self.knot(&name)?.divert.clone() {
                        self.next = Next::Divert(target);
                    }
                }
                Next::Divert(target) => self.enter_knot(&target)?,
                Next::End => return Ok(()),
            }
        }
        Ok(())
    }

    fn refresh_choices(&mut self, knot_name: &str) -> Result<(), StoryError> {
        let knot = self.knot(knot_name)?;
        let mut choices = Vec::new();
        let mut refs = Vec::new();
        for (def_index, def) in knot.choices.iter().enumerate() {
            if self.consumed.contains(&(knot_name.to_string(), def_index)) {
                continue;
            }
            choices.push(Choice {
                text: def.text.clone(),
                tags: def.tags.clone(),
                index: choices.len(),
            });
            refs.push((knot_name.to_string(), def_index));
        }
        self.choices = choices;
        self.choice_refs = refs;
        Ok(())
    }
}

impl StoryInterpreter for StoryRunner {
    fn choose_path(&mut self, path: &str) -> Result<(), StoryError> {
        self.transaction(|runner| {
            runner.knot(path)?;
            runner.choices.clear();
            runner.choice_refs.clear();
            runner.enter_knot(path)?;
            runner.settle()
        })
    }

    fn can_continue(&self) -> bool {
        !self.queue.is_empty()
    }

    fn continue_line(&mut self) -> Result<String, StoryError> {
        self.transaction(|runner| {
            let line = runner.queue.pop_front().ok_or(StoryError::Exhausted)?;
            runner.settle()?;
            Ok(line)
        })
    }

    fn current_choices(&self) -> &[Choice] {
        &self.choices
    }

    fn choose_choice_index(&mut self, index: usize) -> Result<(), StoryError> {
        let available = self.choices.len();
        let (knot_name, def_index) = self
            .choice_refs
            .get(index)
            .cloned()
            .ok_or(StoryError::ChoiceOutOfRange { index, available })?;

        self.transaction(|runner| {
            let def = runner.knot(&knot_name)?.choices[def_index].clone();
            if !def.tags.iter().any(|t| t == STICKY_TAG) {
                runner.consumed.insert((knot_name.clone(), def_index));
            }

            runner.choices.clear();
            runner.choice_refs.clear();
            runner.queue = def.lines.into();
            runner.next = match def.divert {
                Some(target) => Next::Divert(target),
                None => Next::KnotDivert(knot_name),
            };
            runner.settle()
        })
    }
}
