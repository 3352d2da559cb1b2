//! Puzzle definitions and the derived fragment model.
//!
//! A puzzle arrives as JSON, either from a `data-puzzle` attribute on a
//! widget container or as one element of the puzzle list resource. The
//! [`PuzzleModel`] derived from it holds the correct fragments in solved
//! order, the distractors, and the pool shown in the source bucket.

use crate::error::PuzzleError;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Deserializer, Serialize};

/// Fragments used when a widget has no usable puzzle of its own.
pub const DEMO_FRAGMENTS: [&str; 6] = [
    "a = 3;",
    "b = 4;",
    "c = a*b;",
    "a += 5",
    "b = a + 1;",
    "c = c + a;",
];

// ─── Puzzle JSON ─────────────────────────────────────────────────────────

/// Code given either as newline-separated text or as explicit blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CodeSpec {
    Text(String),
    Blocks(Vec<String>),
}

impl CodeSpec {
    /// Fragments in order. Text is split on line breaks and blank lines are
    /// dropped; explicit blocks are kept as given, minus blank ones.
    pub fn fragments(&self) -> Vec<String> {
        match self {
            CodeSpec::Text(text) => blocks_from_lines(text),
            CodeSpec::Blocks(blocks) => blocks.iter().filter(|b| !is_blank(b)).cloned().collect(),
        }
    }
}

/// Evaluation target. Unknown tags are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Javascript,
    Python,
    #[serde(untagged)]
    Other(String),
}

impl Language {
    pub fn as_str(&self) -> &str {
        match self {
            Language::Javascript => "javascript",
            Language::Python => "python",
            Language::Other(tag) => tag,
        }
    }
}

/// A test as written in the puzzle: a full object or an
/// `[expression, expected]` pair.
///
/// `Pair` comes first: serde would also accept a short array as a
/// `PuzzleTest` in field order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TestSpec {
    Pair(String, String),
    Full(PuzzleTest),
}

impl TestSpec {
    /// Expand the pair shorthand into a full test.
    pub fn full(&self) -> PuzzleTest {
        match self {
            TestSpec::Full(test) => test.clone(),
            TestSpec::Pair(expression, expected) => PuzzleTest {
                label: format!("Value of '{expression}'"),
                expression: expression.clone(),
                expected: expected.clone(),
                expect_error: None,
                is_abstract: false,
                hidden: false,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuzzleTest {
    pub label: String,
    pub expression: String,
    #[serde(default)]
    pub expected: String,
    /// `None`: key absent, compare values. `Some(None)`: explicit `null`,
    /// pass iff no error. `Some(Some(e))`: pass iff the error matches `e`.
    #[serde(
        default,
        deserialize_with = "present_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub expect_error: Option<Option<String>>,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default)]
    pub hidden: bool,
}

fn present_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Puzzle {
    /// Correct fragments in solved order. Absent means the demo fragments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<CodeSpec>,
    #[serde(default)]
    pub language: Language,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tests: Vec<TestSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pretest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Shuffle the pool with this seed. No seed, no shuffle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Puzzle {
    /// The built-in demo puzzle.
    pub fn demo() -> Self {
        Self {
            code: Some(CodeSpec::Blocks(demo_fragments())),
            extra: None,
            language: Language::default(),
            tests: Vec::new(),
            pretest: None,
            instructions: None,
            seed: None,
        }
    }

    /// Correct fragments in solved order.
    pub fn fragments(&self) -> Vec<String> {
        self.code
            .as_ref()
            .map(CodeSpec::fragments)
            .unwrap_or_else(demo_fragments)
    }

    pub fn has_tests(&self) -> bool {
        !self.tests.is_empty()
    }

    /// Tests with the pair shorthand expanded.
    pub fn full_tests(&self) -> Vec<PuzzleTest> {
        self.tests.iter().map(TestSpec::full).collect()
    }

    /// Instructions to show, falling back to a default wording.
    pub fn instructions_html(&self) -> String {
        match &self.instructions {
            Some(html) => html.clone(),
            None if self.has_tests() => "Drag the code on the left into the box on the right and \
                 arrange it so that all of the tests pass."
                .to_string(),
            None => "Drag the code on the left into the box on the right and arrange it so that \
                 there are no errors."
                .to_string(),
        }
    }
}

// ─── Parsing ─────────────────────────────────────────────────────────────

/// Parse one puzzle object (the `data-puzzle` attribute form).
pub fn parse_puzzle(json: &str) -> Result<Puzzle, PuzzleError> {
    serde_json::from_str(json).map_err(|source| PuzzleError::MalformedJson {
        context: "puzzle attribute".to_string(),
        source,
    })
}

/// Parse the inline attribute, falling back to the demo puzzle on bad JSON.
/// A missing attribute also yields the demo puzzle.
pub fn puzzle_or_demo(attribute: Option<&str>) -> Puzzle {
    match attribute.map(parse_puzzle) {
        Some(Ok(puzzle)) => puzzle,
        Some(Err(e)) => {
            log::error!("{e}; using the demo puzzle. Attribute text: {}", attribute.unwrap_or_default());
            Puzzle::demo()
        }
        None => Puzzle::demo(),
    }
}

/// Parse the puzzle list resource. An empty list is an error since there is
/// nothing to present.
pub fn parse_puzzle_list(json: &str, source_url: &str) -> Result<Vec<Puzzle>, PuzzleError> {
    let puzzles: Vec<Puzzle> =
        serde_json::from_str(json).map_err(|source| PuzzleError::MalformedJson {
            context: format!("'{source_url}'"),
            source,
        })?;
    if puzzles.is_empty() {
        return Err(PuzzleError::EmptyPuzzleList {
            context: format!("'{source_url}'"),
        });
    }
    Ok(puzzles)
}

// ─── Fragment model ──────────────────────────────────────────────────────

fn demo_fragments() -> Vec<String> {
    DEMO_FRAGMENTS.iter().map(|s| s.to_string()).collect()
}

fn is_blank(s: &str) -> bool {
    s.chars().all(char::is_whitespace)
}

/// Split text on line breaks and drop entirely-blank lines.
pub fn blocks_from_lines(code: &str) -> Vec<String> {
    code.lines()
        .filter(|line| !is_blank(line))
        .map(str::to_string)
        .collect()
}

/// Fragments derived from one puzzle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PuzzleModel {
    /// Solved order; its length is the number of solution slots.
    pub correct: Vec<String>,
    pub distractors: Vec<String>,
    /// Everything shown in the source bucket.
    pub pool: Vec<String>,
}

impl PuzzleModel {
    /// Build from raw text. Missing code means the demo fragments.
    pub fn build(raw_code: Option<&str>, raw_extra: Option<&str>) -> Self {
        let correct = match raw_code {
            Some(code) => blocks_from_lines(code),
            None => demo_fragments(),
        };
        let distractors = raw_extra.map(blocks_from_lines).unwrap_or_default();
        Self::assemble(correct, distractors)
    }

    pub fn from_puzzle(puzzle: &Puzzle) -> Self {
        let correct = puzzle.fragments();
        let distractors = puzzle
            .extra
            .as_ref()
            .map(CodeSpec::fragments)
            .unwrap_or_default();
        let mut model = Self::assemble(correct, distractors);
        if let Some(seed) = puzzle.seed {
            model.shuffle_pool(seed);
        }
        model
    }

    fn assemble(correct: Vec<String>, distractors: Vec<String>) -> Self {
        let pool = correct.iter().chain(&distractors).cloned().collect();
        Self {
            correct,
            distractors,
            pool,
        }
    }

    /// Deterministically reorder the pool.
    pub fn shuffle_pool(&mut self, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        self.pool.shuffle(&mut rng);
    }

    pub fn slot_count(&self) -> usize {
        self.correct.len()
    }
}
