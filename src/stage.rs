use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

/// The pipeline stages, in execution order.
///
/// `Parse` always runs; the other three run only when requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Parse,
    Description,
    Comparison,
    Faq,
}

impl Stage {
    pub const ORDER: [Stage; 4] = [
        Stage::Parse,
        Stage::Description,
        Stage::Comparison,
        Stage::Faq,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Parse => "parse",
            Stage::Description => "description",
            Stage::Comparison => "comparison",
            Stage::Faq => "faq",
        }
    }

    /// Maps a caller-facing operation name onto its stage.
    ///
    /// Only the optional stages are operations; `"parse"` and unknown names
    /// yield `None`.
    pub fn from_operation(operation: &str) -> Option<Stage> {
        match operation.trim() {
            "description" => Some(Stage::Description),
            "comparison" => Some(Stage::Comparison),
            "faq" => Some(Stage::Faq),
            _ => None,
        }
    }

    /// Stages after this one in the fixed order.
    pub fn successors(self) -> impl Iterator<Item = Stage> {
        Stage::ORDER.into_iter().filter(move |s| *s > self)
    }

    /// Router transition: the next requested stage after this one, or
    /// `None` when the run is done.
    ///
    /// A pure function of the fixed order and `operations`.
    ///
    /// # Examples
    ///
    /// ```
    /// use product_pipeline::{Operations, Stage};
    ///
    /// let ops = Operations::from_names(["faq"]);
    /// assert_eq!(Stage::Parse.next(&ops), Some(Stage::Faq));
    /// assert_eq!(Stage::Faq.next(&ops), None);
    /// ```
    pub fn next(self, operations: &Operations) -> Option<Stage> {
        self.successors().find(|s| operations.contains(*s))
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The optional stages requested for a run, kept in execution order.
///
/// `Parse` is implied and never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Operations(BTreeSet<Stage>);

impl Operations {
    /// Builds the set from operation names, ignoring unrecognized ones.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .filter_map(|name| {
                let stage = Stage::from_operation(name.as_ref());
                if stage.is_none() {
                    debug!("Ignoring unknown operation '{}'", name.as_ref());
                }
                stage
            })
            .collect()
    }

    pub fn all() -> Self {
        Stage::ORDER.into_iter().collect()
    }

    /// Whether `stage` runs; always true for `Parse`.
    pub fn contains(&self, stage: Stage) -> bool {
        stage == Stage::Parse || self.0.contains(&stage)
    }

    pub fn iter(&self) -> impl Iterator<Item = Stage> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(|s| s.name()).collect()
    }
}

impl FromIterator<Stage> for Operations {
    fn from_iter<I: IntoIterator<Item = Stage>>(iter: I) -> Self {
        Self(iter.into_iter().filter(|s| *s != Stage::Parse).collect())
    }
}
