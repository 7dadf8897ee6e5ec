use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{PipelineError, Result};

/// Broad classification of a resolved crime outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BroadCategory {
    #[serde(rename = "No Further Action")]
    NoFurtherAction,
    #[serde(rename = "Non-criminal Outcome")]
    NonCriminalOutcome,
    #[serde(rename = "Public Interest Consideration")]
    PublicInterestConsideration,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl BroadCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            BroadCategory::NoFurtherAction => "No Further Action",
            BroadCategory::NonCriminalOutcome => "Non-criminal Outcome",
            BroadCategory::PublicInterestConsideration => "Public Interest Consideration",
            BroadCategory::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for BroadCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome values listed per category, as written in the `[categories]`
/// section of the pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryLists {
    pub no_further_action: Vec<String>,
    pub non_criminal_outcome: Vec<String>,
    pub public_interest_consideration: Vec<String>,
}

impl Default for CategoryLists {
    fn default() -> Self {
        let owned = |values: &[&str]| values.iter().map(|v| v.to_string()).collect();
        Self {
            no_further_action: owned(&[
                "Unable to prosecute suspect",
                "Investigation complete; no suspect identified",
                "Status update unavailable",
            ]),
            non_criminal_outcome: owned(&[
                "Local resolution",
                "Offender given a caution",
                "Action to be taken by another organisation",
                "Awaiting court outcome",
            ]),
            public_interest_consideration: owned(&[
                "Further investigation is not in the public interest",
                "Further action is not in the public interest",
                "Formal action is not in the public interest",
            ]),
        }
    }
}

/// Lookup from resolved outcome value to its broad category
#[derive(Debug, Clone)]
pub struct CategoryMap {
    lookup: HashMap<String, BroadCategory>,
}

impl CategoryMap {
    /// Build the lookup, rejecting a value listed under two categories.
    pub fn from_lists(lists: &CategoryLists) -> Result<Self> {
        let mut lookup = HashMap::new();
        let groups = [
            (BroadCategory::NoFurtherAction, &lists.no_further_action),
            (BroadCategory::NonCriminalOutcome, &lists.non_criminal_outcome),
            (BroadCategory::PublicInterestConsideration, &lists.public_interest_consideration),
        ];

        for (category, values) in groups {
            for value in values {
                if let Some(existing) = lookup.insert(value.clone(), category) {
                    if existing != category {
                        return Err(PipelineError::Config(format!(
                            "outcome '{}' is listed under both '{}' and '{}'",
                            value, existing, category
                        )));
                    }
                }
            }
        }

        Ok(Self { lookup })
    }

    /// Classify a resolved outcome. Null and unlisted values are `Unknown`.
    pub fn categorize(&self, outcome: Option<&str>) -> BroadCategory {
        outcome
            .and_then(|value| self.lookup.get(value).copied())
            .unwrap_or(BroadCategory::Unknown)
    }

    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }
}

impl Default for CategoryMap {
    fn default() -> Self {
        // Built-in lists are disjoint.
        let lists = CategoryLists::default();
        let lookup = lists
            .no_further_action
            .iter()
            .map(|v| (v.clone(), BroadCategory::NoFurtherAction))
            .chain(lists.non_criminal_outcome.iter().map(|v| (v.clone(), BroadCategory::NonCriminalOutcome)))
            .chain(
                lists
                    .public_interest_consideration
                    .iter()
                    .map(|v| (v.clone(), BroadCategory::PublicInterestConsideration)),
            )
            .collect();
        Self { lookup }
    }
}
