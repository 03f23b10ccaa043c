use std::fmt;

use serde::{Deserialize, Serialize};

/// The closed taxonomy a comment can be classified into. The serialized
/// strings are the server contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "methodological concerns")]
    MethodologicalConcerns,
    #[serde(rename = "figure anomalies")]
    FigureAnomalies,
    #[serde(rename = "clarification")]
    Clarification,
    #[serde(rename = "data validity")]
    DataValidity,
    #[serde(rename = "ethical issues")]
    EthicalIssues,
    #[serde(rename = "external link")]
    ExternalLink,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::MethodologicalConcerns,
        Category::FigureAnomalies,
        Category::Clarification,
        Category::DataValidity,
        Category::EthicalIssues,
        Category::ExternalLink,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::MethodologicalConcerns => "methodological concerns",
            Category::FigureAnomalies => "figure anomalies",
            Category::Clarification => "clarification",
            Category::DataValidity => "data validity",
            Category::EthicalIssues => "ethical issues",
            Category::ExternalLink => "external link",
        }
    }

    /// Position in `ALL`, used for the 1-6 hotkeys and grid cursor.
    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|c| *c == self)
            .unwrap_or_default()
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == label)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_labels_match_as_str() {
        for category in Category::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.as_str()));
        }
    }

    #[test]
    fn test_all_labels_are_distinct() {
        let mut labels: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), 6);
    }

    #[test]
    fn test_index_round_trips_through_from_index() {
        for (i, category) in Category::ALL.iter().enumerate() {
            assert_eq!(category.index(), i);
            assert_eq!(Category::from_index(i), Some(*category));
        }
        assert_eq!(Category::from_index(6), None);
    }

    #[test]
    fn test_from_label() {
        assert_eq!(
            Category::from_label("data validity"),
            Some(Category::DataValidity)
        );
        assert_eq!(Category::from_label("Data Validity"), None);
        assert_eq!(Category::from_label(""), None);
    }
}
