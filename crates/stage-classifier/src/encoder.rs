//! Categorical Label Encoding

use crate::ClassifierError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Bijection between label strings and dense class indices.
///
/// Classes are sorted lexicographically, so `"awake" < "nonrem" < "rem"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Learn the distinct classes of `labels`
    pub fn fit<S: AsRef<str>>(labels: &[S]) -> Self {
        let classes: BTreeSet<&str> = labels.iter().map(AsRef::as_ref).collect();
        Self {
            classes: classes.into_iter().map(str::to_string).collect(),
        }
    }

    /// Sorted class names; the index of a name is its code
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Code of a single label
    pub fn encode(&self, label: &str) -> Result<u32, ClassifierError> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .map(|idx| idx as u32)
            .map_err(|_| ClassifierError::UnknownLabel(label.to_string()))
    }

    /// Label of a single code
    pub fn decode(&self, code: u32) -> Result<&str, ClassifierError> {
        self.classes
            .get(code as usize)
            .map(String::as_str)
            .ok_or_else(|| ClassifierError::UnknownLabel(code.to_string()))
    }

    /// Encode every label
    pub fn transform<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<u32>, ClassifierError> {
        labels.iter().map(|l| self.encode(l.as_ref())).collect()
    }

    /// Decode every code
    pub fn inverse_transform(&self, codes: &[u32]) -> Result<Vec<String>, ClassifierError> {
        codes
            .iter()
            .map(|&c| self.decode(c).map(str::to_string))
            .collect()
    }
}
