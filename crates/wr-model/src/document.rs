//! Documents, problems and issue tags

use crate::ids::{DocumentId, ProblemId};
use crate::ward::Ward;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Free-form category label attached to a problem
///
/// Equality is exact: no case folding, no trimming.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueTag(String);

impl IssueTag {
    /// Wrap a raw label
    #[inline]
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Borrow the raw label
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IssueTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IssueTag {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl From<String> for IssueTag {
    fn from(label: String) -> Self {
        Self(label)
    }
}

/// Language used when a problem description is displayed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English text
    #[default]
    English,
    /// Hindi text
    Hindi,
}

impl std::str::FromStr for Language {
    type Err = crate::ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "english" | "en" => Ok(Self::English),
            "hindi" | "hi" => Ok(Self::Hindi),
            other => Err(crate::ModelError::UnknownLanguage(other.to_string())),
        }
    }
}

/// Bilingual problem description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    /// English text
    pub english: String,
    /// Hindi text
    pub hindi: String,
}

impl Description {
    /// Create description from both texts
    #[must_use]
    pub fn new(english: impl Into<String>, hindi: impl Into<String>) -> Self {
        Self {
            english: english.into(),
            hindi: hindi.into(),
        }
    }

    /// Text in the requested language
    #[inline]
    #[must_use]
    pub fn text(&self, language: Language) -> &str {
        match language {
            Language::English => &self.english,
            Language::Hindi => &self.hindi,
        }
    }
}

/// One reported issue instance on a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    /// Problem identifier
    pub id: ProblemId,
    /// Category labels
    pub category: Vec<IssueTag>,
    /// Bilingual description
    pub description: Description,
}

impl Problem {
    /// Whether this problem carries `issue`
    #[inline]
    #[must_use]
    pub fn has_issue(&self, issue: &IssueTag) -> bool {
        self.category.contains(issue)
    }
}

/// One scanned form linked to a person
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Document identifier
    pub id: DocumentId,
    /// Raw name as captured, possibly with a parenthetical suffix
    pub name: String,
    /// Contact phone number
    pub phone_number: Option<String>,
    /// Dialling code accompanying the phone number
    pub country_code: Option<String>,
    /// Ward the document was filed in
    pub ward: Option<Ward>,
    /// Problems, in document order
    pub problems: Vec<Problem>,
}

impl Document {
    /// Name shown in listings
    #[inline]
    #[must_use]
    pub fn display_name(&self) -> &str {
        display_name(&self.name)
    }

    /// Union of the problems' labels, in first-seen order
    #[must_use]
    pub fn issues(&self) -> Vec<IssueTag> {
        let set: IndexSet<&IssueTag> = self.problems.iter().flat_map(|p| &p.category).collect();
        set.into_iter().cloned().collect()
    }

    /// Find a problem by id
    #[must_use]
    pub fn problem(&self, id: &ProblemId) -> Option<&Problem> {
        self.problems.iter().find(|p| &p.id == id)
    }
}

/// Strip a parenthetical suffix from a captured name
///
/// `"Jane Doe (alt)"` becomes `"Jane Doe"`. Names without a parenthesis are
/// returned untouched.
#[must_use]
pub fn display_name(name: &str) -> &str {
    match name.split_once('(') {
        Some((head, _)) => head.trim(),
        None => name,
    }
}
