//! Drill-down rows and member references

use crate::document::{display_name, Document, IssueTag, Language, Problem};
use crate::ids::{DocumentId, ProblemId};
use crate::ward::Ward;
use serde::{Deserialize, Serialize};

/// Reference to one problem on one document
///
/// Group membership is a set of these; the pair is the identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemRef {
    /// Owning document
    pub doc_id: DocumentId,
    /// Problem on that document
    pub problem_id: ProblemId,
}

impl ProblemRef {
    /// Create a reference
    #[inline]
    #[must_use]
    pub fn new(doc_id: impl Into<DocumentId>, problem_id: impl Into<ProblemId>) -> Self {
        Self {
            doc_id: doc_id.into(),
            problem_id: problem_id.into(),
        }
    }
}

/// Flattened (document, problem) pair shown in a drill-down table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatProblemRow {
    /// Owning document
    pub document_id: DocumentId,
    /// Document ward
    pub ward: Option<Ward>,
    /// Display name, parenthetical suffix stripped
    pub name: String,
    /// Contact phone number
    pub phone_number: Option<String>,
    /// Description in the session language
    pub description: String,
    /// Problem labels
    pub category: Vec<IssueTag>,
    /// Problem identifier, the row key
    pub problem_id: ProblemId,
}

impl FlatProblemRow {
    /// Flatten one problem of `document`
    #[must_use]
    pub fn from_parts(document: &Document, problem: &Problem, language: Language) -> Self {
        Self {
            document_id: document.id.clone(),
            ward: document.ward.clone(),
            name: display_name(&document.name).to_string(),
            phone_number: document.phone_number.clone(),
            description: problem.description.text(language).to_string(),
            category: problem.category.clone(),
            problem_id: problem.id.clone(),
        }
    }

    /// One row per problem of `document`
    #[must_use]
    pub fn fan_out(document: &Document, language: Language) -> Vec<Self> {
        document
            .problems
            .iter()
            .map(|p| Self::from_parts(document, p, language))
            .collect()
    }

    /// Unique row key
    #[inline]
    #[must_use]
    pub fn key(&self) -> &ProblemId {
        &self.problem_id
    }

    /// Member reference of this row
    #[must_use]
    pub fn member_ref(&self) -> ProblemRef {
        ProblemRef::new(self.document_id.clone(), self.problem_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Description;

    #[test]
    fn fan_out_yields_one_row_per_problem() {
        let doc = Document {
            id: DocumentId::new("d1"),
            name: "Asha Verma (neighbour)".to_string(),
            phone_number: Some("98100".to_string()),
            country_code: Some("+91".to_string()),
            ward: Some(Ward::from("5")),
            problems: vec![
                Problem {
                    id: ProblemId::new("p1"),
                    category: vec![IssueTag::from("leak")],
                    description: Description::new("pipe leak", "पाइप रिसाव"),
                },
                Problem {
                    id: ProblemId::new("p2"),
                    category: vec![],
                    description: Description::new("dark street", "अंधेरी सड़क"),
                },
            ],
        };

        let rows = FlatProblemRow::fan_out(&doc, Language::Hindi);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Asha Verma");
        assert_eq!(rows[0].description, "पाइप रिसाव");
        assert_eq!(rows[1].key(), &ProblemId::new("p2"));
        assert_eq!(rows[1].member_ref(), ProblemRef::new("d1", "p2"));
    }

    #[test]
    fn problem_ref_uses_wire_field_names() {
        let r: ProblemRef =
            serde_json::from_value(serde_json::json!({"docId": "d", "problemId": "p"})).unwrap();
        assert_eq!(r, ProblemRef::new("d", "p"));
    }
}
