//! In-memory report datasets

use indexmap::IndexMap;
use wr_model::{
    Description, Document, DocumentId, GroupKey, IssueTag, Problem, ProblemId, ProblemRef,
    Request, RequestId, RequestStatus, Ward,
};

/// Problem plus the summary signature the upstream pipeline gave it
#[derive(Debug, Clone)]
pub struct ProblemFixture {
    pub problem: Problem,
    pub summary: String,
}

/// Document under construction
#[derive(Debug, Clone)]
pub struct DocumentFixture {
    pub id: DocumentId,
    pub name: String,
    pub ward: Option<Ward>,
    pub phone_number: Option<String>,
    pub problems: Vec<ProblemFixture>,
}

impl DocumentFixture {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: DocumentId::new(id),
            name: name.to_string(),
            ward: None,
            phone_number: None,
            problems: Vec::new(),
        }
    }

    pub fn ward(mut self, ward: &str) -> Self {
        self.ward = Some(Ward::new(ward));
        self
    }

    pub fn phone(mut self, phone: &str) -> Self {
        self.phone_number = Some(phone.to_string());
        self
    }

    /// Add a problem; the English description defaults to the summary
    pub fn problem(mut self, id: &str, labels: &[&str], summary: &str) -> Self {
        self.problems.push(ProblemFixture {
            problem: Problem {
                id: ProblemId::new(id),
                category: labels.iter().map(|l| IssueTag::from(*l)).collect(),
                description: Description::new(summary, format!("{summary} (hi)")),
            },
            summary: summary.to_string(),
        });
        self
    }

    pub fn to_document(&self) -> Document {
        Document {
            id: self.id.clone(),
            name: self.name.clone(),
            phone_number: self.phone_number.clone(),
            country_code: self.phone_number.as_ref().map(|_| "+91".to_string()),
            ward: self.ward.clone(),
            problems: self.problems.iter().map(|p| p.problem.clone()).collect(),
        }
    }
}

/// One request with its documents
#[derive(Debug, Clone)]
pub struct Dataset {
    pub request: Request,
    pub documents: Vec<DocumentFixture>,
    pub ward_categories: IndexMap<Ward, String>,
}

impl Dataset {
    #[inline]
    pub fn request_id(&self) -> &RequestId {
        &self.request.id
    }

    pub fn documents(&self) -> Vec<Document> {
        self.documents.iter().map(DocumentFixture::to_document).collect()
    }

    pub fn total_problems(&self) -> usize {
        self.documents.iter().map(|d| d.problems.len()).sum()
    }

    /// Upstream group id for a summary: `g1`, `g2`, ... in first-seen order
    pub fn group_key(&self, summary: &str) -> Option<GroupKey> {
        self.summaries()
            .iter()
            .position(|s| s == summary)
            .map(|i| GroupKey::new(format!("g{}", i + 1)))
    }

    pub fn summaries(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for problem in self.documents.iter().flat_map(|d| &d.problems) {
            if !seen.contains(&problem.summary) {
                seen.push(problem.summary.clone());
            }
        }
        seen
    }

    /// Category label the ward section carries upstream
    pub fn ward_category(&self, ward: &Ward) -> String {
        self.ward_categories
            .get(ward)
            .cloned()
            .unwrap_or_else(|| "General".to_string())
    }

    /// Delete a problem, as if removed after the summary was computed
    pub fn remove_problem(&mut self, member: &ProblemRef) -> bool {
        let Some(doc) = self.documents.iter_mut().find(|d| d.id == member.doc_id) else {
            return false;
        };
        let before = doc.problems.len();
        doc.problems.retain(|p| p.problem.id != member.problem_id);
        doc.problems.len() != before
    }

    /// Every (document, problem) pair that falls under `summary`
    pub fn members_of(&self, summary: &str) -> Vec<ProblemRef> {
        self.documents
            .iter()
            .flat_map(|d| {
                d.problems
                    .iter()
                    .filter(|p| p.summary == summary)
                    .map(|p| ProblemRef::new(d.id.clone(), p.problem.id.clone()))
            })
            .collect()
    }
}

/// Builder for [`Dataset`]
#[derive(Debug, Clone)]
pub struct DatasetBuilder {
    dataset: Dataset,
}

impl DatasetBuilder {
    pub fn new(request_id: &str) -> Self {
        Self {
            dataset: Dataset {
                request: Request {
                    id: RequestId::new(request_id),
                    title: format!("Request {request_id}"),
                    description: String::new(),
                    pdf: Vec::new(),
                    doc_count: 0,
                    created_by: "fixture".to_string(),
                    created_at: "2024-01-01T00:00:00Z".to_string(),
                    status: RequestStatus::Completed,
                },
                documents: Vec::new(),
                ward_categories: IndexMap::new(),
            },
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.dataset.request.title = title.to_string();
        self
    }

    pub fn status(mut self, status: RequestStatus) -> Self {
        self.dataset.request.status = status;
        self
    }

    pub fn ward_category(mut self, ward: &str, category: &str) -> Self {
        self.dataset
            .ward_categories
            .insert(Ward::new(ward), category.to_string());
        self
    }

    pub fn document(mut self, document: DocumentFixture) -> Self {
        self.dataset.documents.push(document);
        self
    }

    pub fn build(mut self) -> Dataset {
        self.dataset.request.doc_count = self.dataset.documents.len() as u64;
        self.dataset
    }
}

/// Small dataset used across suites
///
/// | doc | ward | problems |
/// |-----|------|----------|
/// | d1 | 5 | p1 leak "Pipes", p2 noise "Traffic" |
/// | d2 | 5 | p3 leak+noise "Pipes" |
/// | d3 | 2 | p4 road "Potholes" |
/// | d4 | (none) | p5 leak "Pipes" |
/// | d5 | 10 | p6 dust "Dust", p7 leak "Pipes" |
pub fn sample_dataset() -> Dataset {
    DatasetBuilder::new("r1")
        .title("March survey")
        .ward_category("5", "Water")
        .ward_category("2", "Roads")
        .document(
            DocumentFixture::new("d1", "Jane Doe (alt)")
                .ward("5")
                .phone("9800000001")
                .problem("p1", &["leak"], "Pipes")
                .problem("p2", &["noise"], "Traffic"),
        )
        .document(
            DocumentFixture::new("d2", "Ravi Kumar")
                .ward("5")
                .problem("p3", &["leak", "noise"], "Pipes"),
        )
        .document(
            DocumentFixture::new("d3", "Asha Verma (neighbour)")
                .ward("2")
                .problem("p4", &["road"], "Potholes"),
        )
        .document(DocumentFixture::new("d4", "Unknown").problem("p5", &["leak"], "Pipes"))
        .document(
            DocumentFixture::new("d5", "Meena")
                .ward("10")
                .problem("p6", &["dust"], "Dust")
                .problem("p7", &["leak"], "Pipes"),
        )
        .build()
}
