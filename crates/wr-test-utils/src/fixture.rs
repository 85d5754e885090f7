//! In-memory backend

use crate::dataset::{Dataset, DocumentFixture, ProblemFixture};
use async_trait::async_trait;
use dashmap::DashMap;
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::time::Duration;
use wr_client::{ApiRequest, Endpoint, Transport, TransportError};
use wr_grouping::compute_analysis;
use wr_model::{IssueTag, ProblemRef, RequestId, Ward};

/// Transport answering from datasets held in memory
///
/// Counts calls per endpoint. Delays and failures are queued per endpoint
/// and consumed by the next matching call.
#[derive(Debug, Default)]
pub struct FixtureTransport {
    datasets: RwLock<IndexMap<RequestId, Dataset>>,
    users: RwLock<Vec<Value>>,
    calls: DashMap<Endpoint, usize>,
    log: Mutex<Vec<ApiRequest>>,
    delays: DashMap<Endpoint, VecDeque<Duration>>,
    failures: DashMap<Endpoint, VecDeque<TransportError>>,
    overrides: DashMap<Endpoint, VecDeque<Value>>,
}

impl FixtureTransport {
    pub fn new(dataset: Dataset) -> Self {
        let transport = Self::default();
        transport.insert(dataset);
        transport
    }

    pub fn insert(&self, dataset: Dataset) {
        self.datasets
            .write()
            .insert(dataset.request_id().clone(), dataset);
    }

    pub fn with_users(self, users: Vec<Value>) -> Self {
        *self.users.write() = users;
        self
    }

    /// Mutate a dataset in place
    pub fn update<R>(&self, request_id: &str, f: impl FnOnce(&mut Dataset) -> R) -> Option<R> {
        self.datasets
            .write()
            .get_mut(&RequestId::new(request_id))
            .map(f)
    }

    /// Calls made to `endpoint` so far
    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.calls.get(&endpoint).map_or(0, |c| *c)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.iter().map(|c| *c.value()).sum()
    }

    /// Requests received, in arrival order
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.log.lock().clone()
    }

    /// Delay the next call to `endpoint`
    pub fn delay_next(&self, endpoint: Endpoint, delay: Duration) {
        self.delays.entry(endpoint).or_default().push_back(delay);
    }

    /// Fail the next call to `endpoint`
    pub fn fail_next(&self, endpoint: Endpoint, error: TransportError) {
        self.failures.entry(endpoint).or_default().push_back(error);
    }

    /// Answer the next call to `endpoint` with a raw payload
    pub fn respond_next(&self, endpoint: Endpoint, payload: Value) {
        self.overrides.entry(endpoint).or_default().push_back(payload);
    }

    fn respond(&self, request: &ApiRequest) -> Result<Value, TransportError> {
        if request.endpoint == Endpoint::ListUsers {
            return Ok(Value::Array(self.users.read().clone()));
        }

        let datasets = self.datasets.read();
        if request.endpoint == Endpoint::ListRequests {
            let requests: Vec<Value> = datasets
                .values()
                .map(request_json)
                .collect::<Result<_, _>>()?;
            return Ok(Value::Array(requests));
        }

        let request_id = RequestId::new(arg(request, 0)?);
        let dataset = datasets
            .get(&request_id)
            .ok_or_else(|| TransportError::NotFound(request.display_path()))?;

        match request.endpoint {
            Endpoint::CommonProblems => Ok(common_problems_json(dataset)),
            Endpoint::WardWiseReport => Ok(ward_report_json(dataset)),
            Endpoint::Analysis => Ok(analysis_json(dataset)),
            Endpoint::TaggedDocs => {
                let issue = IssueTag::new(arg(request, 1)?);
                Ok(Value::Array(
                    dataset
                        .documents
                        .iter()
                        .filter(|d| d.problems.iter().any(|p| p.problem.has_issue(&issue)))
                        .map(document_json)
                        .collect(),
                ))
            }
            Endpoint::GroupedIssues => {
                let body = request.body.clone().unwrap_or(Value::Null);
                let members: Vec<ProblemRef> = serde_json::from_value(body).map_err(|_| {
                    TransportError::Status {
                        code: 400,
                        path: request.display_path(),
                    }
                })?;
                Ok(Value::Array(
                    dataset
                        .documents
                        .iter()
                        .filter(|d| members.iter().any(|m| m.doc_id == d.id))
                        .map(document_json)
                        .collect(),
                ))
            }
            Endpoint::WardIssueProblems => {
                let ward = Ward::new(arg(request, 1)?);
                let issue = IssueTag::new(arg(request, 2)?);
                let mut rows = Vec::new();
                for doc in &dataset.documents {
                    let in_ward = doc
                        .ward
                        .as_ref()
                        .map_or(ward.is_not_provided(), |w| w == &ward);
                    if !in_ward {
                        continue;
                    }
                    for problem in doc.problems.iter().filter(|p| p.problem.has_issue(&issue)) {
                        rows.push(json!({
                            "id": doc.id.as_str(),
                            "name": doc.name,
                            "ward": doc.ward.as_ref().map(Ward::as_str),
                            "phoneNumber": doc.phone_number,
                            "problems": problem_json(problem),
                        }));
                    }
                }
                Ok(Value::Array(rows))
            }
            Endpoint::RequestDetails => {
                let mut details = request_json(dataset)?;
                details["documents"] =
                    Value::Array(dataset.documents.iter().map(document_json).collect());
                Ok(details)
            }
            Endpoint::DocumentDetails => {
                let doc_id = arg(request, 1)?;
                dataset
                    .documents
                    .iter()
                    .find(|d| d.id.as_str() == doc_id)
                    .map(document_json)
                    .ok_or_else(|| TransportError::NotFound(request.display_path()))
            }
            Endpoint::ListRequests | Endpoint::ListUsers => Ok(Value::Null),
        }
    }
}

#[async_trait]
impl Transport for FixtureTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, TransportError> {
        let endpoint = request.endpoint;
        *self.calls.entry(endpoint).or_insert(0) += 1;
        self.log.lock().push(request.clone());

        let delay = self.delays.get_mut(&endpoint).and_then(|mut q| q.pop_front());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.failures.get_mut(&endpoint).and_then(|mut q| q.pop_front());
        if let Some(error) = failure {
            return Err(error);
        }
        let payload = self.overrides.get_mut(&endpoint).and_then(|mut q| q.pop_front());
        if let Some(payload) = payload {
            return Ok(payload);
        }

        self.respond(&request)
    }
}

fn arg(request: &ApiRequest, index: usize) -> Result<&str, TransportError> {
    request
        .args
        .get(index)
        .map(String::as_str)
        .ok_or_else(|| TransportError::Status {
            code: 400,
            path: request.display_path(),
        })
}

fn request_json(dataset: &Dataset) -> Result<Value, TransportError> {
    serde_json::to_value(&dataset.request).map_err(|e| TransportError::Decode(e.to_string()))
}

fn problem_json(problem: &ProblemFixture) -> Value {
    json!({
        "id": problem.problem.id.as_str(),
        "category": problem.problem.category.iter().map(IssueTag::as_str).collect::<Vec<_>>(),
        "description": {
            "english": problem.problem.description.english,
            "hindi": problem.problem.description.hindi,
        },
    })
}

fn document_json(doc: &DocumentFixture) -> Value {
    let document = doc.to_document();
    json!({
        "id": doc.id.as_str(),
        "name": doc.name,
        "phoneNumber": doc.phone_number,
        "countryCode": document.country_code,
        "ward": doc.ward.as_ref().map(Ward::as_str),
        "issues": document.issues().iter().map(IssueTag::as_str).collect::<Vec<_>>(),
        "problems": doc.problems.iter().map(problem_json).collect::<Vec<_>>(),
    })
}

fn member_json(doc: &DocumentFixture, problem: &ProblemFixture) -> Value {
    json!({"docId": doc.id.as_str(), "problemId": problem.problem.id.as_str()})
}

fn labels(problem: &ProblemFixture) -> Vec<&str> {
    problem.problem.category.iter().map(IssueTag::as_str).collect()
}

// One record per problem, so the client has to fold records sharing an id.
fn common_problems_json(dataset: &Dataset) -> Value {
    let mut records = Vec::new();
    for doc in &dataset.documents {
        for problem in &doc.problems {
            let key = dataset
                .group_key(&problem.summary)
                .map(|k| k.as_str().to_string())
                .unwrap_or_default();
            records.push(json!({
                "id": key,
                "issues": labels(problem),
                "problemIds": [member_json(doc, problem)],
                "summary": problem.summary,
            }));
        }
    }
    json!({"title": dataset.request.title, "commonProblems": records})
}

fn ward_report_json(dataset: &Dataset) -> Value {
    let mut wards: IndexMap<Ward, Vec<Value>> = IndexMap::new();
    for doc in &dataset.documents {
        let ward = Ward::or_not_provided(doc.ward.clone());
        let fragments = wards.entry(ward).or_default();
        for problem in &doc.problems {
            fragments.push(json!({
                "issues": labels(problem),
                "problemIds": [member_json(doc, problem)],
                "summary": problem.summary,
            }));
        }
    }

    let wards: Vec<Value> = wards
        .into_iter()
        .map(|(ward, problems)| {
            json!({
                "wardId": format!("w-{ward}"),
                "ward": ward.as_str(),
                "category": dataset.ward_category(&ward),
                "problems": problems,
            })
        })
        .collect();
    json!({"reqId": dataset.request_id().as_str(), "wards": wards})
}

fn analysis_json(dataset: &Dataset) -> Value {
    let documents = dataset.documents();
    let entries: Vec<Value> = compute_analysis(&documents)
        .into_iter()
        .map(|entry| {
            json!({
                "ward": entry.ward.as_str(),
                "totalProblems": entry.total_problems,
                "category": entry
                    .category
                    .iter()
                    .map(|c| json!({"issue": c.issue.as_str(), "problemCount": c.problem_count}))
                    .collect::<Vec<_>>(),
            })
        })
        .collect();
    Value::Array(entries)
}
