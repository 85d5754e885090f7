//! Testing utilities for the Ward Report workspace
//!
//! Shared fixtures: datasets, an in-memory backend, and client helpers.

#![allow(missing_docs)]

pub mod dataset;
pub mod fixture;

pub use dataset::{sample_dataset, Dataset, DatasetBuilder, DocumentFixture, ProblemFixture};
pub use fixture::FixtureTransport;

use std::sync::Arc;
use wr_client::ReportClient;

/// Client and the transport behind it, for asserting on calls
pub fn fixture_client(dataset: Dataset) -> (ReportClient, Arc<FixtureTransport>) {
    let transport = Arc::new(FixtureTransport::new(dataset));
    (ReportClient::new(transport.clone()), transport)
}

pub fn sample_client() -> (ReportClient, Arc<FixtureTransport>) {
    fixture_client(sample_dataset())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wr_client::{Endpoint, ReportError, TransportError};
    use wr_model::{GroupKey, IssueTag, ProblemRef, RequestId, Ward};

    #[tokio::test]
    async fn fixture_serves_common_problems() {
        let (client, transport) = sample_client();
        let report = client.common_problems(&RequestId::new("r1")).await.unwrap();

        assert_eq!(report.title, "March survey");
        assert_eq!(report.total_members(), sample_dataset().total_problems());
        let pipes = report.group(&GroupKey::new("g1")).unwrap();
        assert_eq!(pipes.summary, "Pipes");
        assert_eq!(pipes.count(), 4);
        assert_eq!(transport.calls(Endpoint::CommonProblems), 1);
    }

    #[tokio::test]
    async fn fixture_unwinds_ward_issue_rows() {
        let (client, _) = sample_client();
        let docs = client
            .ward_issue_problems(&RequestId::new("r1"), &Ward::new("5"), &IssueTag::new("leak"))
            .await
            .unwrap();
        let members: Vec<ProblemRef> = docs
            .iter()
            .map(|d| ProblemRef::new(d.id.clone(), d.problems[0].id.clone()))
            .collect();
        assert_eq!(members, vec![ProblemRef::new("d1", "p1"), ProblemRef::new("d2", "p3")]);
    }

    #[tokio::test]
    async fn queued_failure_is_consumed_once() {
        let (client, transport) = sample_client();
        transport.fail_next(Endpoint::Analysis, TransportError::Connection("down".into()));

        let first = client.analysis(&RequestId::new("r1")).await;
        assert!(matches!(first, Err(ReportError::Network(_))));
        assert!(client.analysis(&RequestId::new("r1")).await.is_ok());
        assert_eq!(transport.calls(Endpoint::Analysis), 2);
    }

    #[tokio::test]
    async fn unknown_request_is_not_found() {
        let (client, _) = sample_client();
        let err = client.analysis(&RequestId::new("nope")).await.unwrap_err();
        assert!(matches!(err, ReportError::NotFound { .. }));
    }
}
