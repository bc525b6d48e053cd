//! Typed GraphQL queries.
//!
//! Queries are static documents; caller data only ever travels in `variables`.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::types::ReviewDecision;
use crate::error::{LabelerError, Result};

/// GraphQL request body
#[derive(Debug, Serialize)]
pub struct GraphQlRequest<V: Serialize> {
    pub query: &'static str,
    pub variables: V,
}

/// GraphQL response wrapper
#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphQlError>>,
}

/// GraphQL error
#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

impl<T> GraphQlResponse<T> {
    /// Return the data, or the joined error messages.
    pub fn into_data(self) -> Result<T> {
        if let Some(errors) = self.errors.filter(|errors| !errors.is_empty()) {
            let messages: Vec<_> = errors.iter().map(|e| e.message.as_str()).collect();
            return Err(LabelerError::GraphQl(messages.join(", ")));
        }
        self.data
            .ok_or_else(|| LabelerError::GraphQl("No data in GraphQL response".to_string()))
    }
}

/// A query document with typed variables and response.
pub trait Query {
    type Variables: Serialize;
    type Response: DeserializeOwned;

    const DOCUMENT: &'static str;

    fn variables(&self) -> Self::Variables;

    fn request(&self) -> GraphQlRequest<Self::Variables> {
        GraphQlRequest {
            query: Self::DOCUMENT,
            variables: self.variables(),
        }
    }
}

/// Fetch the aggregate review decision of one pull request.
#[derive(Debug, Clone)]
pub struct ReviewDecisionQuery {
    pub owner: String,
    pub name: String,
    pub number: u64,
}

#[derive(Debug, Serialize)]
pub struct ReviewDecisionVariables {
    owner: String,
    name: String,
    number: u64,
}

#[derive(Debug, Deserialize)]
pub struct ReviewDecisionData {
    repository: Option<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
struct RepositoryNode {
    #[serde(rename = "pullRequest")]
    pull_request: Option<PullRequestNode>,
}

#[derive(Debug, Deserialize)]
struct PullRequestNode {
    #[serde(rename = "reviewDecision")]
    review_decision: Option<ReviewDecision>,
}

impl ReviewDecisionData {
    /// The decision, or `NotFound` when the repository or pull request is missing.
    pub fn decision(self, number: u64) -> Result<Option<ReviewDecision>> {
        self.repository
            .and_then(|repository| repository.pull_request)
            .map(|pull_request| pull_request.review_decision)
            .ok_or_else(|| LabelerError::NotFound(format!("pull request #{number}")))
    }
}

impl Query for ReviewDecisionQuery {
    type Variables = ReviewDecisionVariables;
    type Response = ReviewDecisionData;

    const DOCUMENT: &'static str = r"
        query ReviewDecision($owner: String!, $name: String!, $number: Int!) {
            repository(owner: $owner, name: $name) {
                pullRequest(number: $number) {
                    reviewDecision
                }
            }
        }
    ";

    fn variables(&self) -> Self::Variables {
        ReviewDecisionVariables {
            owner: self.owner.clone(),
            name: self.name.clone(),
            number: self.number,
        }
    }
}
