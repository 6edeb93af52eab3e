//! Repository → issue → comment workflow
//!
//! The three steps, their request/response schemas, and the keys their
//! extracted identifiers are published under.

use serde::{Deserialize, Serialize};

use crate::config::ForgeConfig;
use crate::pipeline::{Step, StepValue};

/// Name of the repository-creation step
pub const CREATE_REPOSITORY: &str = "create-repository";
/// Name of the issue-creation step
pub const CREATE_ISSUE: &str = "create-issue";
/// Name of the comment step
pub const ADD_COMMENT: &str = "add-comment";

/// Output key for the created repository's `owner/name`
pub const REPO_FULL_NAME: &str = "repo_full_name";
/// Output key for the created issue's number
pub const ISSUE_NUMBER: &str = "issue_number";

/// `POST user/repos` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRepository {
    /// Repository name
    pub name: String,
    /// Repository description
    pub description: String,
    /// Private repository flag
    pub private: bool,
}

/// The part of the repository response the workflow needs
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepositoryCreated {
    /// `owner/name`
    pub full_name: String,
}

/// `POST repos/{full_name}/issues` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewIssue {
    /// Issue title
    pub title: String,
    /// Issue body
    pub body: String,
}

/// The part of the issue response the workflow needs
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IssueCreated {
    /// Issue number within the repository
    pub number: u64,
}

/// `POST repos/{full_name}/issues/{number}/comments` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewComment {
    /// Comment text
    pub body: String,
}

/// Build the three workflow steps from the configured request bodies.
#[must_use]
pub fn issue_workflow(config: &ForgeConfig) -> Vec<Step> {
    let repository = NewRepository {
        name: config.repository.name.clone(),
        description: config.repository.description.clone(),
        private: config.repository.private,
    };
    let issue = NewIssue {
        title: config.issue.title.clone(),
        body: config.issue.body.clone(),
    };
    let comment = NewComment {
        body: config.comment.body.clone(),
    };

    vec![
        Step::new(CREATE_REPOSITORY, move |input| {
            input.post("user/repos".to_string(), &repository)
        })
        .extract(REPO_FULL_NAME, |r: RepositoryCreated| {
            StepValue::Text(r.full_name)
        }),
        Step::new(CREATE_ISSUE, move |input| {
            let repo = input.text(REPO_FULL_NAME)?;
            input.post(format!("repos/{repo}/issues"), &issue)
        })
        .after(CREATE_REPOSITORY)
        .extract(ISSUE_NUMBER, |i: IssueCreated| StepValue::Number(i.number)),
        Step::new(ADD_COMMENT, move |input| {
            let repo = input.text(REPO_FULL_NAME)?;
            let number = input.number(ISSUE_NUMBER)?;
            input.post(format!("repos/{repo}/issues/{number}/comments"), &comment)
        })
        .after(CREATE_REPOSITORY)
        .after(CREATE_ISSUE),
    ]
}
