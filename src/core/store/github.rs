use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use super::{
    CommitReceipt, CommitRequest, ConcurrencyToken, ManifestStore, Precondition, StoredFile,
};
use crate::core::error::{ModboxError, ModboxResult};

pub const GITHUB_API: &str = "https://api.github.com";
const GITHUB_API_VERSION: &str = "2022-11-28";

const CREATE_COMMIT_MUTATION: &str = r#"
mutation($input: CreateCommitOnBranchInput!) {
  createCommitOnBranch(input: $input) {
    commit {
      url
      oid
    }
  }
}"#;

/// `owner/repo` of a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLocator {
    pub owner: String,
    pub repo: String,
}

impl RepoLocator {
    /// Accepts `http(s)://[www.]github.com/<owner>/<repo>[/]` and nothing else.
    pub fn parse_url(url: &str) -> ModboxResult<Self> {
        let invalid = || ModboxError::InvalidRepositoryUrl(url.to_string());

        let rest = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .ok_or_else(invalid)?;
        let rest = rest.strip_prefix("www.").unwrap_or(rest);
        let rest = rest.strip_prefix("github.com/").ok_or_else(invalid)?;
        let rest = rest.strip_suffix('/').unwrap_or(rest);

        let mut parts = rest.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(repo), None)
                if is_path_segment(owner) && is_path_segment(repo) =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            _ => Err(invalid()),
        }
    }

    pub fn name_with_owner(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

fn is_path_segment(s: &str) -> bool {
    !s.is_empty() && !s.chars().any(char::is_whitespace)
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(rename = "type")]
    kind: String,
    sha: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct RefResponse {
    object: RefObject,
}

#[derive(Debug, Deserialize)]
struct RefObject {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<CommitData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitData {
    create_commit_on_branch: Option<CreatedCommit>,
}

#[derive(Debug, Deserialize)]
struct CreatedCommit {
    commit: CommitInfo,
}

#[derive(Debug, Deserialize)]
struct CommitInfo {
    url: String,
    oid: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    message: String,
}

#[derive(Debug, Serialize)]
struct FileAddition<'a> {
    path: &'a str,
    contents: String,
}

#[derive(Debug, Deserialize)]
struct CreatedRepository {
    html_url: String,
}

/// Pack files in a GitHub repository branch.
///
/// Read tokens are blob SHAs. A commit pins the branch head, checks every
/// precondition against that head, then commits with `expectedHeadOid` so a
/// concurrent push is rejected by GitHub rather than overwritten.
pub struct GitHubStore {
    client: Client,
    api_base: String,
    token: String,
    repo: RepoLocator,
    branch: String,
}

impl GitHubStore {
    pub fn new(client: Client, token: impl Into<String>, repo: RepoLocator) -> Self {
        Self {
            client,
            api_base: GITHUB_API.to_string(),
            token: token.into(),
            repo,
            branch: "main".to_string(),
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        authorize(builder, &self.token)
    }

    async fn read_at(&self, path: &str, git_ref: &str) -> ModboxResult<Option<StoredFile>> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base, self.repo.owner, self.repo.repo, path
        );
        let resp = self
            .authorized(self.client.get(&url))
            .query(&[("ref", git_ref)])
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ModboxError::StoreStatus {
                url,
                status: status.as_u16(),
            });
        }

        let body: ContentResponse = resp.json().await?;
        if body.kind != "file" {
            return Err(ModboxError::GitHubApi(format!("{path} is not a file")));
        }

        Ok(Some(StoredFile {
            content: decode_content(path, &body.content)?,
            token: ConcurrencyToken::new(body.sha),
        }))
    }

    async fn head_oid(&self) -> ModboxResult<String> {
        let url = format!(
            "{}/repos/{}/{}/git/ref/heads/{}",
            self.api_base, self.repo.owner, self.repo.repo, self.branch
        );
        let resp = self.authorized(self.client.get(&url)).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ModboxError::StoreStatus {
                url,
                status: status.as_u16(),
            });
        }

        let body: RefResponse = resp.json().await?;
        Ok(body.object.sha)
    }

    async fn check_precondition(&self, pre: &Precondition, head: &str) -> ModboxResult<()> {
        let current = self.read_at(&pre.path, head).await?.map(|f| f.token);
        if current != pre.expected {
            debug!(
                "Precondition failed for {}: expected {:?}, found {:?}",
                pre.path, pre.expected, current
            );
            return Err(ModboxError::Conflict(pre.path.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl ManifestStore for GitHubStore {
    async fn read_file(&self, path: &str) -> ModboxResult<Option<StoredFile>> {
        self.read_at(path, &self.branch).await
    }

    async fn commit_batch(&self, request: CommitRequest) -> ModboxResult<CommitReceipt> {
        let head = self.head_oid().await?;

        for pre in &request.preconditions {
            self.check_precondition(pre, &head).await?;
        }

        let additions: Vec<FileAddition<'_>> = request
            .writes
            .iter()
            .map(|w| FileAddition {
                path: &w.path,
                contents: STANDARD.encode(w.content.as_bytes()),
            })
            .collect();

        let body = json!({
            "query": CREATE_COMMIT_MUTATION,
            "variables": {
                "input": {
                    "branch": {
                        "repositoryNameWithOwner": self.repo.name_with_owner(),
                        "branchName": self.branch,
                    },
                    "message": { "headline": request.message },
                    "fileChanges": { "additions": additions },
                    "expectedHeadOid": head,
                }
            }
        });

        let url = format!("{}/graphql", self.api_base);
        let resp = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ModboxError::StoreStatus {
                url,
                status: status.as_u16(),
            });
        }

        let response: GraphQlResponse = resp.json().await?;
        let commit = commit_from_response(response, &self.branch)?;

        info!(
            "Committed {} file(s) to {}@{}: {}",
            request.writes.len(),
            self.repo.name_with_owner(),
            self.branch,
            commit.oid
        );
        Ok(CommitReceipt {
            revision: commit.oid,
            url: Some(commit.url),
        })
    }
}

fn authorize(builder: RequestBuilder, token: &str) -> RequestBuilder {
    builder
        .bearer_auth(token)
        .header("Accept", "application/vnd.github+json")
        .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
}

/// The contents API returns base64 wrapped at 60 columns.
fn decode_content(path: &str, encoded: &str) -> ModboxResult<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(compact)?;
    String::from_utf8(bytes).map_err(|_| ModboxError::NotUtf8(path.to_string()))
}

fn commit_from_response(response: GraphQlResponse, branch: &str) -> ModboxResult<CommitInfo> {
    if !response.errors.is_empty() {
        let stale = response.errors.iter().any(|e| {
            e.kind.as_deref() == Some("STALE_DATA")
                || e.message.contains("Expected branch to point to")
        });
        if stale {
            return Err(ModboxError::Conflict(format!("branch {branch}")));
        }
        let messages: Vec<&str> = response.errors.iter().map(|e| e.message.as_str()).collect();
        return Err(ModboxError::GitHubApi(messages.join("; ")));
    }

    response
        .data
        .and_then(|d| d.create_commit_on_branch)
        .map(|c| c.commit)
        .ok_or_else(|| ModboxError::GitHubApi("createCommitOnBranch returned no commit".into()))
}

/// Create a repository for the authenticated user with an initial commit.
pub async fn create_repository(
    client: &Client,
    api_base: &str,
    token: &str,
    name: &str,
    description: &str,
) -> ModboxResult<RepoLocator> {
    let url = format!("{}/user/repos", api_base.trim_end_matches('/'));
    let resp = authorize(client.post(&url), token)
        .json(&json!({
            "name": name,
            "description": description,
            "auto_init": true,
        }))
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        return Err(ModboxError::StoreStatus {
            url,
            status: status.as_u16(),
        });
    }

    let created: CreatedRepository = resp.json().await?;
    info!("Created repository {}", created.html_url);
    RepoLocator::parse_url(&created.html_url)
}
