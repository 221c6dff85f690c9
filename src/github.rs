use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::config::Config;

const GRAPHQL_URL: &str = "https://api.github.com/graphql";
const REST_URL: &str = "https://api.github.com";
const USER_AGENT: &str = "readme-stats";

/// An owned repository, as much of it as the aggregator needs.
#[derive(Debug, Clone)]
pub struct RepoInfo {
    pub name: String,
    pub is_fork: bool,
    pub updated_at: DateTime<Utc>,
}

/// Lines added/removed by a single push commit.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PushDiff {
    pub additions: u64,
    pub deletions: u64,
}

/// One contributor's entry in a repository's weekly contribution stats.
#[derive(Debug, Deserialize)]
pub struct ContributorStats {
    pub author: Option<StatsAuthor>,
    pub weeks: Vec<WeekStat>,
}

#[derive(Debug, Deserialize)]
pub struct StatsAuthor {
    pub login: String,
}

/// Per-week additions/deletions; `w` is the week's unix timestamp.
#[derive(Debug, Deserialize)]
pub struct WeekStat {
    pub w: i64,
    pub a: u64,
    pub d: u64,
}

#[derive(Debug, Deserialize)]
pub struct CommitFile {
    pub additions: u64,
    pub deletions: u64,
}

#[derive(Clone)]
pub struct GithubClient {
    token: Arc<String>,
    http: Arc<Client>,
    login: String,
    user_id: String,
}

impl GithubClient {
    /// Build a client from the configured token and resolve the
    /// authenticated user's login and node id.
    pub async fn connect(config: &Config) -> Result<Self> {
        let mut client = Self {
            token: Arc::new(config.github_token.clone()),
            http: Arc::new(Client::new()),
            login: String::new(),
            user_id: String::new(),
        };

        #[derive(Deserialize)]
        struct ViewerResponse {
            data: Option<ViewerData>,
        }
        #[derive(Deserialize)]
        struct ViewerData {
            viewer: Viewer,
        }
        #[derive(Deserialize)]
        struct Viewer {
            login: String,
            id: String,
        }

        let json = client.graphql("{ viewer { login id } }").await?;
        let parsed: ViewerResponse =
            serde_json::from_value(json).context("Failed to deserialize viewer response")?;
        let viewer = parsed
            .data
            .map(|d| d.viewer)
            .context("GitHub did not identify the authenticated user")?;

        client.login = viewer.login;
        client.user_id = viewer.id;
        Ok(client)
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    /// Low-level GraphQL request with `errors` checking. One attempt per
    /// call; a rate-limited or failing request fails the caller.
    async fn graphql(&self, query: &str) -> Result<Value> {
        let resp = self
            .http
            .post(GRAPHQL_URL)
            .bearer_auth(&*self.token)
            .header("User-Agent", USER_AGENT)
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Network error sending GraphQL request: {e}"))?;

        let status = resp.status();
        let json: Value = resp
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to parse JSON from GitHub: {e}"))?;

        if let Some(errors) = json.get("errors") {
            return Err(anyhow::anyhow!("GraphQL reported errors: {errors:#}"));
        }
        if !status.is_success() {
            return Err(anyhow::anyhow!(
                "GitHub API returned HTTP {}: {json:#}",
                status.as_u16()
            ));
        }

        Ok(json)
    }

    /// Typed REST GET against api.github.com.
    async fn rest<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self
            .http
            .get(format!("{REST_URL}{path}"))
            .bearer_auth(&*self.token)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Network error requesting {path}: {e}"))?;

        let status = resp.status();
        if status.as_u16() == 202 {
            return Err(anyhow::anyhow!(
                "GitHub is still computing statistics for {path}"
            ));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "GitHub API returned HTTP {} for {path}: {body}",
                status.as_u16()
            ));
        }

        resp.json()
            .await
            .with_context(|| format!("Failed to deserialize response for {path}"))
    }

    /// List owned repositories (first page; first: 100 matches the
    /// account sizes this is meant for).
    pub async fn owned_repos(&self) -> Result<Vec<RepoInfo>> {
        let query = r#"
        {
            viewer {
                repositories(ownerAffiliations: OWNER, first: 100) {
                    nodes {
                        name
                        isFork
                        updatedAt
                    }
                }
            }
        }
        "#;

        #[derive(Deserialize)]
        struct RepoListResponse {
            data: Option<RepoListData>,
        }
        #[derive(Deserialize)]
        struct RepoListData {
            viewer: RepoListViewer,
        }
        #[derive(Deserialize)]
        struct RepoListViewer {
            repositories: RepoNodes,
        }
        #[derive(Deserialize)]
        struct RepoNodes {
            nodes: Option<Vec<RepoNode>>,
        }
        #[derive(Deserialize)]
        struct RepoNode {
            name: String,
            #[serde(rename = "isFork")]
            is_fork: bool,
            #[serde(rename = "updatedAt")]
            updated_at: DateTime<Utc>,
        }

        let json = self.graphql(query).await?;
        let parsed: RepoListResponse =
            serde_json::from_value(json).context("Failed to deserialize owned_repos response")?;

        let nodes = parsed
            .data
            .map(|d| d.viewer.repositories)
            .and_then(|r| r.nodes)
            .unwrap_or_default();

        Ok(nodes
            .into_iter()
            .map(|n| RepoInfo {
                name: n.name,
                is_fork: n.is_fork,
                updated_at: n.updated_at,
            })
            .collect())
    }

    /// Number of public repositories owned by the user.
    pub async fn public_repo_count(&self) -> Result<u32> {
        let query = r#"
        {
            viewer {
                repositories(ownerAffiliations: OWNER, privacy: PUBLIC) {
                    totalCount
                }
            }
        }
        "#;

        #[derive(Deserialize)]
        struct CountResponse {
            data: Option<CountData>,
        }
        #[derive(Deserialize)]
        struct CountData {
            viewer: CountViewer,
        }
        #[derive(Deserialize)]
        struct CountViewer {
            repositories: CountObj,
        }
        #[derive(Deserialize)]
        struct CountObj {
            #[serde(rename = "totalCount")]
            total_count: u64,
        }

        let json = self.graphql(query).await?;
        let parsed: CountResponse = serde_json::from_value(json)
            .context("Failed to deserialize public_repo_count response")?;

        let count = parsed
            .data
            .map(|d| d.viewer.repositories.total_count)
            .unwrap_or(0);

        Ok(count as u32)
    }

    /// Per-language byte counts for one repository.
    pub async fn repo_languages(&self, repo: &str) -> Result<Vec<(String, u64)>> {
        let query = format!(
            r#"
            {{
                repository(owner: "{owner}", name: "{repo}") {{
                    languages(first: 100) {{
                        edges {{
                            size
                            node {{
                                name
                            }}
                        }}
                    }}
                }}
            }}
            "#,
            owner = self.login
        );

        #[derive(Deserialize)]
        struct LangResponse {
            data: Option<LangData>,
        }
        #[derive(Deserialize)]
        struct LangData {
            repository: Option<LangRepo>,
        }
        #[derive(Deserialize)]
        struct LangRepo {
            languages: Option<LangConnection>,
        }
        #[derive(Deserialize)]
        struct LangConnection {
            edges: Option<Vec<LangEdge>>,
        }
        #[derive(Deserialize)]
        struct LangEdge {
            size: u64,
            node: LangNode,
        }
        #[derive(Deserialize)]
        struct LangNode {
            name: String,
        }

        let json = self.graphql(&query).await?;
        let parsed: LangResponse = serde_json::from_value(json)
            .context("Failed to deserialize repo_languages response")?;

        let edges = parsed
            .data
            .and_then(|d| d.repository)
            .and_then(|r| r.languages)
            .and_then(|l| l.edges)
            .unwrap_or_default();

        Ok(edges.into_iter().map(|e| (e.node.name, e.size)).collect())
    }

    /// Commits authored by the user on the default branch since `since`.
    /// An empty repository counts as zero.
    pub async fn commits_since(&self, repo: &str, since: DateTime<Utc>) -> Result<u64> {
        let query = format!(
            r#"
            {{
                repository(owner: "{owner}", name: "{repo}") {{
                    defaultBranchRef {{
                        target {{
                            ... on Commit {{
                                history(since: "{since}", author: {{ id: "{id}" }}) {{
                                    totalCount
                                }}
                            }}
                        }}
                    }}
                }}
            }}
            "#,
            owner = self.login,
            since = since.to_rfc3339_opts(SecondsFormat::Secs, true),
            id = self.user_id
        );

        #[derive(Deserialize)]
        struct HistoryResponse {
            data: Option<HistoryData>,
        }
        #[derive(Deserialize)]
        struct HistoryData {
            repository: Option<HistoryRepo>,
        }
        #[derive(Deserialize)]
        struct HistoryRepo {
            #[serde(rename = "defaultBranchRef")]
            default_branch_ref: Option<BranchRef>,
        }
        #[derive(Deserialize)]
        struct BranchRef {
            target: Option<BranchTarget>,
        }
        #[derive(Deserialize)]
        struct BranchTarget {
            history: Option<HistoryCount>,
        }
        #[derive(Deserialize)]
        struct HistoryCount {
            #[serde(rename = "totalCount")]
            total_count: u64,
        }

        let json = self.graphql(&query).await?;
        let parsed: HistoryResponse = serde_json::from_value(json)
            .context("Failed to deserialize commits_since response")?;

        let count = parsed
            .data
            .and_then(|d| d.repository)
            .and_then(|r| r.default_branch_ref)
            .and_then(|b| b.target)
            .and_then(|t| t.history)
            .map(|h| h.total_count)
            .unwrap_or(0);

        Ok(count)
    }

    /// Weekly per-contributor line stats for one repository. Fails while
    /// GitHub is still computing them; callers treat that as a skip.
    pub async fn weekly_stats(&self, repo: &str) -> Result<Vec<ContributorStats>> {
        self.rest(&format!("/repos/{}/{repo}/stats/contributors", self.login))
            .await
    }

    /// Additions/deletions introduced by the commit that triggered a push
    /// run. A missing sha degrades to a zero diff with a warning.
    pub async fn push_diff(&self, repo_full_name: &str, sha: Option<&str>) -> Result<PushDiff> {
        let Some(sha) = sha else {
            eprintln!("GITHUB_SHA not set, cannot compute push diff.");
            return Ok(PushDiff::default());
        };

        #[derive(Deserialize)]
        struct CommitDetail {
            files: Option<Vec<CommitFile>>,
        }

        let detail: CommitDetail = self
            .rest(&format!("/repos/{repo_full_name}/commits/{sha}"))
            .await
            .with_context(|| format!("Failed to look up push commit {sha}"))?;

        let diff = sum_file_changes(&detail.files.unwrap_or_default());
        println!(
            "Push diff (commit {}): +{} / -{}",
            &sha[..sha.len().min(7)],
            diff.additions,
            diff.deletions
        );
        Ok(diff)
    }

    /// Print the remaining API quota. Best-effort, purely diagnostic.
    pub async fn print_rate_limit(&self) {
        #[derive(Deserialize)]
        struct RateResponse {
            data: Option<RateData>,
        }
        #[derive(Deserialize)]
        struct RateData {
            #[serde(rename = "rateLimit")]
            rate_limit: Option<RateLimit>,
        }
        #[derive(Deserialize)]
        struct RateLimit {
            remaining: u64,
            #[serde(rename = "resetAt")]
            reset_at: String,
        }

        let result = self
            .graphql("{ rateLimit { remaining resetAt } }")
            .await
            .and_then(|json| {
                serde_json::from_value::<RateResponse>(json)
                    .context("Failed to deserialize rate limit response")
            });

        match result {
            Ok(parsed) => {
                if let Some(rl) = parsed.data.and_then(|d| d.rate_limit) {
                    println!("Rate limit remaining: {} (resets at {})", rl.remaining, rl.reset_at);
                }
            }
            Err(e) => eprintln!("Warning: could not read rate limit: {e:#}"),
        }
    }
}

/// Sum additions and deletions across all files touched by one commit.
pub fn sum_file_changes(files: &[CommitFile]) -> PushDiff {
    let mut diff = PushDiff::default();
    for file in files {
        diff.additions = diff.additions.saturating_add(file.additions);
        diff.deletions = diff.deletions.saturating_add(file.deletions);
    }
    diff
}
