use anyhow::Result;
use chrono::{DateTime, Datelike, TimeZone, Utc};

use crate::github::{ContributorStats, GithubClient, RepoInfo};

/// What the aggregator needs from the hosting API, abstracted so tests can
/// drive it with a synthetic source.
pub trait RepoSource {
    fn login(&self) -> &str;
    async fn owned_repos(&self) -> Result<Vec<RepoInfo>>;
    async fn repo_languages(&self, repo: &str) -> Result<Vec<(String, u64)>>;
    async fn commits_since(&self, repo: &str, since: DateTime<Utc>) -> Result<u64>;
    async fn weekly_stats(&self, repo: &str) -> Result<Vec<ContributorStats>>;
}

impl RepoSource for GithubClient {
    fn login(&self) -> &str {
        GithubClient::login(self)
    }
    async fn owned_repos(&self) -> Result<Vec<RepoInfo>> {
        GithubClient::owned_repos(self).await
    }
    async fn repo_languages(&self, repo: &str) -> Result<Vec<(String, u64)>> {
        GithubClient::repo_languages(self, repo).await
    }
    async fn commits_since(&self, repo: &str, since: DateTime<Utc>) -> Result<u64> {
        GithubClient::commits_since(self, repo, since).await
    }
    async fn weekly_stats(&self, repo: &str) -> Result<Vec<ContributorStats>> {
        GithubClient::weekly_stats(self, repo).await
    }
}

/// Which per-repository lookup was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Commits,
    WeeklyStats,
}

/// A repository left out of one metric, and why.
#[derive(Debug)]
pub struct Skip {
    pub repo: String,
    pub metric: Metric,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct Aggregate {
    pub most_used_language: String,
    pub most_recent_repo: Option<String>,
    pub commits_this_year: u64,
    pub total_additions: u64,
    pub total_deletions: u64,
    pub skipped: Vec<Skip>,
}

/// Fold every non-fork repository into the run's metrics.
///
/// Commit counting and (in full-scan mode) weekly line stats are
/// best-effort per repository; a failed lookup is recorded as a skip and
/// the loop continues. Language enumeration failures are fatal.
pub async fn aggregate<S: RepoSource>(source: &S, year: i32, full_scan: bool) -> Result<Aggregate> {
    let repos = source.owned_repos().await?;
    let since = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap();

    let mut agg = Aggregate {
        most_recent_repo: most_recent(&repos),
        ..Aggregate::default()
    };
    let mut tally: Vec<(String, u64)> = Vec::new();

    for repo in &repos {
        if repo.is_fork {
            continue;
        }

        for (lang, bytes) in source.repo_languages(&repo.name).await? {
            add_language(&mut tally, &lang, bytes);
        }

        match source.commits_since(&repo.name, since).await {
            Ok(count) => agg.commits_this_year += count,
            Err(e) => {
                eprintln!("Warning: skipping commit count for {}: {e:#}", repo.name);
                agg.skipped.push(Skip {
                    repo: repo.name.clone(),
                    metric: Metric::Commits,
                    reason: format!("{e:#}"),
                });
            }
        }

        if full_scan {
            match source.weekly_stats(&repo.name).await {
                Ok(stats) => {
                    let (a, d) = year_line_totals(&stats, source.login(), year);
                    agg.total_additions += a;
                    agg.total_deletions += d;
                }
                Err(e) => {
                    eprintln!("Warning: skipping weekly stats for {}: {e:#}", repo.name);
                    agg.skipped.push(Skip {
                        repo: repo.name.clone(),
                        metric: Metric::WeeklyStats,
                        reason: format!("{e:#}"),
                    });
                }
            }
        }
    }

    agg.most_used_language = most_used_language(&tally);
    Ok(agg)
}

fn add_language(tally: &mut Vec<(String, u64)>, lang: &str, bytes: u64) {
    if let Some(entry) = tally.iter_mut().find(|(name, _)| name == lang) {
        entry.1 += bytes;
    } else {
        tally.push((lang.to_string(), bytes));
    }
}

/// Arg-max by byte count; first-seen wins on ties, "N/A" when empty.
fn most_used_language(tally: &[(String, u64)]) -> String {
    let mut best: Option<&(String, u64)> = None;
    for entry in tally {
        if best.is_none_or(|b| entry.1 > b.1) {
            best = Some(entry);
        }
    }
    best.map(|(name, _)| name.clone()).unwrap_or_else(|| "N/A".to_string())
}

/// Most recently updated repository, forks included.
fn most_recent(repos: &[RepoInfo]) -> Option<String> {
    let mut best: Option<&RepoInfo> = None;
    for repo in repos {
        if best.is_none_or(|b| repo.updated_at > b.updated_at) {
            best = Some(repo);
        }
    }
    best.map(|r| r.name.clone())
}

/// Sum the user's weekly additions/deletions falling inside `year`.
fn year_line_totals(stats: &[ContributorStats], login: &str, year: i32) -> (u64, u64) {
    let mut additions = 0u64;
    let mut deletions = 0u64;
    for contributor in stats {
        let is_user = contributor
            .author
            .as_ref()
            .is_some_and(|a| a.login == login);
        if !is_user {
            continue;
        }
        for week in &contributor.weeks {
            let in_year = DateTime::from_timestamp(week.w, 0)
                .is_some_and(|d| d.year() == year);
            if in_year {
                additions += week.a;
                deletions += week.d;
            }
        }
    }
    (additions, deletions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::{StatsAuthor, WeekStat};
    use anyhow::anyhow;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    struct FakeSource {
        repos: Vec<RepoInfo>,
        languages: HashMap<String, Vec<(String, u64)>>,
        commits: HashMap<String, Result<u64, String>>,
        weekly: HashMap<String, Vec<ContributorStats>>,
    }

    impl RepoSource for FakeSource {
        fn login(&self) -> &str {
            "me"
        }
        async fn owned_repos(&self) -> Result<Vec<RepoInfo>> {
            Ok(self.repos.clone())
        }
        async fn repo_languages(&self, repo: &str) -> Result<Vec<(String, u64)>> {
            Ok(self.languages.get(repo).cloned().unwrap_or_default())
        }
        async fn commits_since(&self, repo: &str, _since: DateTime<Utc>) -> Result<u64> {
            match self.commits.get(repo) {
                Some(Ok(n)) => Ok(*n),
                Some(Err(msg)) => Err(anyhow!("{msg}")),
                None => Ok(0),
            }
        }
        async fn weekly_stats(&self, repo: &str) -> Result<Vec<ContributorStats>> {
            match self.weekly.get(repo) {
                Some(stats) => Ok(stats
                    .iter()
                    .map(|c| ContributorStats {
                        author: c.author.as_ref().map(|a| StatsAuthor {
                            login: a.login.clone(),
                        }),
                        weeks: c
                            .weeks
                            .iter()
                            .map(|w| WeekStat { w: w.w, a: w.a, d: w.d })
                            .collect(),
                    })
                    .collect()),
                None => Err(anyhow!("no stats")),
            }
        }
    }

    fn repo(name: &str, is_fork: bool, updated: &str) -> RepoInfo {
        RepoInfo {
            name: name.to_string(),
            is_fork,
            updated_at: updated.parse().unwrap(),
        }
    }

    fn week(ts: i64, a: u64, d: u64) -> WeekStat {
        WeekStat { w: ts, a, d }
    }

    fn contributor(login: &str, weeks: Vec<WeekStat>) -> ContributorStats {
        ContributorStats {
            author: Some(StatsAuthor { login: login.to_string() }),
            weeks,
        }
    }

    #[test]
    fn most_used_language_is_arg_max_by_bytes() {
        let tally = vec![
            ("Rust".to_string(), 500u64),
            ("Python".to_string(), 1200),
            ("C".to_string(), 900),
        ];
        assert_eq!(most_used_language(&tally), "Python");
    }

    #[test]
    fn language_ties_break_first_seen() {
        let tally = vec![("Rust".to_string(), 700u64), ("Go".to_string(), 700)];
        assert_eq!(most_used_language(&tally), "Rust");
    }

    #[test]
    fn empty_tally_yields_sentinel() {
        assert_eq!(most_used_language(&[]), "N/A");
    }

    #[test]
    fn language_bytes_accumulate_across_repos() {
        let mut tally = Vec::new();
        add_language(&mut tally, "Rust", 100);
        add_language(&mut tally, "Python", 50);
        add_language(&mut tally, "Rust", 200);
        assert_eq!(tally, vec![("Rust".to_string(), 300), ("Python".to_string(), 50)]);
    }

    #[test]
    fn weeks_outside_the_year_do_not_count() {
        // 2023-12-31 and 2024-01-07
        let stats = vec![contributor(
            "me",
            vec![week(1703980800, 100, 50), week(1704585600, 7, 3)],
        )];
        assert_eq!(year_line_totals(&stats, "me", 2024), (7, 3));
    }

    #[test]
    fn other_contributors_weeks_do_not_count() {
        let stats = vec![
            contributor("someone-else", vec![week(1704585600, 99, 99)]),
            contributor("me", vec![week(1704585600, 5, 2)]),
        ];
        assert_eq!(year_line_totals(&stats, "me", 2024), (5, 2));
    }

    #[tokio::test]
    async fn forks_contribute_to_no_aggregate() {
        let source = FakeSource {
            repos: vec![
                repo("mine", false, "2024-06-01T00:00:00Z"),
                repo("forked", true, "2024-07-01T00:00:00Z"),
            ],
            languages: HashMap::from([
                ("mine".to_string(), vec![("Rust".to_string(), 10)]),
                ("forked".to_string(), vec![("Java".to_string(), 99999)]),
            ]),
            commits: HashMap::from([
                ("mine".to_string(), Ok(4)),
                ("forked".to_string(), Ok(777)),
            ]),
            weekly: HashMap::from([
                ("mine".to_string(), vec![contributor("me", vec![week(1704585600, 6, 1)])]),
                ("forked".to_string(), vec![contributor("me", vec![week(1704585600, 500, 500)])]),
            ]),
        };

        let agg = aggregate(&source, 2024, true).await.unwrap();
        assert_eq!(agg.most_used_language, "Rust");
        assert_eq!(agg.commits_this_year, 4);
        assert_eq!((agg.total_additions, agg.total_deletions), (6, 1));
        // forks still count for recency
        assert_eq!(agg.most_recent_repo.as_deref(), Some("forked"));
    }

    #[tokio::test]
    async fn one_failing_repo_does_not_abort_the_rest() {
        let source = FakeSource {
            repos: vec![
                repo("good", false, "2024-01-01T00:00:00Z"),
                repo("bad", false, "2024-02-01T00:00:00Z"),
                repo("also-good", false, "2024-03-01T00:00:00Z"),
            ],
            languages: HashMap::new(),
            commits: HashMap::from([
                ("good".to_string(), Ok(3)),
                ("bad".to_string(), Err("rate limited".to_string())),
                ("also-good".to_string(), Ok(2)),
            ]),
            weekly: HashMap::new(),
        };

        let agg = aggregate(&source, 2024, false).await.unwrap();
        assert_eq!(agg.commits_this_year, 5);
        assert_eq!(agg.skipped.len(), 1);
        assert_eq!(agg.skipped[0].repo, "bad");
        assert_eq!(agg.skipped[0].metric, Metric::Commits);
        assert!(agg.skipped[0].reason.contains("rate limited"));
    }

    #[tokio::test]
    async fn weekly_stats_failure_is_a_skip_not_an_abort() {
        let source = FakeSource {
            repos: vec![
                repo("has-stats", false, "2024-01-01T00:00:00Z"),
                repo("no-stats", false, "2024-02-01T00:00:00Z"),
            ],
            languages: HashMap::new(),
            commits: HashMap::new(),
            weekly: HashMap::from([(
                "has-stats".to_string(),
                vec![contributor("me", vec![week(1704585600, 11, 4)])],
            )]),
        };

        let agg = aggregate(&source, 2024, true).await.unwrap();
        assert_eq!((agg.total_additions, agg.total_deletions), (11, 4));
        let skips: Vec<_> = agg
            .skipped
            .iter()
            .filter(|s| s.metric == Metric::WeeklyStats)
            .collect();
        assert_eq!(skips.len(), 1);
        assert_eq!(skips[0].repo, "no-stats");
    }

    #[tokio::test]
    async fn incremental_mode_never_touches_weekly_stats() {
        let source = FakeSource {
            repos: vec![repo("mine", false, "2024-01-01T00:00:00Z")],
            languages: HashMap::new(),
            commits: HashMap::new(),
            // weekly_stats would fail for every repo
            weekly: HashMap::new(),
        };

        let agg = aggregate(&source, 2024, false).await.unwrap();
        assert_eq!((agg.total_additions, agg.total_deletions), (0, 0));
        assert!(agg.skipped.is_empty());
    }
}
