mod aggregate;
mod ascii;
mod config;
mod github;
mod readme;
mod spotify;
mod stats;
mod svg;

use anyhow::Result;
use chrono::{Datelike, Utc};
use std::path::Path;

use config::{Config, Trigger, ART_FILE, README_FILE, STATS_FILE};
use github::GithubClient;
use readme::ReadmeStats;
use spotify::SpotifyClient;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env()?;
    let year = Utc::now().year();
    let full_scan = cfg.trigger == Trigger::FullScan;

    let github = GithubClient::connect(&cfg).await?;

    let agg = aggregate::aggregate(&github, year, full_scan).await?;
    let public_repos = github.public_repo_count().await?;
    let most_recent = agg.most_recent_repo.as_deref().unwrap_or("N/A");

    println!("Public Repos: {public_repos}");
    println!("Most Recent Repo: {most_recent}");
    github.print_rate_limit().await;
    println!("Most Used Language: {}", agg.most_used_language);
    println!("Total Commits This Year: {}", agg.commits_this_year);

    let (total_additions, total_deletions) = match cfg.trigger {
        Trigger::Push => {
            let prior = stats::load(Path::new(STATS_FILE));
            let repo = cfg.push_repo.as_deref().unwrap_or_default();
            let diff = github.push_diff(repo, cfg.push_sha.as_deref()).await?;
            (
                prior.lines_added + diff.additions,
                prior.lines_removed + diff.deletions,
            )
        }
        Trigger::FullScan => (agg.total_additions, agg.total_deletions),
    };
    stats::save(Path::new(STATS_FILE), total_additions, total_deletions)?;
    match cfg.trigger {
        Trigger::Push => println!(
            "Incremental update: Lines Added: {total_additions} | Lines Removed: {total_deletions}"
        ),
        Trigger::FullScan => println!(
            "Full scan: Lines Added: {total_additions} | Lines Removed: {total_deletions}"
        ),
    }

    let spotify = SpotifyClient::connect(&cfg).await?;
    let mut track_name = String::from("Unknown");
    if let Some(track) = spotify.recently_played().await? {
        track_name = track.display_name;
        let bytes = spotify.download_image(&track.cover_url).await?;
        let art = ascii::image_to_ascii(&ascii::decode(&bytes)?);
        std::fs::write(ART_FILE, svg::render(&art))?;
    }

    let fragment = readme::render_fragment(&ReadmeStats {
        public_repos,
        most_recent_repo: most_recent,
        most_used_language: &agg.most_used_language,
        commits_this_year: agg.commits_this_year,
        lines_added: total_additions,
        lines_removed: total_deletions,
        track_name: &track_name,
    });
    readme::update(Path::new(README_FILE), &fragment)?;
    println!("README.md updated successfully!");

    Ok(())
}
