use anyhow::{Context, Result};
use std::path::Path;

use crate::config::ART_FILE;

pub const MARKER_START: &str = "<!-- START_STATS -->";
pub const MARKER_END: &str = "<!-- END_STATS -->";

/// Everything the markdown fragment displays.
pub struct ReadmeStats<'a> {
    pub public_repos: u32,
    pub most_recent_repo: &'a str,
    pub most_used_language: &'a str,
    pub commits_this_year: u64,
    pub lines_added: u64,
    pub lines_removed: u64,
    pub track_name: &'a str,
}

/// Render the stats block that lives between the sentinel markers.
pub fn render_fragment(stats: &ReadmeStats) -> String {
    format!(
        "\n\
         ## My GitHub Stats\n\
         \n\
         - **Public Repos:** {repos}\n\
         - **Most Recent Repo:** {recent}\n\
         - **Most Used Language:** {lang}\n\
         - **Commits This Year:** {commits}\n\
         - **Lines Added:** ![Added](https://img.shields.io/badge/-{added}-brightgreen?style=flat-square) | **Lines Removed:** ![Removed](https://img.shields.io/badge/-{removed}-red?style=flat-square)\n\
         \n\
         ## Recently Played on Spotify\n\
         **{track}**\n\
         \n\
         ![Now playing]({art})\n",
        repos = stats.public_repos,
        recent = stats.most_recent_repo,
        lang = stats.most_used_language,
        commits = stats.commits_this_year,
        added = stats.lines_added,
        removed = stats.lines_removed,
        track = stats.track_name,
        art = ART_FILE,
    )
}

/// Replace the sentinel-delimited region with `fragment`, or append a new
/// sentinel block when the markers are absent.
pub fn splice(document: &str, fragment: &str) -> String {
    let markers = document
        .find(MARKER_START)
        .zip(document.find(MARKER_END))
        .filter(|(start, end)| end >= start);

    match markers {
        Some((start, end)) => {
            let tail = end + MARKER_END.len();
            format!(
                "{}{MARKER_START}\n{fragment}\n{MARKER_END}{}",
                &document[..start],
                &document[tail..]
            )
        }
        None => format!("{document}\n{MARKER_START}\n{fragment}\n{MARKER_END}\n"),
    }
}

/// Rewrite the target document in full with the fragment spliced in.
pub fn update(path: &Path, fragment: &str) -> Result<()> {
    let document = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    std::fs::write(path, splice(&document, fragment))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn block(doc: &str) -> &str {
        let start = doc.find(MARKER_START).unwrap();
        let end = doc.find(MARKER_END).unwrap() + MARKER_END.len();
        &doc[start..end]
    }

    #[test]
    fn existing_block_is_replaced_in_place() {
        let doc = format!("# Hi\n\n{MARKER_START}\nold stats\n{MARKER_END}\n\n## Footer\n");
        let updated = splice(&doc, "new stats");

        assert!(updated.starts_with("# Hi\n\n"));
        assert!(updated.ends_with("\n\n## Footer\n"));
        assert!(updated.contains("new stats"));
        assert!(!updated.contains("old stats"));
        assert_eq!(updated.matches(MARKER_START).count(), 1);
    }

    #[test]
    fn missing_markers_append_exactly_one_block() {
        let updated = splice("# Hi\n", "stats");
        assert_eq!(updated.matches(MARKER_START).count(), 1);
        assert_eq!(updated.matches(MARKER_END).count(), 1);
        assert!(updated.starts_with("# Hi\n"));
    }

    #[test]
    fn splicing_twice_with_the_same_fragment_is_idempotent() {
        let once = splice("# Hi\n", "stats");
        let twice = splice(&once, "stats");
        assert_eq!(once, twice);
    }

    #[test]
    fn appended_then_replaced_never_duplicates() {
        let appended = splice("# Hi\n", "first");
        let replaced = splice(&appended, "second");
        assert_eq!(replaced.matches(MARKER_START).count(), 1);
        assert_eq!(block(&replaced), format!("{MARKER_START}\nsecond\n{MARKER_END}"));
    }

    #[test]
    fn fragment_carries_every_metric() {
        let fragment = render_fragment(&ReadmeStats {
            public_repos: 12,
            most_recent_repo: "readme-stats",
            most_used_language: "Rust",
            commits_this_year: 340,
            lines_added: 9001,
            lines_removed: 420,
            track_name: "Karma Police by Radiohead",
        });

        assert!(fragment.contains("**Public Repos:** 12"));
        assert!(fragment.contains("**Most Recent Repo:** readme-stats"));
        assert!(fragment.contains("**Most Used Language:** Rust"));
        assert!(fragment.contains("**Commits This Year:** 340"));
        assert!(fragment.contains("badge/-9001-brightgreen"));
        assert!(fragment.contains("badge/-420-red"));
        assert!(fragment.contains("**Karma Police by Radiohead**"));
        assert!(fragment.contains(ART_FILE));
    }

    #[test]
    fn update_rewrites_the_file_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("README.md");
        std::fs::write(&path, "# Profile\n").unwrap();

        update(&path, "stats").unwrap();
        update(&path, "stats").unwrap();

        let doc = std::fs::read_to_string(&path).unwrap();
        assert_eq!(doc.matches(MARKER_START).count(), 1);
        assert!(doc.contains("stats"));
    }
}
