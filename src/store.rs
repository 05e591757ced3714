use std::io::{Read as _, Write as _};
use std::path::Path;

use anyhow::Context as _;

use crate::formats::ListingRecord;

/// "-" stands for stdin (when reading) or stdout (when writing).
pub const STDIO: &str = "-";

/// Loads a saved JSON array of stories from `source`.
pub fn load_stories(source: &str) -> anyhow::Result<Vec<ListingRecord>> {
    let contents = if source == STDIO {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read stories from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source).with_context(|| format!("open {source}"))?
    };

    let stories = parse_stories(&contents)
        .with_context(|| format!("loading stories from {source}"))?;
    tracing::debug!(count = stories.len(), source, "loaded saved stories");
    Ok(stories)
}

pub fn parse_stories(contents: &str) -> anyhow::Result<Vec<ListingRecord>> {
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }
    let stories: Option<Vec<ListingRecord>> =
        serde_json::from_str(contents).context("parse stories json")?;
    Ok(stories.unwrap_or_default())
}

/// Writes `contents` to stdout (`None` or "-") or to a file.
pub fn write_output(target: Option<&str>, contents: &str) -> anyhow::Result<()> {
    match target {
        None | Some(STDIO) => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(contents.as_bytes())
                .context("write output to stdout")?;
            stdout.flush().context("flush stdout")?;
        }
        Some(path) => write_atomic(Path::new(path), contents.as_bytes())
            .with_context(|| format!("write output: {path}"))?,
    }
    Ok(())
}

/// Replaces `path` through a temporary sibling so that a failed run never
/// leaves a half-written database behind.
pub fn write_atomic(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)
        .with_context(|| format!("create parent dir: {}", parent.display()))?;

    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("path has no file name: {}", path.display()))?
        .to_string_lossy();
    let tmp_path = parent.join(format!(
        ".{file_name}.tmp.{}",
        uuid::Uuid::new_v4().simple()
    ));

    std::fs::write(&tmp_path, data)
        .with_context(|| format!("write tmp: {}", tmp_path.display()))?;
    if let Err(err) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(err).with_context(|| format!("rename tmp to final: {}", path.display()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_or_null_database_is_an_empty_listing() -> anyhow::Result<()> {
        assert!(parse_stories("")?.is_empty());
        assert!(parse_stories("  \n")?.is_empty());
        assert!(parse_stories("null")?.is_empty());
        assert!(parse_stories("[]")?.is_empty());
        Ok(())
    }

    #[test]
    fn invalid_database_is_an_error() {
        assert!(parse_stories("{\"id\": 1}").is_err());
    }

    #[test]
    fn atomic_write_replaces_file_and_leaves_no_tmp() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let path = temp.path().join("stories.json");
        std::fs::write(&path, "old")?;

        write_atomic(&path, b"new")?;

        assert_eq!(std::fs::read_to_string(&path)?, "new");
        let entries = std::fs::read_dir(temp.path())?.count();
        assert_eq!(entries, 1);
        Ok(())
    }

    #[test]
    fn missing_file_names_the_source() {
        let err = load_stories("/definitely/not/here.json").unwrap_err();
        assert!(format!("{err:#}").contains("/definitely/not/here.json"));
    }
}
