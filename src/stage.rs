use std::path::{Path, PathBuf};

use anyhow::Context as _;
use tokio::fs;

use crate::cli::StageArgs;

const REQUIRED_FILES: [&str; 2] = ["burger-of-the-day.json", "tvmaze-episodes.json"];
const OPTIONAL_FILES: [&str; 1] = ["burger-of-the-day-context.json"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedFiles {
    pub copied: Vec<String>,
    pub skipped: Vec<String>,
}

pub async fn run(args: StageArgs) -> anyhow::Result<()> {
    let staged = stage_data(&PathBuf::from(&args.from), &PathBuf::from(&args.to)).await?;
    tracing::info!(
        copied = staged.copied.len(),
        skipped = ?staged.skipped,
        to = %args.to,
        "staged data files"
    );
    Ok(())
}

/// Copies the data documents from `source_dir` into `<public_dir>/data`.
///
/// The burger log and the episode list must exist. The context document is
/// skipped when it is missing; any other failure on it is still an error.
pub async fn stage_data(source_dir: &Path, public_dir: &Path) -> anyhow::Result<StagedFiles> {
    let target_dir = public_dir.join("data");
    fs::create_dir_all(&target_dir)
        .await
        .with_context(|| format!("create data dir: {}", target_dir.display()))?;

    let required = REQUIRED_FILES
        .iter()
        .map(|name| copy_required(source_dir, &target_dir, name));
    futures::future::try_join_all(required).await?;

    let mut staged = StagedFiles {
        copied: REQUIRED_FILES.iter().map(|name| (*name).to_owned()).collect(),
        skipped: Vec::new(),
    };

    for name in OPTIONAL_FILES {
        let from = source_dir.join(name);
        match fs::copy(&from, target_dir.join(name)).await {
            Ok(_) => staged.copied.push(name.to_owned()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(file = %from.display(), "optional data file not found; skipping");
                staged.skipped.push(name.to_owned());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("copy {}", from.display()));
            }
        }
    }

    Ok(staged)
}

async fn copy_required(source_dir: &Path, target_dir: &Path, name: &str) -> anyhow::Result<()> {
    let from = source_dir.join(name);
    fs::copy(&from, target_dir.join(name))
        .await
        .with_context(|| format!("copy {}", from.display()))?;
    Ok(())
}
