use anyhow::Context as _;

use crate::cli::StoriesArgs;
use crate::client::ForumClient;
use crate::config::SlurpConfig;
use crate::merge::StopReason;

pub async fn run(args: StoriesArgs) -> anyhow::Result<()> {
    let config = SlurpConfig::from_session(&args.session, args.max_stories)?;

    if args.section.needs_login() && config.password.is_none() {
        anyhow::bail!("section {:?} requires -p/--password", args.section);
    }

    let id = args.id.as_deref().or(Some(config.user.as_str()));
    let start_path = args.section.start_path(id)?;
    let start_url = config.page_url(&start_path)?;

    let saved_source = args.edit_in_place.as_deref().or(args.existing.as_deref());
    let saved = match saved_source {
        Some(source) => crate::store::load_stories(source).context("load saved stories")?,
        None => Vec::new(),
    };

    let saved_len = saved.len();
    let mut client = ForumClient::connect(&config).await.context("connect")?;

    tracing::info!(
        section = ?args.section,
        start = %start_url,
        saved = saved_len,
        "paging listing"
    );
    let outcome = crate::merge::catch_up(&mut client, &start_url, saved, config.max_records)
        .await
        .context("page listing")?;
    tracing::info!(
        stories = outcome.records.len(),
        pages = outcome.pages_fetched,
        stop = ?outcome.stop,
        "listing merged"
    );

    if let Some(path) = args.edit_in_place.as_deref() {
        if saved_len > 0 && outcome.stop != StopReason::CaughtUp {
            anyhow::bail!(
                "refusing to overwrite {path}: stopped ({:?}) before reaching the newest saved \
                 story, so the saved stories would be dropped; use --existing with --out instead",
                outcome.stop
            );
        }
    }

    let rendered = args.output.render(&outcome.records)?;
    let target = args.edit_in_place.as_deref().or(args.out.as_deref());
    crate::store::write_output(target, &rendered)
}
