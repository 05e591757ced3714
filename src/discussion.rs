use anyhow::Context as _;
use serde::Serialize;

use crate::cli::DiscussionArgs;
use crate::client::ForumClient;
use crate::config::SlurpConfig;
use crate::thread::{CommentNode, INDENTATION_UNIT, Threads};

/// One comment of a flattened discussion, without its replies.
#[derive(Debug, Serialize)]
struct FlatComment<'a> {
    id: u64,
    author: &'a str,
    timestamp: chrono::DateTime<chrono::Utc>,
    content: &'a str,
    reply_count: u32,
    depth: u32,
}

impl<'a> From<&'a CommentNode> for FlatComment<'a> {
    fn from(node: &'a CommentNode) -> Self {
        Self {
            id: node.id,
            author: &node.author,
            timestamp: node.timestamp,
            content: &node.content,
            reply_count: node.reply_count,
            depth: node.depth,
        }
    }
}

/// Fetches the item page for `id` and rebuilds its comment threads.
pub async fn fetch(client: &ForumClient, id: u64) -> anyhow::Result<Threads> {
    let url = client.config().page_url(&format!("item?id={id}"))?;
    tracing::debug!(page = %url, "fetching discussion");
    let html = client.checked_get(&url).await?;

    let anchor = chrono::Utc::now();
    let rows = crate::extract::comment_rows(&html).context("extract comments")?;
    let threads = crate::thread::reconstruct(rows, INDENTATION_UNIT, anchor)
        .with_context(|| format!("rebuild discussion for item {id}"))?;

    tracing::info!(
        item = id,
        threads = threads.thread_count(),
        comments = threads.comment_count(),
        "discussion rebuilt"
    );
    Ok(threads)
}

pub async fn run(args: DiscussionArgs) -> anyhow::Result<()> {
    let config = SlurpConfig::from_session(&args.session, None)?;
    let client = ForumClient::connect(&config).await.context("connect")?;

    let threads = fetch(&client, args.id).await?;

    let rendered = if args.flat {
        let flat = threads
            .flatten()
            .into_iter()
            .map(FlatComment::from)
            .collect::<Vec<_>>();
        args.output.render(&flat)?
    } else {
        args.output.render(&threads)?
    };
    crate::store::write_output(args.out.as_deref(), &rendered)
}
