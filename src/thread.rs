//! Rebuilds nested discussions from the flat comment rows of an item page.
//!
//! The page lists comments in depth-first pre-order and encodes nesting only
//! as an indentation width in pixels. Parents are recovered by remembering,
//! for every width on the current rightmost path, the last comment seen at
//! that width.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pixels of indentation per nesting level.
pub const INDENTATION_UNIT: u32 = 40;

/// One comment row as scraped, before any validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCommentNode {
    pub id: Option<String>,
    pub author: String,
    pub age: String,
    pub body: String,
    pub reply_count: Option<String>,
    pub width: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentNode {
    pub id: u64,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub content: String,
    /// Reply count as reported by the page, not derived from `children`.
    pub reply_count: u32,
    pub width: u32,
    pub depth: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CommentNode>,
}

impl CommentNode {
    pub fn from_raw(
        raw: RawCommentNode,
        unit: u32,
        anchor: DateTime<Utc>,
    ) -> Result<Self, MalformedNode> {
        let id = parse_field("id", raw.id.as_deref())?;
        let reply_count = parse_field("reply count", raw.reply_count.as_deref())?;
        let width: u32 = parse_field("width", raw.width.as_deref())?;

        Ok(Self {
            id,
            author: raw.author,
            timestamp: crate::age::parse_age(&raw.age, anchor),
            content: raw.body,
            reply_count,
            width,
            depth: width / unit.max(1),
            children: Vec::new(),
        })
    }

    /// Number of comments in this subtree, this one included.
    pub fn conversation_len(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(CommentNode::conversation_len)
            .sum::<usize>()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedNode {
    #[error("missing {field}")]
    Missing { field: &'static str },
    #[error("invalid {field}: {value:?}")]
    Invalid { field: &'static str, value: String },
}

fn parse_field<T: FromStr>(field: &'static str, value: Option<&str>) -> Result<T, MalformedNode> {
    let value = value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(MalformedNode::Missing { field })?;
    value.parse().map_err(|_| MalformedNode::Invalid {
        field,
        value: value.to_owned(),
    })
}

/// The page nests a comment under a parent that never appeared.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThreadError {
    #[error("no parent found for comment {id} (width {width}, parent width {parent_width})")]
    MissingParent {
        id: u64,
        width: u32,
        parent_width: u32,
    },
    #[error("comment {id} has width {width}, less than one indentation unit ({unit}) but not 0")]
    ParentWidthUnderflow { id: u64, width: u32, unit: u32 },
}

/// A discussion: the ordered root comments, each owning its replies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Threads(pub Vec<CommentNode>);

impl Threads {
    pub fn roots(&self) -> &[CommentNode] {
        &self.0
    }

    pub fn thread_count(&self) -> usize {
        self.0.len()
    }

    /// Total comments across every thread.
    pub fn comment_count(&self) -> usize {
        self.0.iter().map(CommentNode::conversation_len).sum()
    }

    /// Comments in page order (depth-first pre-order).
    pub fn flatten(&self) -> Vec<&CommentNode> {
        let mut out = Vec::with_capacity(self.comment_count());
        let mut stack = self.0.iter().rev().collect::<Vec<_>>();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }
}

#[derive(Debug)]
struct Slot {
    node: CommentNode,
    children: Vec<usize>,
}

/// Single-pass forest builder. Feed rows in page order with [`push`], then
/// call [`finish`].
///
/// [`push`]: ThreadBuilder::push
/// [`finish`]: ThreadBuilder::finish
#[derive(Debug)]
pub struct ThreadBuilder {
    unit: u32,
    anchor: DateTime<Utc>,
    arena: Vec<Slot>,
    roots: Vec<usize>,
    open: BTreeMap<u32, usize>,
    discarded: usize,
}

impl ThreadBuilder {
    pub fn new(unit: u32, anchor: DateTime<Utc>) -> Self {
        Self {
            unit: unit.max(1),
            anchor,
            arena: Vec::new(),
            roots: Vec::new(),
            open: BTreeMap::new(),
            discarded: 0,
        }
    }

    pub fn push(&mut self, raw: RawCommentNode) -> Result<(), ThreadError> {
        let raw_id = raw.id.clone();
        let node = match CommentNode::from_raw(raw, self.unit, self.anchor) {
            Ok(node) => node,
            Err(err) => {
                tracing::debug!(id = ?raw_id, %err, "discarding malformed comment");
                self.discarded += 1;
                return Ok(());
            }
        };

        let width = node.width;
        let idx = self.arena.len();

        if width == 0 {
            self.open.clear();
            self.roots.push(idx);
        } else {
            let parent_width = width.checked_sub(self.unit).ok_or(
                ThreadError::ParentWidthUnderflow {
                    id: node.id,
                    width,
                    unit: self.unit,
                },
            )?;
            let parent = *self
                .open
                .get(&parent_width)
                .ok_or(ThreadError::MissingParent {
                    id: node.id,
                    width,
                    parent_width,
                })?;
            self.arena[parent].children.push(idx);
            // Anything at this width or deeper is closed by this comment.
            self.open.retain(|&open_width, _| open_width < width);
        }

        self.open.insert(width, idx);
        self.arena.push(Slot {
            node,
            children: Vec::new(),
        });
        Ok(())
    }

    /// Comments dropped so far because a required field did not parse.
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    pub fn finish(self) -> Threads {
        // Children always sit after their parent in the arena, so building
        // back to front sees every child before its parent.
        let mut built: Vec<Option<CommentNode>> = Vec::with_capacity(self.arena.len());
        built.resize_with(self.arena.len(), || None);

        for (idx, slot) in self.arena.into_iter().enumerate().rev() {
            let mut node = slot.node;
            node.children = slot
                .children
                .iter()
                .filter_map(|&child| built[child].take())
                .collect();
            built[idx] = Some(node);
        }

        Threads(
            self.roots
                .iter()
                .filter_map(|&root| built[root].take())
                .collect(),
        )
    }
}

/// Builds the discussion for one page of comment rows.
pub fn reconstruct(
    rows: impl IntoIterator<Item = RawCommentNode>,
    unit: u32,
    anchor: DateTime<Utc>,
) -> Result<Threads, ThreadError> {
    let mut builder = ThreadBuilder::new(unit, anchor);
    for row in rows {
        builder.push(row)?;
    }
    if builder.discarded() > 0 {
        tracing::debug!(discarded = builder.discarded(), "skipped malformed comments");
    }
    Ok(builder.finish())
}
