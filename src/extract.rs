use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::formats::{ListingPage, ListingRecord};
use crate::thread::{INDENTATION_UNIT, RawCommentNode};

struct Selectors {
    story_row: Selector,
    title_link: Selector,
    score: Selector,
    user: Selector,
    age: Selector,
    link: Selector,
    more_link: Selector,
    comment_row: Selector,
    toggle: Selector,
    indent_cell: Selector,
    indent_img: Selector,
    comment_text: Selector,
    reply: Selector,
}

impl Selectors {
    fn new() -> anyhow::Result<Self> {
        Ok(Self {
            story_row: selector("tr.athing:not(.comtr)")?,
            title_link: selector(".titleline > a, a.storylink")?,
            score: selector(".score")?,
            user: selector("a.hnuser")?,
            age: selector(".age")?,
            link: selector("a")?,
            more_link: selector("a.morelink")?,
            comment_row: selector("tr.athing.comtr")?,
            toggle: selector(".togg")?,
            indent_cell: selector("td.ind")?,
            indent_img: selector("td.ind img")?,
            comment_text: selector(".commtext")?,
            reply: selector(".reply")?,
        })
    }
}

fn selector(css: &str) -> anyhow::Result<Selector> {
    Selector::parse(css).map_err(|err| anyhow::anyhow!("parse selector {css:?}: {err:?}"))
}

/// Parses a listing page (front page, favorites, upvoted, ...).
///
/// Rows without a numeric id are skipped.
pub fn listing_page(html: &str, base: &Url, anchor: DateTime<Utc>) -> anyhow::Result<ListingPage> {
    let sel = Selectors::new()?;
    let document = Html::parse_document(html);

    let records = document
        .select(&sel.story_row)
        .filter_map(|row| story_record(&sel, row, base, anchor))
        .collect();

    let next = document
        .select(&sel.more_link)
        .last()
        .and_then(|link| link.value().attr("href"))
        .filter(|href| !href.trim().is_empty())
        .map(|href| resolve_url(base, href));

    Ok(ListingPage { records, next })
}

fn story_record(
    sel: &Selectors,
    row: ElementRef<'_>,
    base: &Url,
    anchor: DateTime<Utc>,
) -> Option<ListingRecord> {
    let id_attr = row.value().attr("id").unwrap_or_default();
    let Ok(id) = id_attr.trim().parse::<u64>() else {
        tracing::debug!(id = id_attr, "discarding story row without numeric id");
        return None;
    };

    let title_link = row.select(&sel.title_link).next();
    let title = title_link.map(extract_text).unwrap_or_default();
    let url = title_link
        .and_then(|link| link.value().attr("href"))
        .map(|href| resolve_url(base, href))
        .unwrap_or_default();

    // Score, submitter, age and comment link live in the following row.
    let subtext = row.next_siblings().find_map(ElementRef::wrap);

    let score = subtext
        .and_then(|sub| sub.select(&sel.score).next())
        .and_then(|score| leading_number(&extract_text(score)));
    let submitter = subtext
        .and_then(|sub| sub.select(&sel.user).next())
        .map(|user| {
            user.value()
                .attr("href")
                .map(|href| href.trim_start_matches("user?id=").to_owned())
                .unwrap_or_else(|| extract_text(user))
        })
        .unwrap_or_default();
    let age = subtext
        .and_then(|sub| sub.select(&sel.age).next())
        .map(extract_text)
        .unwrap_or_default();

    let comment_link = subtext.and_then(|sub| {
        sub.select(&sel.link)
            .filter(|link| {
                let text = extract_text(*link).to_ascii_lowercase();
                text.contains("comment") || text.contains("discuss")
            })
            .last()
    });
    let comments = comment_link.and_then(|link| {
        let text = extract_text(link);
        leading_number(&text).or_else(|| text.contains("discuss").then_some(0))
    });
    let comments_url = comment_link
        .and_then(|link| link.value().attr("href"))
        .map(|href| resolve_url(base, href))
        .unwrap_or_else(|| resolve_url(base, &format!("item?id={id}")));

    Some(ListingRecord {
        id,
        title,
        url,
        score,
        comments,
        comments_url,
        submitter,
        timestamp: crate::age::parse_age(&age, anchor),
    })
}

/// Scans the comment rows of an item page in page order. Field validation
/// happens later, in [`crate::thread`].
pub fn comment_rows(html: &str) -> anyhow::Result<Vec<RawCommentNode>> {
    let sel = Selectors::new()?;
    let document = Html::parse_document(html);

    let rows = document
        .select(&sel.comment_row)
        .map(|row| RawCommentNode {
            id: row.value().attr("id").map(str::to_owned),
            author: row
                .select(&sel.user)
                .next()
                .map(extract_text)
                .unwrap_or_default(),
            age: row
                .select(&sel.age)
                .next()
                .map(extract_text)
                .unwrap_or_default(),
            body: row
                .select(&sel.comment_text)
                .next()
                .map(|text| comment_body(&sel, text))
                .unwrap_or_default(),
            reply_count: row
                .select(&sel.toggle)
                .next()
                .and_then(|toggle| toggle.value().attr("n"))
                .map(str::to_owned),
            width: indentation_width(&sel, row),
        })
        .collect();

    Ok(rows)
}

fn indentation_width(sel: &Selectors, row: ElementRef<'_>) -> Option<String> {
    if let Some(width) = row
        .select(&sel.indent_img)
        .next()
        .and_then(|img| img.value().attr("width"))
    {
        return Some(width.to_owned());
    }

    // Newer markup carries the nesting level instead of a spacer image.
    let indent = row
        .select(&sel.indent_cell)
        .next()
        .and_then(|cell| cell.value().attr("indent"))?;
    match indent.trim().parse::<u32>() {
        Ok(level) => level
            .checked_mul(INDENTATION_UNIT)
            .map(|width| width.to_string()),
        Err(_) => Some(indent.to_owned()),
    }
}

fn comment_body(sel: &Selectors, text: ElementRef<'_>) -> String {
    let mut inner = text.inner_html();
    for reply in text.select(&sel.reply) {
        inner = inner.replacen(&reply.html(), "", 1);
    }
    html2md::parse_html(&inner).trim().to_owned()
}

fn extract_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn leading_number(text: &str) -> Option<u64> {
    let digits = text
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect::<String>();
    digits.parse().ok()
}

/// Makes a forum-relative link (`item?id=1`, `news?p=2`) absolute.
pub fn resolve_url(base: &Url, href: &str) -> String {
    let href = href.trim();
    if Url::parse(href).is_ok() {
        return href.to_owned();
    }
    match base.join(href) {
        Ok(url) => url.to_string(),
        Err(_) => href.to_owned(),
    }
}
