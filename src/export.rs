//! RSS 2.0 export of a stored collection.
//!
//! A read-only consumer of the persisted documents: it must tolerate both
//! shapes but never rewrite them. Timestamps become RFC 822 for `pubDate`
//! and `lastBuildDate`; every text field is XML-escaped.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::escape::escape;
use tracing::info;

use crate::pipeline::PLACEHOLDER_SNIPPET;
use crate::store;
use crate::timeutil;

pub struct FeedMeta<'a> {
    pub title: &'a str,
    pub description: &'a str,
    /// Channel link and base for the self-referencing atom link.
    pub site_url: &'a str,
}

/// Render the collection at `collection_path` into RSS 2.0 XML at
/// `xml_path`. Returns the number of items written. A missing collection is
/// not an error; nothing is written.
pub fn write_rss(collection_path: &Path, xml_path: &Path, meta: &FeedMeta) -> Result<Option<usize>> {
    if !collection_path.exists() {
        return Ok(None);
    }
    let collection = store::load_collection(collection_path);

    let last_build = collection
        .last_run
        .as_deref()
        .map(timeutil::to_rfc822)
        .unwrap_or_else(|| timeutil::to_rfc822(&timeutil::now_utc_string()));

    let self_name = xml_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("feed.xml");

    let mut out = String::new();
    let _ = writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    let _ = writeln!(
        out,
        r#"<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">"#
    );
    let _ = writeln!(out, "  <channel>");
    let _ = writeln!(out, "    <title>{}</title>", escape(meta.title));
    let _ = writeln!(out, "    <link>{}</link>", escape(meta.site_url));
    let _ = writeln!(
        out,
        "    <description>{}</description>",
        escape(meta.description)
    );
    let _ = writeln!(out, "    <language>en</language>");
    let _ = writeln!(out, "    <lastBuildDate>{last_build}</lastBuildDate>");
    let _ = writeln!(
        out,
        r#"    <atom:link href="{}{}" rel="self" type="application/rss+xml"/>"#,
        escape(meta.site_url),
        escape(self_name)
    );

    for story in &collection.stories {
        let description = if story.first_sentence.is_empty() {
            PLACEHOLDER_SNIPPET
        } else {
            story.first_sentence.as_str()
        };
        let _ = writeln!(out, "    <item>");
        let _ = writeln!(out, "      <title>{}</title>", escape(&story.headline));
        let _ = writeln!(out, "      <link>{}</link>", escape(&story.link));
        let _ = writeln!(
            out,
            "      <description>{}</description>",
            escape(description)
        );
        let _ = writeln!(out, "      <source>{}</source>", escape(&story.source));
        let _ = writeln!(
            out,
            "      <pubDate>{}</pubDate>",
            timeutil::to_rfc822(&story.timestamp)
        );
        let _ = writeln!(
            out,
            r#"      <guid isPermaLink="true">{}</guid>"#,
            escape(&story.link)
        );
        let _ = writeln!(out, "    </item>");
    }

    let _ = writeln!(out, "  </channel>");
    let _ = writeln!(out, "</rss>");

    fs::write(xml_path, &out).with_context(|| format!("writing rss to {}", xml_path.display()))?;
    info!(items = collection.stories.len(), path = %xml_path.display(), "generated rss feed");
    Ok(Some(collection.stories.len()))
}
