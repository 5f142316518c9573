//! Body rewriting for the destination copy.
//!
//! Converts vault-flavored Markdown into what the site renderer understands.
//! This is pattern matching over specific constructs, not a Markdown parser:
//! anything a rule does not recognize passes through untouched, and no rule
//! can fail.
//!
//! ## Rule Order
//!
//! ```text
//! protect code      fenced blocks and inline spans → placeholders
//! links             YouTube embeds, /index.md and X/X.md targets
//! html links        inventory only (logged, counted)
//! hashtags          " #tag" → " [#tag](/tags/tag/)"
//! image captions    ![a](u "t") "caption" → ![a](u "caption"), .heic → .jpeg
//! highlights        ==text== → <mark>text</mark>
//! heading guard     " # " → " \# "
//! restore code      placeholders → original code, byte for byte
//! ```
//!
//! The order matters: later rules see the output of earlier ones (the hashtag
//! rule must not see code, the caption rule must not see YouTube images that
//! were already turned into embeds).

use crate::naming::converted_image_name;
use crate::stats::Stats;
use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::debug;

/// `[text](url)` and `![text](url "title")`.
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?P<bang>!?)\[(?P<text>[^\]\n]*)\]\((?P<url>[^()\s]*)(?P<title>\s+"[^"\n]*")?\)"#)
        .unwrap()
});

static YOUTUBE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:https?://(?:www\.|m\.)?youtube\.com/watch\?v=|https?://youtu\.be/)(?P<id>[\w-]+)")
        .unwrap()
});

/// Image with optional title and an optional quoted caption after it.
static IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"!\[(?P<alt>[^\]\n]*)\]\((?P<url>[^()\s]+)(?:\s+"(?P<title>[^"\n]*)")?\)(?:[ \t]+"(?P<caption>[^"\n]*)")?"#,
    )
    .unwrap()
});

static HASHTAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<lead>[ \t])#(?P<tag>[\p{L}\p{N}][\p{L}\p{N}-]*)").unwrap()
});

static HIGHLIGHT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"==(?P<text>\w.*?)==").unwrap());

static HTML_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<a\s+[^>]*?href=(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)')[^>]*>(?P<text>.*?)</a>"#)
        .unwrap()
});

static INLINE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"``[^\n]+?``|`[^`\n]+`").unwrap());

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1A(?P<n>\d+)\x1A").unwrap());

const HEADING_HASH: &str = " # ";
const HEADING_HASH_ESCAPED: &str = r" \# ";

/// Settings the rewriter needs from the run config.
#[derive(Debug, Clone, Copy)]
pub struct RewriteOptions<'a> {
    /// Prefix of tag listing pages, with leading and trailing slash.
    pub tags_url_prefix: &'a str,
}

impl Default for RewriteOptions<'_> {
    fn default() -> Self {
        Self {
            tags_url_prefix: "/tags/",
        }
    }
}

/// Apply every rule, in order, to a document body.
pub fn rewrite_body(body: &str, options: &RewriteOptions, stats: &mut Stats) -> String {
    let protected = protect_code(body);
    stats.code_spans_protected += protected.spans.len() as u32;

    let text = rewrite_links(&protected.text, stats);
    inventory_html_links(&text, stats);
    let text = link_hashtags(&text, options.tags_url_prefix, stats);
    let text = promote_image_captions(&text, stats);
    let text = convert_highlights(&text, stats);
    let text = escape_heading_hashes(&text, stats);

    protected.restore(&text)
}

// ============================================================================
// Code protection
// ============================================================================

/// Body text with every code region swapped for a placeholder.
#[derive(Debug, Clone)]
pub struct ProtectedText {
    pub text: String,
    /// Original code regions, indexed by placeholder number.
    pub spans: Vec<String>,
}

impl ProtectedText {
    /// Put the original code back.
    pub fn restore(&self, text: &str) -> String {
        PLACEHOLDER_RE
            .replace_all(text, |caps: &Captures| {
                caps["n"]
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| self.spans.get(n))
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

fn placeholder(n: usize) -> String {
    format!("\u{1A}{n}\u{1A}")
}

/// An open code fence: its character and run length.
struct Fence {
    ch: char,
    len: usize,
}

impl Fence {
    fn open(line: &str) -> Option<Self> {
        let trimmed = line.trim_start();
        let ch = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
        let len = trimmed.chars().take_while(|c| *c == ch).count();
        (len >= 3).then_some(Self { ch, len })
    }

    fn closes(&self, line: &str) -> bool {
        let trimmed = line.trim_start();
        let len = trimmed.chars().take_while(|c| *c == self.ch).count();
        len >= self.len && trimmed[len * self.ch.len_utf8()..].trim().is_empty()
    }
}

/// Replace fenced blocks, then inline code spans, with placeholders.
///
/// An unclosed fence runs to the end of the body.
pub fn protect_code(body: &str) -> ProtectedText {
    let mut spans = Vec::new();
    let mut text = String::with_capacity(body.len());

    let mut fence: Option<Fence> = None;
    let mut block = String::new();
    for line in body.split_inclusive('\n') {
        match &fence {
            None => match Fence::open(line) {
                Some(open) => {
                    fence = Some(open);
                    block.push_str(line);
                }
                None => text.push_str(line),
            },
            Some(open) => {
                block.push_str(line);
                if open.closes(line) {
                    fence = None;
                    flush_block(&mut block, &mut text, &mut spans);
                }
            }
        }
    }
    if !block.is_empty() {
        flush_block(&mut block, &mut text, &mut spans);
    }

    let text = INLINE_CODE_RE
        .replace_all(&text, |caps: &Captures| {
            spans.push(caps[0].to_string());
            placeholder(spans.len() - 1)
        })
        .into_owned();

    ProtectedText { text, spans }
}

/// Move a finished fenced block into `spans`, leaving a placeholder.
///
/// The block's trailing newline stays in the text so line structure around
/// the placeholder is unchanged.
fn flush_block(block: &mut String, text: &mut String, spans: &mut Vec<String>) {
    let code = std::mem::take(block);
    let (code, newline) = match code.strip_suffix('\n') {
        Some(code) => (code.to_string(), "\n"),
        None => (code, ""),
    };
    spans.push(code);
    text.push_str(&placeholder(spans.len() - 1));
    text.push_str(newline);
}

// ============================================================================
// Links
// ============================================================================

/// Video id of a YouTube watch or short link.
pub fn youtube_id(url: &str) -> Option<&str> {
    YOUTUBE_RE
        .captures(url)
        .and_then(|caps| caps.name("id"))
        .map(|m| m.as_str())
}

/// How a link target was rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlRewrite {
    /// `dir/index.md` → `dir/`
    IndexSuffix,
    /// `dir/X/X.md` → `dir/X/`
    DuplicateFilename,
}

/// Rewrite a link target for the leaf layout. A `#fragment` is preserved.
pub fn rewrite_link_url(url: &str) -> Option<(String, UrlRewrite)> {
    let (path, fragment) = match url.find('#') {
        Some(i) => url.split_at(i),
        None => (url, ""),
    };

    if let Some(prefix) = path.strip_suffix("/index.md") {
        return Some((format!("{prefix}/{fragment}"), UrlRewrite::IndexSuffix));
    }

    let stem_path = path.strip_suffix(".md")?;
    let (dir_path, file) = stem_path.rsplit_once('/')?;
    let last_dir = dir_path.rsplit('/').next()?;
    if !file.is_empty() && file == last_dir {
        Some((format!("{dir_path}/{fragment}"), UrlRewrite::DuplicateFilename))
    } else {
        None
    }
}

/// YouTube embeds and link target rewrites.
pub fn rewrite_links(text: &str, stats: &mut Stats) -> String {
    LINK_RE
        .replace_all(text, |caps: &Captures| {
            let is_image = !caps["bang"].is_empty();
            let url = &caps["url"];

            if is_image && let Some(id) = youtube_id(url) {
                debug!(link = %&caps[0], id = %id, "converting YouTube link to embed");
                stats.youtube_links_converted += 1;
                return format!("{{{{< youtube {id} >}}}}");
            }

            match rewrite_link_url(url) {
                Some((new_url, kind)) => {
                    debug!(from = %url, to = %new_url, ?kind, "rewriting link target");
                    match kind {
                        UrlRewrite::IndexSuffix => stats.index_links_rewritten += 1,
                        UrlRewrite::DuplicateFilename => stats.duplicate_links_collapsed += 1,
                    }
                    let title = caps.name("title").map_or("", |m| m.as_str());
                    format!("{}[{}]({new_url}{title})", &caps["bang"], &caps["text"])
                }
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Log raw HTML anchors with their Markdown equivalent. Text is not changed.
pub fn inventory_html_links(text: &str, stats: &mut Stats) {
    for caps in HTML_LINK_RE.captures_iter(text) {
        let href = caps
            .name("dq")
            .or_else(|| caps.name("sq"))
            .map_or("", |m| m.as_str());
        debug!(
            html = %&caps[0],
            markdown = %format!("[{}]({href})", &caps["text"]),
            "HTML link found"
        );
        stats.html_links_found += 1;
    }
}

// ============================================================================
// Tags, images, highlights
// ============================================================================

/// Turn ` #tag` into a link to the tag's listing page.
///
/// Tags inside an existing link or image (text, title or trailing caption)
/// are left alone.
pub fn link_hashtags(text: &str, prefix: &str, stats: &mut Stats) -> String {
    let links: Vec<_> = LINK_RE
        .find_iter(text)
        .chain(IMAGE_RE.find_iter(text))
        .map(|m| m.range())
        .collect();
    HASHTAG_RE
        .replace_all(text, |caps: &Captures| {
            let start = caps.get(0).map_or(0, |m| m.start());
            if links.iter().any(|link| link.contains(&start)) {
                return caps[0].to_string();
            }
            let tag = &caps["tag"];
            stats.hashtags_linked += 1;
            format!(
                "{}[#{tag}]({prefix}{}/)",
                &caps["lead"],
                tag.to_lowercase()
            )
        })
        .into_owned()
}

/// Caption after an image becomes its title; `.heic` targets become `.jpeg`.
pub fn promote_image_captions(text: &str, stats: &mut Stats) -> String {
    IMAGE_RE
        .replace_all(text, |caps: &Captures| {
            let url = &caps["url"];
            let converted = converted_image_name(url);
            let caption = caps.name("caption").map(|m| m.as_str());

            if converted.is_none() && caption.is_none() {
                return caps[0].to_string();
            }
            if converted.is_some() {
                stats.image_links_converted += 1;
            }
            if caption.is_some() {
                stats.image_captions_promoted += 1;
            }

            let url = converted.as_deref().unwrap_or(url);
            let title = caption.or_else(|| caps.name("title").map(|m| m.as_str()));
            match title {
                Some(title) => format!("![{}]({url} \"{title}\")", &caps["alt"]),
                None => format!("![{}]({url})", &caps["alt"]),
            }
        })
        .into_owned()
}

/// `==text==` → `<mark>text</mark>`.
pub fn convert_highlights(text: &str, stats: &mut Stats) -> String {
    HIGHLIGHT_RE
        .replace_all(text, |caps: &Captures| {
            stats.highlights_converted += 1;
            format!("<mark>{}</mark>", &caps["text"])
        })
        .into_owned()
}

/// Escape ` # ` so list items like "- # of items" do not render as headings.
pub fn escape_heading_hashes(text: &str, stats: &mut Stats) -> String {
    let count = text.matches(HEADING_HASH).count();
    if count == 0 {
        return text.to_string();
    }
    stats.heading_hashes_escaped += count as u32;
    text.replace(HEADING_HASH, HEADING_HASH_ESCAPED)
}
