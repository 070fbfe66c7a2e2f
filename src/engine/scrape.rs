//! Page download and readable-text extraction.

use std::net::{IpAddr, Ipv4Addr};

use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::{EngineError, EngineResult, EngineSettings};

/// Selectors tried in order for the main content of a page.
const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "main",
    "[role=main]",
    ".post-content",
    ".entry-content",
    ".article-body",
];

/// Block elements collected when no content container is found.
const BLOCK_SELECTORS: &str = "p, h1, h2, h3, h4, h5, h6, li, blockquote, pre, td";

/// Elements whose text is never part of the readable content.
const SKIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "template", "svg", "nav", "footer", "header", "aside", "form",
];

/// Block fragments shorter than this are treated as navigation noise.
const MIN_BLOCK_LEN: usize = 20;

/// Extracted page content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Final URL after redirects.
    pub url: String,
    /// Contents of `<title>`, if any.
    pub title: Option<String>,
    /// Readable text, paragraphs separated by blank lines.
    pub text: String,
}

/// Downloads pages and extracts their text.
#[derive(Clone)]
pub struct PageFetcher {
    http: reqwest::Client,
    max_chars: usize,
    max_body_bytes: usize,
    allow_private_hosts: bool,
}

impl PageFetcher {
    /// Create a fetcher on top of a shared HTTP client.
    pub fn new(http: reqwest::Client, settings: &EngineSettings) -> Self {
        Self {
            http,
            max_chars: settings.max_page_chars,
            max_body_bytes: settings.max_body_bytes,
            allow_private_hosts: settings.allow_private_hosts,
        }
    }

    /// Download `url` and extract its readable text.
    pub async fn fetch(&self, url: &str) -> EngineResult<Page> {
        let parsed = parse_url(url)?;
        if !self.allow_private_hosts {
            ensure_public_host(&parsed)?;
        }

        let mut response = self.http.get(parsed).send().await?;
        let status = response.status();
        let final_url = response.url().to_string();
        if !status.is_success() {
            return Err(EngineError::Status {
                status: status.as_u16(),
                url: final_url,
            });
        }

        let too_large = || EngineError::PageTooLarge {
            url: final_url.clone(),
            limit: self.max_body_bytes,
        };
        if response
            .content_length()
            .is_some_and(|len| len > self.max_body_bytes as u64)
        {
            return Err(too_large());
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();
        let is_html = content_type.is_empty() || content_type.contains("html");
        if !is_html && !content_type.starts_with("text/") {
            return Err(EngineError::UnsupportedContent(content_type));
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if bytes.len() + chunk.len() > self.max_body_bytes {
                return Err(too_large());
            }
            bytes.extend_from_slice(&chunk);
        }
        let body = String::from_utf8_lossy(&bytes);

        debug!(url = %final_url, %content_type, bytes = bytes.len(), "page downloaded");

        let (title, text) = if is_html {
            let document = Html::parse_document(&body);
            (extract_title(&document), extract_readable_text(&document))
        } else {
            (None, normalize_plain_text(&body))
        };

        if text.trim().is_empty() {
            return Err(EngineError::EmptyPage(final_url));
        }

        Ok(Page {
            url: final_url,
            title,
            text: truncate_chars(text, self.max_chars),
        })
    }
}

/// Validate that `url` is an absolute http(s) URL.
pub fn parse_url(url: &str) -> EngineResult<Url> {
    let parsed =
        Url::parse(url.trim()).map_err(|e| EngineError::InvalidUrl(format!("{url} ({e})")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(EngineError::InvalidUrl(format!(
            "{url} (unsupported scheme '{other}')"
        ))),
    }
}

/// Reject URLs naming loopback, private, link-local or unspecified hosts.
///
/// Only literal addresses and `localhost` names are recognized; a public
/// name that resolves to a private address is not caught here.
pub fn ensure_public_host(url: &Url) -> EngineResult<()> {
    let host = url.host_str().unwrap_or_default();
    if is_private_host(host) {
        return Err(EngineError::BlockedHost(host.to_string()));
    }
    Ok(())
}

/// Whether `host` (as returned by [`Url::host_str`]) is a non-public address.
pub fn is_private_host(host: &str) -> bool {
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let lower = host.to_ascii_lowercase();
    if lower.is_empty() || lower == "localhost" || lower.ends_with(".localhost") {
        return true;
    }

    match host.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => is_private_v4(ip),
        Ok(IpAddr::V6(ip)) => match ip.to_ipv4_mapped() {
            Some(v4) => is_private_v4(v4),
            None => {
                let first = ip.segments()[0];
                ip.is_loopback()
                    || ip.is_unspecified()
                    || (first & 0xfe00) == 0xfc00
                    || (first & 0xffc0) == 0xfe80
            }
        },
        Err(_) => false,
    }
}

fn is_private_v4(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        // 100.64.0.0/10 carrier-grade NAT
        || (a == 100 && (64..128).contains(&b))
}

/// Text of the `<title>` element, whitespace-collapsed.
pub fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let title = document
        .select(&selector)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))?;
    (!title.is_empty()).then_some(title)
}

/// Readable content of an HTML document.
///
/// Tries common content containers first, then falls back to the block
/// elements of `<body>`. Scripts, styles and page chrome are skipped.
pub fn extract_readable_text(document: &Html) -> String {
    for sel_str in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(sel_str) else {
            continue;
        };
        let parts: Vec<String> = document
            .select(&selector)
            .map(|el| element_blocks(el).join("\n\n"))
            .filter(|t| !t.trim().is_empty())
            .collect();
        if !parts.is_empty() {
            return parts.join("\n\n");
        }
    }

    let (Ok(body_sel), Ok(block_sel)) = (Selector::parse("body"), Selector::parse(BLOCK_SELECTORS))
    else {
        return String::new();
    };
    let Some(body) = document.select(&body_sel).next() else {
        return String::new();
    };

    let mut paragraphs: Vec<String> = body
        .select(&block_sel)
        .filter(|el| !has_skipped_ancestor(*el))
        .filter(|el| !has_block_ancestor(*el))
        .map(element_text)
        .filter(|t| t.len() > MIN_BLOCK_LEN)
        .collect();
    paragraphs.dedup();

    if paragraphs.is_empty() {
        element_text(body)
    } else {
        paragraphs.join("\n\n")
    }
}

/// Split a container into paragraph-sized blocks of text.
fn element_blocks(element: ElementRef<'_>) -> Vec<String> {
    let Ok(block_sel) = Selector::parse(BLOCK_SELECTORS) else {
        return vec![element_text(element)];
    };

    let mut blocks: Vec<String> = element
        .select(&block_sel)
        .filter(|el| !has_skipped_ancestor(*el))
        .filter(|el| !has_block_ancestor(*el))
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect();
    blocks.dedup();

    if blocks.is_empty() {
        vec![element_text(element)]
    } else {
        blocks
    }
}

/// Whitespace-collapsed text of an element, skipping non-content children.
fn element_text(element: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    collect_text(element, &mut parts);
    collapse_whitespace(&parts.join(" "))
}

fn collect_text(element: ElementRef<'_>, out: &mut Vec<String>) {
    for child in element.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            if !SKIPPED_ELEMENTS.contains(&child_el.value().name()) {
                collect_text(child_el, out);
            }
        } else if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                out.push(trimmed.to_string());
            }
        }
    }
}

fn has_skipped_ancestor(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| SKIPPED_ELEMENTS.contains(&a.value().name()))
}

/// Nested blocks (a `<p>` inside an `<li>`) are already covered by the
/// outer block's text.
fn has_block_ancestor(element: ElementRef<'_>) -> bool {
    element.ancestors().filter_map(ElementRef::wrap).any(|a| {
        matches!(
            a.value().name(),
            "p" | "li" | "blockquote" | "pre" | "td" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
        )
    })
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Plain-text bodies keep their paragraph breaks but lose ragged spacing.
fn normalize_plain_text(body: &str) -> String {
    body.split("\n\n")
        .map(collapse_whitespace)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn truncate_chars(text: String, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text,
    }
}
