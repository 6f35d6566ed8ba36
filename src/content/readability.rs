// src/content/readability.rs
//! Reduce an HTML page to its readable title and plain text.

use anyhow::Result;
use scraper::{ElementRef, Html, Node, Selector};

const MAIN_SELECTORS: [&str; 12] = [
    "main",
    "article",
    "[role='main']",
    "#job-description",
    "[class*='job-description']",
    "#content",
    "#main",
    ".content",
    ".main",
    ".post-content",
    ".entry-content",
    "body",
];

const SKIP_TAGS: [&str; 14] = [
    "script", "style", "noscript", "template", "nav", "header", "footer", "aside", "form",
    "iframe", "svg", "button", "select", "head",
];

const BOILERPLATE_HINTS: [&str; 15] = [
    "nav",
    "navbar",
    "menu",
    "sidebar",
    "advert",
    "ads",
    "cookie",
    "banner",
    "breadcrumb",
    "share",
    "social",
    "related",
    "promo",
    "popup",
    "newsletter",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readable {
    pub title: String,
    pub text: String,
}

pub fn extract_readable(html: &str) -> Result<Readable> {
    let document = Html::parse_document(html);

    let title = find_title(&document).unwrap_or_else(|| "No Title".to_string());

    let root = MAIN_SELECTORS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|selector| {
            document
                .select(&selector)
                .find(|el| !is_boilerplate(el))
        });

    let mut chunks = Vec::new();
    match root {
        Some(root) => collect_text(root, &mut chunks),
        None => collect_text(document.root_element(), &mut chunks),
    }

    let text = normalize_whitespace(&chunks.join("\n"));
    if text.is_empty() {
        anyhow::bail!("Failed to extract readable content from page");
    }

    Ok(Readable { title, text })
}

fn find_title(document: &Html) -> Option<String> {
    ["title", "h1"].iter().find_map(|s| {
        let selector = Selector::parse(s).ok()?;
        document
            .select(&selector)
            .map(|el| el.text().collect::<Vec<_>>().join(" "))
            .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
            .find(|t| !t.is_empty())
    })
}

fn collect_text(element: ElementRef, out: &mut Vec<String>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    out.push(text.to_string());
                }
            }
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    if !is_boilerplate(&child_el) {
                        collect_text(child_el, out);
                    }
                }
            }
            _ => {}
        }
    }
}

fn is_boilerplate(element: &ElementRef) -> bool {
    let el = element.value();
    if SKIP_TAGS.contains(&el.name()) {
        return true;
    }
    // Page-level state classes such as `nav-open` land on these.
    if matches!(el.name(), "body" | "main" | "article") {
        return false;
    }

    el.classes().chain(el.id()).any(|token| {
        let token = token.to_lowercase();
        BOILERPLATE_HINTS.iter().any(|hint| {
            token == *hint
                || token.starts_with(&format!("{}-", hint))
                || token.starts_with(&format!("{}_", hint))
        })
    })
}

/// Trim every line and drop the blank ones.
pub fn normalize_whitespace(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
