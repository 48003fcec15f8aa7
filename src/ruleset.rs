//! Swappable markup extraction rules.
//!
//! The harvester never names a CSS class itself. It asks an
//! [`ExtractionRuleset`] for the stubs on an index page and for the fields
//! on a detail page, so a markup change on the site means a new ruleset,
//! not a new harvester.
//!
//! The stock implementation, [`SelectorRuleset`], is driven by a
//! [`SelectorSpec`]: plain CSS selector strings that can come from a
//! built-in preset or straight from the YAML config.
//!
//! # Presets
//!
//! | Name | Markup generation |
//! |------|-------------------|
//! | `fontanka-2023` | Index items `li.IFae9`, comment counter in a `span` |
//! | `fontanka-2022` | Index items `li.IPafn`, comment counter in a `div` |

use crate::error::{HarvestError, Result};
use crate::models::ArticleStub;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_PRESET: &str = "fontanka-2023";

/// Digit groups separated by ASCII, no-break or narrow no-break spaces.
static COUNTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+(?:[ \x{a0}\x{202f}][0-9]+)*$").unwrap());

/// Extraction capability injected into the harvester.
pub trait ExtractionRuleset {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Candidate article links on an index page, in document order.
    fn extract_stubs(&self, html: &str) -> Vec<ArticleStub>;

    /// Fields of an article detail page.
    fn extract_detail(&self, html: &str) -> DetailFields;
}

/// State of the comment counter on a detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentsField {
    Count(u64),
    /// The counter element exists but holds no number.
    Unparsable(String),
    /// No counter element: comments are disabled for the article.
    Absent,
}

/// Raw fields pulled from a detail page, before policy is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailFields {
    pub content: String,
    pub views: Option<u64>,
    pub comments: CommentsField,
    /// Publication date text, to be run through [`crate::dates::parse_timestamp`].
    pub published: Option<String>,
}

/// CSS selectors describing one generation of a site's markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorSpec {
    /// One element per article on the index page.
    pub stub: String,
    /// Topic link inside a stub element.
    pub stub_topic: String,
    /// Attribute of the topic link holding the topic name.
    #[serde(default = "default_topic_attr")]
    pub stub_topic_attr: String,
    /// Article link inside a stub element; its text is the title.
    pub stub_link: String,
    /// Comment counter on the detail page. Its presence marks an article
    /// with comments enabled.
    pub comments: String,
    /// Content blocks on the detail page.
    pub content: String,
    pub views: String,
    pub published: String,
}

fn default_topic_attr() -> String {
    "title".to_string()
}

impl SelectorSpec {
    /// Look up a built-in selector set by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "fontanka-2023" => Some(Self {
                stub: "li.IFae9".to_string(),
                stub_topic: "a.IFhf.IFkp".to_string(),
                stub_topic_attr: default_topic_attr(),
                stub_link: "a.IFcb".to_string(),
                comments: "span.JBahp.primarySubtitle1AccentMobile".to_string(),
                content: "div.B1ah.I-a3.I-ah".to_string(),
                views: "span.A7hp.primaryOverlineMobile".to_string(),
                published: "span[itemprop=\"datePublished\"]".to_string(),
            }),
            "fontanka-2022" => Some(Self {
                stub: "li.IPafn".to_string(),
                stub_topic: "a.IPmv.IPl7".to_string(),
                stub_topic_attr: default_topic_attr(),
                stub_link: "a.IPef".to_string(),
                comments: "div.NBzj.MVzj".to_string(),
                content: "div.CFah.JFa3.JFah".to_string(),
                views: "span.CNm3.primaryOverlineMobile".to_string(),
                published: "span[itemprop=\"datePublished\"]".to_string(),
            }),
            _ => None,
        }
    }

    pub fn preset_names() -> &'static [&'static str] {
        &["fontanka-2023", "fontanka-2022"]
    }
}

/// An [`ExtractionRuleset`] backed by compiled CSS selectors.
#[derive(Debug)]
pub struct SelectorRuleset {
    name: String,
    stub: Selector,
    stub_topic: Selector,
    stub_topic_attr: String,
    stub_link: Selector,
    comments: Selector,
    content: Selector,
    views: Selector,
    published: Selector,
}

impl SelectorRuleset {
    /// Compile a [`SelectorSpec`]. Fails on the first invalid selector.
    pub fn compile(name: impl Into<String>, spec: &SelectorSpec) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            stub: parse_selector(&spec.stub)?,
            stub_topic: parse_selector(&spec.stub_topic)?,
            stub_topic_attr: spec.stub_topic_attr.clone(),
            stub_link: parse_selector(&spec.stub_link)?,
            comments: parse_selector(&spec.comments)?,
            content: parse_selector(&spec.content)?,
            views: parse_selector(&spec.views)?,
            published: parse_selector(&spec.published)?,
        })
    }

    /// Compile a built-in preset by name.
    pub fn from_preset(name: &str) -> Result<Self> {
        let spec = SelectorSpec::preset(name).ok_or_else(|| {
            HarvestError::InvalidConfig(format!(
                "unknown ruleset preset `{}` (known: {})",
                name,
                SelectorSpec::preset_names().join(", ")
            ))
        })?;
        Self::compile(name, &spec)
    }

    fn stub_from(&self, item: ElementRef<'_>) -> Option<ArticleStub> {
        let topic = item
            .select(&self.stub_topic)
            .next()?
            .value()
            .attr(&self.stub_topic_attr)?
            .trim()
            .to_string();
        let link = item.select(&self.stub_link).next()?;
        let href = link.value().attr("href")?.trim().to_string();
        Some(ArticleStub {
            topic,
            title: element_text(link),
            href,
        })
    }
}

impl ExtractionRuleset for SelectorRuleset {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract_stubs(&self, html: &str) -> Vec<ArticleStub> {
        let document = Html::parse_document(html);
        let items: Vec<ElementRef<'_>> = document.select(&self.stub).collect();
        let stubs: Vec<ArticleStub> = items
            .iter()
            .filter_map(|item| self.stub_from(*item))
            .collect();
        debug!(
            ruleset = %self.name,
            items = items.len(),
            stubs = stubs.len(),
            "Extracted index stubs"
        );
        stubs
    }

    fn extract_detail(&self, html: &str) -> DetailFields {
        let document = Html::parse_document(html);

        let comments = match document.select(&self.comments).next() {
            None => CommentsField::Absent,
            Some(el) => {
                let text = element_text(el);
                match parse_count(&text) {
                    Some(n) => CommentsField::Count(n),
                    None => CommentsField::Unparsable(text),
                }
            }
        };

        let content = document
            .select(&self.content)
            .map(element_text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let views = document
            .select(&self.views)
            .next()
            .and_then(|el| parse_count(&element_text(el)));

        let published = document
            .select(&self.published)
            .next()
            .map(element_text)
            .filter(|t| !t.is_empty());

        DetailFields {
            content,
            views,
            comments,
            published,
        }
    }
}

fn parse_selector(raw: &str) -> Result<Selector> {
    Selector::parse(raw).map_err(|e| HarvestError::Selector {
        selector: raw.to_string(),
        reason: e.to_string(),
    })
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Read a counter such as `12 345` as a number.
///
/// Only digit-group spaces are tolerated. Abbreviated or fractional
/// counters (`1,2 тыс.`, `1.5K`) are rejected rather than guessed at.
pub fn parse_count(text: &str) -> Option<u64> {
    let text = text.trim();
    if !COUNTER.is_match(text) {
        return None;
    }
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}
