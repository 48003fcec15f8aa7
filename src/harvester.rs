//! Two-stage harvesting of a single date.
//!
//! A [`PageHarvester`] turns one [`HarvestUnit`] into one [`HarvestResult`]:
//!
//! 1. **Index**: fetch the date's index page and extract stubs with the ruleset
//! 2. **Filter**: drop stubs whose topic or link is blacklisted
//! 3. **Detail**: fetch each surviving article, in index order, and extract its fields
//!
//! Nothing escapes [`PageHarvester::harvest`]. A fetch or extraction fault
//! ends the unit early and keeps whatever records were already collected.
//! Every unit then waits a randomized politeness delay before it counts as
//! finished.

use crate::dates::parse_timestamp;
use crate::error::Result;
use crate::fetch::PageFetcher;
use crate::models::{ArticleRecord, ArticleStub, HarvestResult, HarvestUnit};
use crate::ruleset::{CommentsField, ExtractionRuleset};
use clap::ValueEnum;
use rand::{Rng, rng};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// What to do with an article whose comment counter is missing or unreadable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum CommentsPolicy {
    /// Leave the article out.
    #[default]
    Skip,
    /// Keep the article with `comments_amount = 0`.
    RecordZero,
}

/// Topic and link blacklists applied to index stubs.
///
/// An omitted list keeps the stock site's entries; an explicit empty list
/// disables it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StubFilter {
    /// Topics to drop. A topic matches when it equals an entry or either
    /// string contains the other.
    #[serde(default = "default_topic_blacklist")]
    pub topic_blacklist: Vec<String>,
    /// Substrings that disqualify a link target.
    #[serde(default = "default_url_blacklist")]
    pub url_blacklist: Vec<String>,
}

impl Default for StubFilter {
    fn default() -> Self {
        Self {
            topic_blacklist: default_topic_blacklist(),
            url_blacklist: default_url_blacklist(),
        }
    }
}

fn default_topic_blacklist() -> Vec<String> {
    ["Афиша Plus", "Новости компаний", "Работа", "ЖКХ", "Финляндия"]
        .map(String::from)
        .to_vec()
}

// `https` catches absolute links, which all point off-site.
fn default_url_blacklist() -> Vec<String> {
    ["longreads", "doctorpiter", "https", "vk", "amp"]
        .map(String::from)
        .to_vec()
}

impl StubFilter {
    /// Why a stub is dropped, or `None` if it should be fetched.
    pub fn rejection(&self, stub: &ArticleStub) -> Option<String> {
        if let Some(entry) = self
            .topic_blacklist
            .iter()
            .find(|entry| topic_matches(&stub.topic, entry))
        {
            return Some(format!("topic matches `{}`", entry));
        }
        self.url_blacklist
            .iter()
            .find(|needle| stub.href.contains(needle.as_str()))
            .map(|needle| format!("link contains `{}`", needle))
    }
}

fn topic_matches(topic: &str, entry: &str) -> bool {
    if topic.is_empty() || entry.is_empty() {
        return false;
    }
    topic == entry || entry.contains(topic) || topic.contains(entry)
}

/// Uniformly random pause taken after every unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Politeness {
    pub min: Duration,
    pub max: Duration,
}

impl Politeness {
    pub fn none() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    pub fn sample(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let lo = self.min.as_millis() as u64;
        let hi = self.max.as_millis() as u64;
        Duration::from_millis(rng().random_range(lo..=hi))
    }
}

/// Everything a harvester needs besides its fetcher and ruleset.
#[derive(Debug, Clone)]
pub struct HarvesterSettings {
    /// Base that relative article links are resolved against.
    pub base_url: Url,
    pub filter: StubFilter,
    pub comments_policy: CommentsPolicy,
    pub politeness: Politeness,
}

pub struct PageHarvester<F> {
    fetcher: F,
    ruleset: Box<dyn ExtractionRuleset>,
    settings: HarvesterSettings,
}

impl<F: PageFetcher> PageHarvester<F> {
    pub fn new(fetcher: F, ruleset: Box<dyn ExtractionRuleset>, settings: HarvesterSettings) -> Self {
        Self {
            fetcher,
            ruleset,
            settings,
        }
    }

    /// Harvest one date. Always returns a result, possibly empty.
    #[instrument(level = "info", skip_all, fields(date = %unit.date))]
    pub async fn harvest(&self, unit: HarvestUnit) -> HarvestResult {
        let mut records = Vec::new();
        match self.collect(&unit, &mut records).await {
            Ok(()) => info!(count = records.len(), "Collected articles"),
            Err(e) => error!(
                url = %unit.index_url,
                error = %e,
                kept = records.len(),
                "Harvest unit failed; keeping articles collected so far"
            ),
        }

        let delay = self.settings.politeness.sample();
        if !delay.is_zero() {
            debug!(?delay, "Politeness pause");
            sleep(delay).await;
        }

        HarvestResult { unit, records }
    }

    async fn collect(&self, unit: &HarvestUnit, records: &mut Vec<ArticleRecord>) -> Result<()> {
        let index = self.fetcher.fetch(&unit.index_url).await?;
        let stubs = self.ruleset.extract_stubs(&index);
        if stubs.is_empty() {
            warn!(url = %unit.index_url, ruleset = self.ruleset.name(), "Index page has no article stubs");
            return Ok(());
        }
        debug!(stubs = stubs.len(), "Index page parsed");

        for stub in stubs {
            if let Some(reason) = self.settings.filter.rejection(&stub) {
                debug!(href = %stub.href, topic = %stub.topic, %reason, "Skipping stub");
                continue;
            }
            let url = self.settings.base_url.join(&stub.href)?;
            if let Some(record) = self.collect_article(stub, url.into()).await? {
                records.push(record);
            }
        }
        Ok(())
    }

    async fn collect_article(&self, stub: ArticleStub, url: String) -> Result<Option<ArticleRecord>> {
        let page = self.fetcher.fetch(&url).await?;
        let fields = self.ruleset.extract_detail(&page);

        let comments_amount = match (fields.comments, self.settings.comments_policy) {
            (CommentsField::Count(n), _) => n,
            (CommentsField::Absent, CommentsPolicy::Skip) => {
                debug!(%url, "Comments disabled; skipping article");
                return Ok(None);
            }
            (CommentsField::Unparsable(text), CommentsPolicy::Skip) => {
                debug!(%url, %text, "Comment counter unreadable; skipping article");
                return Ok(None);
            }
            (_, CommentsPolicy::RecordZero) => 0,
        };

        let Some(views) = fields.views else {
            warn!(%url, "Views counter missing; skipping article");
            return Ok(None);
        };

        let timestamp = match fields.published.as_deref() {
            Some(raw) => parse_timestamp(raw),
            None => {
                warn!(%url, "Publication date missing");
                None
            }
        };

        Ok(Some(ArticleRecord {
            source_url: url,
            title: stub.title,
            content: fields.content,
            topic: stub.topic,
            timestamp,
            views,
            comments_amount,
        }))
    }
}
