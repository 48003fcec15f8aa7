//! Run configuration.
//!
//! Every field has a default matching the stock target site, so a config
//! file only needs the keys it changes. Command-line flags are applied on
//! top of the file by [`HarvestConfig::apply_cli`].
//!
//! ```yaml
//! concurrency: 5
//! flush_threshold: 500
//! comments_policy: record_zero
//! ruleset: fontanka-2022
//! filter:
//!   topic_blacklist: ["Афиша Plus", "Работа"]
//!   url_blacklist: ["longreads", "https"]
//! ```
//!
//! `ruleset` is either a preset name or an inline selector set with the
//! fields of [`SelectorSpec`].

use crate::checkpoint::DEFAULT_FLUSH_THRESHOLD;
use crate::cli::Cli;
use crate::error::{HarvestError, Result};
use crate::harvester::{CommentsPolicy, HarvesterSettings, Politeness, StubFilter};
use crate::models::{DateRange, HarvestUnit};
use crate::ruleset::{DEFAULT_PRESET, ExtractionRuleset, SelectorRuleset, SelectorSpec};
use crate::scheduler::DEFAULT_CONCURRENCY;
use chrono::NaiveDate;
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use url::Url;

/// Where the extraction rules come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RulesetSource {
    Preset(String),
    Custom(SelectorSpec),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarvestConfig {
    /// Base that relative article links resolve against.
    pub base_url: String,
    /// strftime pattern producing a date's index page URL.
    pub index_url_pattern: String,
    /// Maximum number of dates harvested at once.
    pub concurrency: usize,
    /// Records per checkpoint artifact.
    pub flush_threshold: usize,
    /// Politeness delay bounds after each date, in milliseconds.
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub comments_policy: CommentsPolicy,
    pub filter: StubFilter,
    pub ruleset: RulesetSource,
    pub output_dir: PathBuf,
    /// File name prefix for every artifact.
    pub prefix: String,
    /// Also write debug-level logs to this file.
    pub log_file: Option<PathBuf>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.fontanka.ru".to_string(),
            index_url_pattern: "https://www.fontanka.ru/%Y/%m/%d/news.html".to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
            min_delay_ms: 1000,
            max_delay_ms: 3000,
            request_timeout_secs: 30,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
            comments_policy: CommentsPolicy::Skip,
            filter: StubFilter::default(),
            ruleset: RulesetSource::Preset(DEFAULT_PRESET.to_string()),
            output_dir: PathBuf::from("."),
            prefix: "fontanka".to_string(),
            log_file: None,
        }
    }
}

impl HarvestConfig {
    /// Read a YAML config file. Validation waits until CLI overrides are applied.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&text)?)
    }

    /// Overlay command-line flags onto this config.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(n) = cli.concurrency {
            self.concurrency = n;
        }
        if let Some(n) = cli.flush_threshold {
            self.flush_threshold = n;
        }
        if let Some(dir) = &cli.output_dir {
            self.output_dir = dir.clone();
        }
        if let Some(prefix) = &cli.prefix {
            self.prefix = prefix.clone();
        }
        if let Some(name) = &cli.ruleset {
            self.ruleset = RulesetSource::Preset(name.clone());
        }
        if let Some(policy) = cli.comments_policy {
            self.comments_policy = policy;
        }
        if let Some(path) = &cli.log_file {
            self.log_file = Some(path.clone());
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(HarvestError::InvalidConfig("concurrency must be at least 1".into()));
        }
        if self.flush_threshold == 0 {
            return Err(HarvestError::InvalidConfig("flush_threshold must be at least 1".into()));
        }
        if self.min_delay_ms > self.max_delay_ms {
            return Err(HarvestError::InvalidConfig(format!(
                "min_delay_ms ({}) exceeds max_delay_ms ({})",
                self.min_delay_ms, self.max_delay_ms
            )));
        }
        if self.prefix.is_empty() {
            return Err(HarvestError::InvalidConfig("prefix must not be empty".into()));
        }
        Url::parse(&self.base_url)?;
        if StrftimeItems::new(&self.index_url_pattern).any(|item| matches!(item, Item::Error)) {
            return Err(HarvestError::InvalidPattern(self.index_url_pattern.clone()));
        }
        Ok(())
    }

    /// Index page URL for one date.
    pub fn index_url(&self, date: NaiveDate) -> String {
        date.format(&self.index_url_pattern).to_string()
    }

    /// One unit per date in `range`, in date order.
    pub fn units(&self, range: &DateRange) -> Vec<HarvestUnit> {
        range
            .dates()
            .into_iter()
            .map(|date| HarvestUnit {
                date,
                index_url: self.index_url(date),
            })
            .collect()
    }

    pub fn harvester_settings(&self) -> Result<HarvesterSettings> {
        Ok(HarvesterSettings {
            base_url: Url::parse(&self.base_url)?,
            filter: self.filter.clone(),
            comments_policy: self.comments_policy,
            politeness: Politeness {
                min: Duration::from_millis(self.min_delay_ms),
                max: Duration::from_millis(self.max_delay_ms),
            },
        })
    }

    pub fn build_ruleset(&self) -> Result<Box<dyn ExtractionRuleset>> {
        let ruleset = match &self.ruleset {
            RulesetSource::Preset(name) => SelectorRuleset::from_preset(name)?,
            RulesetSource::Custom(spec) => SelectorRuleset::compile("custom", spec)?,
        };
        info!(ruleset = ruleset.name(), "Compiled extraction ruleset");
        Ok(Box::new(ruleset))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = HarvestConfig::default();
        config.validate().unwrap();
        assert_eq!(config.concurrency, 10);
        assert_eq!(config.flush_threshold, 1000);
        assert!(config.build_ruleset().is_ok());
    }

    #[test]
    fn test_index_url_and_units() {
        let config = HarvestConfig::default();
        assert_eq!(
            config.index_url(date(2022, 1, 5)),
            "https://www.fontanka.ru/2022/01/05/news.html"
        );
        let units = config.units(&DateRange::new(date(2021, 12, 31), date(2022, 1, 2)));
        assert_eq!(units.len(), 2);
        assert_eq!(units[1].date, date(2022, 1, 1));
        assert_eq!(units[1].index_url, "https://www.fontanka.ru/2022/01/01/news.html");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
concurrency: 4
comments_policy: record_zero
ruleset: fontanka-2022
filter:
  topic_blacklist: ["Реклама"]
"#;
        let config: HarvestConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.comments_policy, CommentsPolicy::RecordZero);
        assert_eq!(config.ruleset, RulesetSource::Preset("fontanka-2022".to_string()));
        assert_eq!(config.filter.topic_blacklist, vec!["Реклама".to_string()]);
        assert_eq!(config.filter.url_blacklist, StubFilter::default().url_blacklist);
        assert!(config.filter.url_blacklist.contains(&"https".to_string()));
        assert_eq!(config.flush_threshold, 1000);
    }

    #[test]
    fn test_empty_blacklist_is_kept_empty() {
        let config: HarvestConfig = serde_yaml::from_str("filter:\n  url_blacklist: []\n").unwrap();
        assert!(config.filter.url_blacklist.is_empty());
        assert_eq!(config.filter.topic_blacklist, StubFilter::default().topic_blacklist);
    }

    #[test]
    fn test_inline_ruleset() {
        let yaml = r#"
ruleset:
  stub: "li.item"
  stub_topic: "a.topic"
  stub_link: "a.link"
  comments: "span.comments"
  content: "div.body"
  views: "span.views"
  published: "time"
"#;
        let config: HarvestConfig = serde_yaml::from_str(yaml).unwrap();
        match &config.ruleset {
            RulesetSource::Custom(spec) => assert_eq!(spec.stub_topic_attr, "title"),
            other => panic!("expected inline ruleset, got {:?}", other),
        }
        assert_eq!(config.build_ruleset().unwrap().name(), "custom");
    }

    #[test]
    fn test_validation_failures() {
        let mut config = HarvestConfig::default();
        config.min_delay_ms = 5000;
        assert!(config.validate().is_err());

        let mut config = HarvestConfig::default();
        config.index_url_pattern = "https://x.test/%Q/".to_string();
        assert!(matches!(config.validate(), Err(HarvestError::InvalidPattern(_))));

        let mut config = HarvestConfig::default();
        config.concurrency = 0;
        assert!(config.validate().is_err());

        assert!(serde_yaml::from_str::<HarvestConfig>("colour: blue").is_err());
    }

    #[test]
    fn test_cli_overrides_file() {
        let cli = Cli::parse_from([
            "news_harvest",
            "--start",
            "2022-01-01",
            "--end",
            "2022-01-03",
            "-c",
            "3",
            "--ruleset",
            "fontanka-2022",
            "--comments-policy",
            "record-zero",
        ]);
        let mut config = HarvestConfig::default();
        config.apply_cli(&cli);
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.ruleset, RulesetSource::Preset("fontanka-2022".to_string()));
        assert_eq!(config.comments_policy, CommentsPolicy::RecordZero);
        assert_eq!(config.flush_threshold, 1000);
    }

    #[test]
    fn test_cli_can_repair_invalid_file_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harvest.yaml");
        std::fs::write(&path, "concurrency: 0\n").unwrap();

        let mut config = HarvestConfig::load(&path).unwrap();
        assert!(config.validate().is_err());

        let cli = Cli::parse_from(["news_harvest", "-s", "2022-01-01", "-e", "2022-01-02", "-c", "4"]);
        config.apply_cli(&cli);
        config.validate().unwrap();
        assert_eq!(config.concurrency, 4);
    }
}
