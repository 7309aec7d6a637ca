use std::collections::HashSet;

use thiserror::Error;

use crate::config::Config;

/// Sources used when no feeds file is available: (name, url, is_podcast)
const BUILTIN_SOURCES: [(&str, &str, bool); 6] = [
    ("The Race", "https://www.the-race.com/feed/", false),
    ("F1.com", "https://www.formula1.com/en/latest/all.xml", false),
    ("Sky Sports F1", "https://www.skysports.com/rss/11095", false),
    (
        "The Race F1 Podcast",
        "https://feeds.acast.com/public/shows/6819ae2bf30c20bff775e8a1",
        true,
    ),
    (
        "F1 Beyond the Grid",
        "https://audioboom.com/channels/4964339.rss",
        true,
    ),
    ("F1 Nation", "https://audioboom.com/channels/5024396.rss", true),
];

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Duplicate source name: {0}")]
    DuplicateSource(String),
}

/// A configured feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    pub url: String,
    pub is_podcast: bool,
}

impl Source {
    pub fn new(name: impl Into<String>, url: impl Into<String>, is_podcast: bool) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            is_podcast,
        }
    }
}

/// Ordered, read-only set of sources keyed by name.
#[derive(Debug, Clone)]
pub struct Registry {
    sources: Vec<Source>,
}

impl Registry {
    pub fn new(sources: Vec<Source>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for source in &sources {
            if !seen.insert(source.name.as_str()) {
                return Err(RegistryError::DuplicateSource(source.name.clone()));
            }
        }

        Ok(Self { sources })
    }

    pub fn from_config(config: &Config) -> Result<Self, RegistryError> {
        let sources = config
            .feeds
            .iter()
            .map(|feed| Source::new(&feed.name, &feed.url, feed.podcast))
            .collect();

        Self::new(sources)
    }

    pub fn builtin() -> Self {
        let sources = BUILTIN_SOURCES
            .iter()
            .map(|(name, url, is_podcast)| Source::new(*name, *url, *is_podcast))
            .collect();

        Self { sources }
    }

    /// Looks up a source by exact name.
    pub fn get(&self, name: &str) -> Option<&Source> {
        self.sources.iter().find(|source| source.name == name)
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
