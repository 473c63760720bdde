//! Topic sections to visit.
//!
//! Sections come from an optional YAML file mapping section names to topic
//! URLs, visited in file order:
//!
//! ```yaml
//! AI: https://news.google.com/topics/...
//! Science: https://news.google.com/topics/...
//! ```

use serde_yaml::{Mapping, Value};
use std::error::Error;
use tracing::{info, instrument};

/// Google News, Technology, AI.
pub const GOOGLE_NEWS_AI_URL: &str = "https://news.google.com/topics/CAAqKggKIiRDQkFTRlFvSUwyMHZNRGRqTVhZU0JXVnVMVWRDR2dKSlRDZ0FQAQ/sections/CAQiQ0NCQVNMQW9JTDIwdk1EZGpNWFlTQW1WdUdnSlZVeUlOQ0FRYUNRb0hMMjB2TUcxcmVpb0pFZ2N2YlM4d2JXdDZLQUEqKggAKiYICiIgQ0JBU0Vnb0lMMjB2TURkak1YWVNBbVZ1R2dKVlV5Z0FQAVAB?hl=en-US&gl=US&ceid=US%3Aen";

/// A named topic feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub url: String,
}

impl Section {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Sections used when no file is given.
pub fn default_sections() -> Vec<Section> {
    vec![Section::new("AI", GOOGLE_NEWS_AI_URL)]
}

/// Parse a YAML mapping of section name to URL, keeping file order.
pub fn parse_sections(yaml: &str) -> Result<Vec<Section>, Box<dyn Error>> {
    let mapping: Mapping = serde_yaml::from_str(yaml)?;
    let mut sections = Vec::with_capacity(mapping.len());
    for (name, url) in mapping {
        match (name, url) {
            (Value::String(name), Value::String(url)) => {
                url::Url::parse(&url).map_err(|e| format!("section {name}: bad URL {url}: {e}"))?;
                sections.push(Section { name, url });
            }
            (name, _) => return Err(format!("section {name:?} must map a name to a URL").into()),
        }
    }
    if sections.is_empty() {
        return Err("sections file lists no sections".into());
    }
    Ok(sections)
}

/// Load sections from `path`, or fall back to [`default_sections`].
#[instrument(level = "info")]
pub async fn load_sections(path: Option<&str>) -> Result<Vec<Section>, Box<dyn Error>> {
    let sections = match path {
        Some(path) => parse_sections(&tokio::fs::read_to_string(path).await?)?,
        None => default_sections(),
    };
    info!(count = sections.len(), "Loaded sections");
    Ok(sections)
}
