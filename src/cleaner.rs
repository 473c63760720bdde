//! Turns captured article HTML into clean Markdown articles.
//!
//! The page is reduced to its `<title>` and visible text with `scraper`, and
//! the text is handed to a text-generation model that rewrites it as the
//! bare article body. The model's answer is taken as-is: nothing here can
//! tell a good cleaning from a bad one.

use crate::api::{AskAsync, ask_with_backoff};
use crate::models::{Article, RawPage};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::error::Error;
use tracing::{debug, instrument};

static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("title selector parses"));

/// Elements whose text never belongs to the article.
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Prompt sent to the model; `{text}` is replaced by the extracted page text.
pub const CLEANING_PROMPT: &str = "\
## Raw Text
{text}

## Task
The raw text above was scraped from a web page that contains an article.
Clean it and return the article formatted as Markdown.
Return only the article content: leave out ads, subscription requests and any
request to follow, like, share or comment.
Do NOT start with a preamble such as \"Here's the clean text\". Write only the article.";

/// Title and visible text of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub title: String,
    pub text: String,
}

/// Extract the `<title>` and the visible text of an HTML document.
///
/// Lines are whitespace-normalized and blank lines dropped.
pub fn extract_page_text(html: &str) -> PageText {
    let document = Html::parse_document(html);

    let title = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let mut raw = String::new();
    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| HIDDEN_ELEMENTS.contains(&e.name()) || e.name() == "title")
        });
        if !hidden {
            raw.push_str(text);
            raw.push('\n');
        }
    }

    let text = raw
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    PageText { title, text }
}

/// Build the cleaning prompt for a page's raw text.
pub fn cleaning_prompt(raw_text: &str) -> String {
    CLEANING_PROMPT.replace("{text}", raw_text)
}

/// Content cleaner over any text-generation backend.
#[derive(Debug)]
pub struct ContentCleaner<T> {
    model: T,
}

impl<T> ContentCleaner<T>
where
    T: AskAsync<Response = String>,
{
    pub fn new(model: T) -> Self {
        Self { model }
    }

    /// Clean one captured page into an [`Article`].
    #[instrument(level = "info", skip_all, fields(url = %page.url))]
    pub async fn clean(&self, page: &RawPage) -> Result<Article, Box<dyn Error>> {
        let PageText { title, text } = extract_page_text(&page.html);
        debug!(%title, raw_chars = text.len(), "Extracted page text");

        let cleaned = ask_with_backoff(&self.model, &cleaning_prompt(&text)).await?;
        Ok(Article {
            url: page.url.clone(),
            title,
            text: cleaned,
        })
    }
}
