//! Category crawler
//!
//! Walks a category listing and its continuation pages, collects member
//! profile URLs, and keeps only pages that carry a professional bout table.
//! The survivors are written to the batch URL file, one per line.

use scraper::{Html, Selector};

use super::PageClient;
use crate::Result;

const BASE_URL: &str = "https://en.wikipedia.org";

pub struct CategoryCrawler<'a> {
    client: &'a PageClient,
}

impl<'a> CategoryCrawler<'a> {
    pub fn new(client: &'a PageClient) -> Self {
        CategoryCrawler { client }
    }

    /// Collect every member URL from the category and its follow-on pages
    pub fn collect_member_urls(&self, category_url: &str) -> Result<Vec<String>> {
        let mut urls = Vec::new();
        let mut next_url = Some(category_url.to_string());

        while let Some(url) = next_url.take() {
            let html = match self.client.fetch(&url) {
                Ok(html) => html,
                Err(e) => {
                    log::error!("Failed to fetch category page {}: {}", url, e);
                    break;
                }
            };

            let (members, next) = parse_category_page(&html);
            if members.is_empty() {
                log::warn!("No category block found on {}", url);
            }
            for member in members {
                if !urls.contains(&member) {
                    urls.push(member);
                }
            }

            next_url = next;
            if next_url.is_some() {
                self.client.pause();
            }
        }

        log::info!("{} URLs extracted from category", urls.len());
        Ok(urls)
    }

    /// Filter member pages down to those with a professional bout table
    ///
    /// Amateur-only profiles have no Result/Opponent/Date table and are
    /// dropped here rather than failing later in the extractor.
    pub fn filter_professionals(&self, urls: &[String]) -> Vec<String> {
        let mut professionals = Vec::new();

        for url in urls {
            match self.client.fetch(url) {
                Ok(html) => {
                    if has_bout_table(&html) {
                        log::info!("Professional profile: {}", url);
                        professionals.push(url.clone());
                    }
                }
                Err(e) => log::warn!("Skipping {}: {}", url, e),
            }
            self.client.pause();
        }

        professionals
    }
}

/// Extract member links and the "next page" continuation link
fn parse_category_page(html: &str) -> (Vec<String>, Option<String>) {
    let document = Html::parse_document(html);

    let block_selector = Selector::parse("div.mw-category").unwrap();
    let link_selector = Selector::parse("a[href]").unwrap();

    let mut members = Vec::new();
    if let Some(block) = document.select(&block_selector).next() {
        for link in block.select(&link_selector) {
            if let Some(href) = link.value().attr("href") {
                members.push(format!("{}{}", BASE_URL, href));
            }
        }
    }

    let next = document
        .select(&link_selector)
        .find(|link| {
            let text: String = link.text().collect();
            text.trim() == "next page"
        })
        .and_then(|link| link.value().attr("href"))
        .map(|href| format!("{}{}", BASE_URL, href));

    (members, next)
}

/// Check whether a page carries the professional bout-table header
fn has_bout_table(html: &str) -> bool {
    let document = Html::parse_document(html);
    let table_selector = Selector::parse("table.wikitable").unwrap();
    let header_selector = Selector::parse("th").unwrap();

    for table in document.select(&table_selector) {
        let headers: Vec<String> = table
            .select(&header_selector)
            .map(|th| th.text().collect::<String>().trim().to_string())
            .collect();
        if ["Result", "Opponent", "Date"]
            .iter()
            .all(|needle| headers.iter().any(|h| h == needle))
        {
            return true;
        }
    }
    false
}

/// Write collected URLs to the batch input file, one per line
pub fn write_urls(urls: &[String], path: &str) -> Result<()> {
    if let Some(parent) = std::path::Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut content = urls.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    std::fs::write(path, content)?;
    log::info!("Wrote {} URLs to {}", urls.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_category_page() {
        let html = r#"<html><body>
            <div class="mw-category">
              <a href="/wiki/Sam_Granite_(boxer)">Sam Granite</a>
              <a href="/wiki/Ivan_Oak">Ivan Oak</a>
            </div>
            <a href="/w/index.php?title=Category:X&pagefrom=Oak">next page</a>
        </body></html>"#;

        let (members, next) = parse_category_page(html);
        assert_eq!(
            members,
            vec![
                "https://en.wikipedia.org/wiki/Sam_Granite_(boxer)",
                "https://en.wikipedia.org/wiki/Ivan_Oak",
            ]
        );
        assert_eq!(
            next.as_deref(),
            Some("https://en.wikipedia.org/w/index.php?title=Category:X&pagefrom=Oak")
        );
    }

    #[test]
    fn test_parse_category_page_last_page() {
        let html = r#"<html><body>
            <div class="mw-category"><a href="/wiki/Pete_Slate">Pete Slate</a></div>
        </body></html>"#;
        let (members, next) = parse_category_page(html);
        assert_eq!(members.len(), 1);
        assert!(next.is_none());
    }

    #[test]
    fn test_has_bout_table() {
        let with = r#"<table class="wikitable"><tr>
            <th>Result</th><th>Opponent</th><th>Type</th><th>Date</th>
        </tr></table>"#;
        let without = r#"<table class="wikitable"><tr>
            <th>Year</th><th>Tournament</th>
        </tr></table>"#;
        assert!(has_bout_table(with));
        assert!(!has_bout_table(without));
    }
}
