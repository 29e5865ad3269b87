//! In-page navigation link discovery.

use scraper::{Html, Selector};

/// An anchor whose text names the sport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SportLink {
    pub href: String,
    pub text: String,
}

impl SportLink {
    /// CSS selector matching this anchor in the live page.
    pub fn selector(&self) -> String {
        format!(
            "a[href=\"{}\"]",
            self.href.replace('\\', "\\\\").replace('"', "\\\"")
        )
    }

    /// Absolute URL of the link, resolved against the site base.
    pub fn absolute_url(&self, base_url: &str) -> String {
        if self.href.starts_with("http://") || self.href.starts_with("https://") {
            return self.href.clone();
        }
        let base = base_url.trim_end_matches('/');
        if self.href.starts_with('/') {
            format!("{}{}", base, self.href)
        } else {
            format!("{}/{}", base, self.href)
        }
    }
}

/// Find the navigation link for a sport in rendered HTML.
///
/// An anchor whose whole text equals the sport name (ignoring case) wins
/// over one that merely contains it.
pub fn find_sport_link(html: &str, sport_name: &str) -> Option<SportLink> {
    let wanted = sport_name.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }

    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return None;
    };

    let mut partial = None;
    for anchor in document.select(&selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
            continue;
        }

        let text = anchor
            .text()
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        let lowered = text.to_lowercase();

        let link = SportLink {
            href: href.to_string(),
            text,
        };
        if lowered == wanted {
            return Some(link);
        }
        if partial.is_none() && lowered.contains(&wanted) {
            partial = Some(link);
        }
    }

    partial
}
