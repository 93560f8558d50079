//! Best-effort field extraction from a fetched ad-library page.
//!
//! The ad library renders most of its data client-side and reshuffles its
//! markup frequently, so everything here is a heuristic over the raw HTML:
//! labeled-number patterns, heading tags, and text fragments. A miss on any
//! single field degrades that field to its zero/`None` value — it never
//! fails the extraction.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::types::RawFields;

static RESULT_COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([\d.,]+)\s+(?:ads?|results?|resultados?|campaigns?|an[uú]ncios?)\b")
        .expect("valid regex")
});
static AD_CARD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)role="article"|class="[^"]*ad-card|data-testid="[^"]*ad"#)
        .expect("valid regex")
});
static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<h1\b[^>]*>(.*?)</h1>|<[a-z]+\b[^>]*\brole=.heading.[^>]*>(.*?)</[a-z]+>")
        .expect("valid regex")
});
static IMPRESSIONS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([\d.,]+)\s*(?:impressions|impressões)").expect("valid regex")
});
static REACH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([\d.,]+)\s*(?:reach|alcance)").expect("valid regex")
});
static TEXT_FRAGMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:p|span)\b[^>]*>([^<]{20,500})</(?:p|span)>").expect("valid regex")
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));

const MAX_AD_TEXTS: usize = 10;
const MAX_PAGE_NAME_LEN: usize = 100;

/// Extracts whatever structured fields the page gives up.
///
/// Infallible by design: a page that matches nothing yields a structurally
/// empty [`RawFields`], which the engine classifies as `partial`.
#[must_use]
pub fn extract_fields(html: &str) -> RawFields {
    let campaigns_count = result_count(html).unwrap_or_else(|| ad_card_count(html));
    // The public page gives no separate creatives signal; mirror the
    // campaign count until one exists.
    let creatives_count = campaigns_count;

    RawFields {
        campaigns_count,
        creatives_count,
        impressions: labeled_number(&IMPRESSIONS_RE, html),
        reach: labeled_number(&REACH_RE, html),
        campaign_start_date: None,
        campaign_end_date: None,
        ad_texts: ad_texts(html),
        page_name: page_name(html),
    }
}

/// First "N ads/results/anúncios" style pattern in the body.
fn result_count(html: &str) -> Option<i32> {
    RESULT_COUNT_RE
        .captures(html)
        .and_then(|caps| parse_count(caps.get(1)?.as_str()))
        .and_then(|n| i32::try_from(n).ok())
}

/// Fallback: count ad-card markers when no result count is printed.
fn ad_card_count(html: &str) -> i32 {
    i32::try_from(AD_CARD_RE.find_iter(html).count()).unwrap_or(i32::MAX)
}

fn labeled_number(re: &Regex, html: &str) -> Option<i64> {
    re.captures(html)
        .and_then(|caps| parse_count(caps.get(1)?.as_str()))
}

/// Parses "1,234" / "1.234" style digit groups into a plain integer.
fn parse_count(raw: &str) -> Option<i64> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<i64>().ok()
}

/// First plausible heading text: non-empty after tag-stripping and shorter
/// than [`MAX_PAGE_NAME_LEN`] (long matches are layout noise, not a name).
fn page_name(html: &str) -> Option<String> {
    for caps in HEADING_RE.captures_iter(html) {
        let Some(inner) = caps.get(1).or_else(|| caps.get(2)) else {
            continue;
        };
        let text = strip_tags(inner.as_str());
        if !text.is_empty() && text.len() < MAX_PAGE_NAME_LEN {
            return Some(text);
        }
    }
    None
}

/// Up to [`MAX_AD_TEXTS`] de-duplicated ad-copy fragments, in page order.
fn ad_texts(html: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut texts = Vec::new();

    for caps in TEXT_FRAGMENT_RE.captures_iter(html) {
        let Some(m) = caps.get(1) else { continue };
        let text = strip_tags(m.as_str());
        if text.len() < 20 || text.len() > 500 {
            continue;
        }
        if seen.insert(text.clone()) {
            texts.push(text);
        }
        if texts.len() == MAX_AD_TEXTS {
            break;
        }
    }

    texts
}

fn strip_tags(fragment: &str) -> String {
    let without_tags = TAG_RE.replace_all(fragment, " ");
    without_tags.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_count_patterns() {
        assert_eq!(result_count("<div>~1,234 ads found</div>"), Some(1234));
        assert_eq!(result_count("<span>87 results</span>"), Some(87));
        assert_eq!(result_count("<span>12 anúncios</span>"), Some(12));
        assert_eq!(result_count("<div>no counters here</div>"), None);
    }

    #[test]
    fn ad_card_fallback_counts_markers() {
        let html = r#"<div role="article"></div><div role="article"></div>"#;
        let fields = extract_fields(html);
        assert_eq!(fields.campaigns_count, 2);
        assert_eq!(fields.creatives_count, 2);
    }

    #[test]
    fn explicit_count_wins_over_cards() {
        let html = r#"<span>5 ads</span><div role="article"></div>"#;
        assert_eq!(extract_fields(html).campaigns_count, 5);
    }

    #[test]
    fn page_name_from_h1() {
        let html = "<h1>Emagrecedor Turbo <b>Oficial</b></h1>";
        assert_eq!(
            page_name(html).as_deref(),
            Some("Emagrecedor Turbo Oficial")
        );
    }

    #[test]
    fn oversized_heading_is_skipped() {
        let long = "x".repeat(150);
        let html = format!("<h1>{long}</h1><h1>Real Name</h1>");
        assert_eq!(page_name(&html).as_deref(), Some("Real Name"));
    }

    #[test]
    fn ad_texts_dedupe_and_cap() {
        let fragment = "<p>Compre agora o melhor produto do mercado!</p>";
        let html = fragment.repeat(3);
        assert_eq!(ad_texts(&html).len(), 1);

        let many: String = (0..20)
            .map(|i| format!("<p>Fragmento de anúncio número {i} com texto longo</p>"))
            .collect();
        assert_eq!(ad_texts(&many).len(), MAX_AD_TEXTS);
    }

    #[test]
    fn short_fragments_are_ignored() {
        assert!(ad_texts("<p>too short</p>").is_empty());
    }

    #[test]
    fn labeled_impressions_and_reach() {
        let html = "<span>10,500 impressions</span><span>8.200 reach</span>";
        let fields = extract_fields(html);
        assert_eq!(fields.impressions, Some(10_500));
        assert_eq!(fields.reach, Some(8_200));
    }

    #[test]
    fn empty_page_is_structurally_empty() {
        let fields = extract_fields("<html><body></body></html>");
        assert!(fields.is_structurally_empty());
    }
}
