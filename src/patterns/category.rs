//! Category keyword/regex matchers for business-intelligence links
//!
//! Each category owns a small set of independent patterns. A link's score for
//! a category is the fraction of that category's patterns that match the
//! link's combined URL + anchor text, so one match out of five scores 0.2.

use crate::state::LinkCategory;
use regex::Regex;
use std::sync::LazyLock;

/// Patterns for one category
#[derive(Debug)]
pub struct CategoryPatterns {
    pub category: LinkCategory,
    patterns: Vec<Regex>,
}

impl CategoryPatterns {
    fn new(category: LinkCategory, sources: &[&str]) -> Self {
        let patterns = sources
            .iter()
            .map(|s| Regex::new(&format!("(?i){}", s)).unwrap())
            .collect();
        Self { category, patterns }
    }

    /// Fraction of this category's patterns that match `text`
    pub fn score(&self, text: &str) -> f64 {
        if self.patterns.is_empty() {
            return 0.0;
        }
        let matched = self.patterns.iter().filter(|p| p.is_match(text)).count();
        matched as f64 / self.patterns.len() as f64
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Per-category pattern scores, indexed in `LinkCategory::SCORED` order
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CategoryScores([f64; 10]);

impl CategoryScores {
    pub fn get(&self, category: LinkCategory) -> f64 {
        scored_index(category).map_or(0.0, |i| self.0[i])
    }

    pub fn add(&mut self, category: LinkCategory, bonus: f64) {
        if let Some(i) = scored_index(category) {
            self.0[i] += bonus;
        }
    }

    /// Scores as a slice in `LinkCategory::SCORED` order
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Iterates `(category, score)` pairs in `LinkCategory::SCORED` order
    pub fn iter(&self) -> impl Iterator<Item = (LinkCategory, f64)> + '_ {
        LinkCategory::SCORED.iter().copied().zip(self.0.iter().copied())
    }

    /// Highest-scoring category; earlier categories win ties
    pub fn best(&self) -> (LinkCategory, f64) {
        self.iter()
            .fold((LinkCategory::Unknown, f64::MIN), |best, cur| {
                if cur.1 > best.1 {
                    cur
                } else {
                    best
                }
            })
    }

    /// Highest-scoring category other than `Irrelevant`, if any scored above zero
    pub fn best_relevant(&self) -> Option<(LinkCategory, f64)> {
        self.iter()
            .filter(|(c, s)| *c != LinkCategory::Irrelevant && *s > 0.0)
            .fold(None, |best: Option<(LinkCategory, f64)>, cur| match best {
                Some(b) if b.1 >= cur.1 => Some(b),
                _ => Some(cur),
            })
    }
}

fn scored_index(category: LinkCategory) -> Option<usize> {
    LinkCategory::SCORED.iter().position(|c| *c == category)
}

/// The category pattern library
#[derive(Debug)]
pub struct PatternLibrary {
    categories: Vec<CategoryPatterns>,
}

static STANDARD: LazyLock<PatternLibrary> = LazyLock::new(PatternLibrary::build_standard);

impl PatternLibrary {
    /// Returns the shared built-in library
    pub fn standard() -> &'static PatternLibrary {
        &STANDARD
    }

    fn build_standard() -> Self {
        use LinkCategory::*;

        let categories = vec![
            CategoryPatterns::new(
                BusinessProfile,
                &[
                    r"\b(company|business|corporat\w*|enterprise|firm)\b",
                    r"about(-|_|\s)?us|\babout\b|\bprofile\b|\boverview\b",
                    r"\b(registry|directory|listings?)\b",
                    r"\b(leadership|management|team|executives?|board)\b",
                    r"\b(who(-|_|\s)we(-|_|\s)are|our(-|_|\s)story|history|mission)\b",
                ],
            ),
            CategoryPatterns::new(
                FinancialData,
                &[
                    r"\b(financials?|finance)\b",
                    r"\b(investors?|investor(-|_)relations|shareholders?)\b",
                    r"\b(annual|quarterly)(-|_|\s)?reports?\b|\b10-?[kq]\b",
                    r"\b(revenue|earnings|income|balance(-|_|\s)sheet)\b",
                    r"\b(stock|shares|dividends?|ipo)\b",
                ],
            ),
            CategoryPatterns::new(
                CompanyNews,
                &[
                    r"\bnews(room)?\b",
                    r"\bpress(-|_|\s)?(releases?|room)?\b",
                    r"\b(announcements?|announces?)\b",
                    r"\b(blog|articles?|stories)\b",
                    r"/20\d{2}/\d{1,2}/|\b(media|updates)\b",
                ],
            ),
            CategoryPatterns::new(
                RegulatoryFiling,
                &[
                    r"\b(filings?|filed)\b",
                    r"\b(sec|edgar)\b",
                    r"\b(regulat\w*|complian\w*)\b",
                    r"\bregistr(y|ation)\b",
                    r"\b(licen[cs]es?|permits?|disclosures?)\b",
                ],
            ),
            CategoryPatterns::new(
                ContactInfo,
                &[
                    r"\bcontact(-|_|\s)?(us)?\b",
                    r"^mailto:|\bemail\b",
                    r"^tel:|\b(phone|call)\b",
                    r"\b(locations?|offices?|headquarters|hq)\b",
                    r"\b(address|directions|find(-|_|\s)us)\b",
                ],
            ),
            CategoryPatterns::new(
                ProductService,
                &[
                    r"\b(products?|catalog(ue)?)\b",
                    r"\b(services?|solutions?|offerings?)\b",
                    r"\b(pricing|plans|features)\b",
                    r"\b(shop|store)\b",
                    r"\b(platform|software|industries)\b",
                ],
            ),
            CategoryPatterns::new(
                Partnership,
                &[
                    r"\bpartner(s|ship|ships)?\b",
                    r"\b(alliances?|affiliates?)\b",
                    r"\b(clients?|customers?)\b",
                    r"\b(resellers?|distributors?|suppliers?|vendors?)\b",
                    r"\b(integrations?|ecosystem)\b",
                ],
            ),
            CategoryPatterns::new(
                LegalDocument,
                &[
                    r"\b(legal|law)\b",
                    r"\bterms\b|\btos\b",
                    r"\b(privacy|gdpr)\b",
                    r"\b(contracts?|agreements?)\b",
                    r"\b(policy|policies|disclaimer)\b",
                ],
            ),
            CategoryPatterns::new(
                SocialMedia,
                &[
                    r"linkedin\.com",
                    r"(twitter|x)\.com/",
                    r"facebook\.com|instagram\.com",
                    r"youtube\.com|tiktok\.com",
                    r"\b(follow(-|_|\s)us|social)\b",
                ],
            ),
            CategoryPatterns::new(
                Irrelevant,
                &[
                    r"\b(log(-|_)?in|sign(-|_)?in|sign(-|_)?up|log(-|_)?out)\b",
                    r"\b(cart|checkout|basket|wishlist)\b",
                    r"\.(css|js|png|jpe?g|gif|svg|ico|woff2?|mp4|zip)(\?|#|$)",
                    r"^(javascript:|#)",
                    r"\b(cookies?|unsubscribe|print)\b|[?&](sort|page|sessionid)=",
                ],
            ),
        ];

        Self { categories }
    }

    /// Scores `text` against every category
    pub fn category_scores(&self, text: &str) -> CategoryScores {
        let mut scores = CategoryScores::default();
        for patterns in &self.categories {
            scores.add(patterns.category, patterns.score(text));
        }
        scores
    }

    /// Patterns for a single category, if it has any
    pub fn patterns_for(&self, category: LinkCategory) -> Option<&CategoryPatterns> {
        self.categories.iter().find(|p| p.category == category)
    }
}
