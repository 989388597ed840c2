//! # Citation Grammar Module
//!
//! Parses jurisdiction-specific legal citation strings into a structured
//! record plus canonical lookup forms. The German grammar is the primary
//! implementation; Swedish and Norwegian grammars are included as trivial
//! regex-driven examples proving the interface is not German-specific.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

/// Discriminator for which top-level citation shape matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationKind {
    Paragraph,
    Article,
}

/// Structured outcome of grammar parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCitation {
    #[serde(rename = "type")]
    pub kind: CitationKind,
    pub normalized: String,
    pub parsed: BTreeMap<String, String>,
    pub lookup_citations: Vec<String>,
}

/// A jurisdiction-specific citation grammar.
pub trait CitationGrammar: Send + Sync {
    fn parse(&self, input: &str) -> Option<ParsedCitation>;

    /// `format_citation` "short" style support: drop subdivision tail.
    fn short_form(&self, parsed: &ParsedCitation) -> Option<String>;
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// German `§`/`Art.` citation grammar, per spec §4.3.
pub struct GermanGrammar {
    paragraph_re: Regex,
    article_re: Regex,
}

fn tail_pattern() -> &'static str {
    r"(?:\s*(?:Abs\.?|Absatz)\s*(?P<abs>\d+[a-z]?))?(?:\s*(?:S\.?|Satz)\s*(?P<satz>\d+[a-z]?))?(?:\s*(?:Nr\.?|Nummer)\s*(?P<nr>\d+[a-z]?))?(?:\s*(?:Buchst\.?|Buchstabe)\s*(?P<buchst>[a-z]))?"
}

impl Default for GermanGrammar {
    fn default() -> Self {
        Self::new()
    }
}

impl GermanGrammar {
    pub fn new() -> Self {
        let section_spec = r"(?P<sections>\d+[a-z]?(?:\s*(?:,|-|bis)\s*\d+[a-z]?)*)";
        let paragraph_pattern = format!(
            r"^(?P<marker>§§?)\s*{sections}{tail}\s*(?P<code>[A-Za-zÄÖÜäöüß]+)$",
            sections = section_spec,
            tail = tail_pattern()
        );
        let article_pattern = format!(
            r"^(?:Art\.?|Artikel)\s*(?P<article>\d+[a-z]?){tail}\s*(?P<code>[A-Za-zÄÖÜäöüß]+)$",
            tail = tail_pattern()
        );

        Self {
            paragraph_re: Regex::new(&paragraph_pattern).expect("valid paragraph regex"),
            article_re: Regex::new(&article_pattern).expect("valid article regex"),
        }
    }

    fn build_tail(
        abs: Option<&str>,
        satz: Option<&str>,
        nr: Option<&str>,
        buchst: Option<&str>,
    ) -> (String, BTreeMap<String, String>) {
        let mut tail = String::new();
        let mut parsed = BTreeMap::new();
        if let Some(v) = abs {
            tail.push_str(&format!(" Abs. {v}"));
            parsed.insert("paragraph".to_string(), v.to_string());
        }
        if let Some(v) = satz {
            tail.push_str(&format!(" S. {v}"));
            parsed.insert("sentence".to_string(), v.to_string());
        }
        if let Some(v) = nr {
            tail.push_str(&format!(" Nr. {v}"));
            parsed.insert("number".to_string(), v.to_string());
        }
        if let Some(v) = buchst {
            let lower = v.to_lowercase();
            tail.push_str(&format!(" Buchst. {lower}"));
            parsed.insert("letter".to_string(), lower);
        }
        (tail, parsed)
    }
}

impl CitationGrammar for GermanGrammar {
    fn parse(&self, input: &str) -> Option<ParsedCitation> {
        let collapsed = collapse_whitespace(input.trim());
        if collapsed.is_empty() {
            return None;
        }

        if let Some(caps) = self.paragraph_re.captures(&collapsed) {
            let sections = caps.name("sections")?.as_str().trim();
            let code = caps.name("code")?.as_str().to_uppercase();
            let is_range = sections.contains(',') || sections.contains('-') || sections.contains("bis");
            let marker = if is_range { "§§" } else { "§" };

            let (tail, mut parsed) = Self::build_tail(
                caps.name("abs").map(|m| m.as_str()),
                caps.name("satz").map(|m| m.as_str()),
                caps.name("nr").map(|m| m.as_str()),
                caps.name("buchst").map(|m| m.as_str()),
            );
            parsed.insert("section".to_string(), sections.to_string());
            parsed.insert("code".to_string(), code.clone());
            parsed.insert("marker".to_string(), marker.to_string());

            let normalized = format!("{marker} {sections}{tail} {code}");
            let normalized = collapse_whitespace(&normalized);
            let lookup = collapse_whitespace(&format!("{marker} {sections} {code}")).to_lowercase();

            return Some(ParsedCitation {
                kind: CitationKind::Paragraph,
                normalized,
                parsed,
                lookup_citations: vec![lookup],
            });
        }

        if let Some(caps) = self.article_re.captures(&collapsed) {
            let article = caps.name("article")?.as_str();
            let code = caps.name("code")?.as_str().to_uppercase();
            let (tail, mut parsed) = Self::build_tail(
                caps.name("abs").map(|m| m.as_str()),
                caps.name("satz").map(|m| m.as_str()),
                caps.name("nr").map(|m| m.as_str()),
                caps.name("buchst").map(|m| m.as_str()),
            );
            parsed.insert("article".to_string(), article.to_string());
            parsed.insert("code".to_string(), code.clone());

            let normalized = format!("Art. {article}{tail} {code}");
            let normalized = collapse_whitespace(&normalized);
            let lookup = collapse_whitespace(&format!("Art. {article} {code}")).to_lowercase();

            return Some(ParsedCitation {
                kind: CitationKind::Article,
                normalized,
                parsed,
                lookup_citations: vec![lookup],
            });
        }

        None
    }

    fn short_form(&self, parsed: &ParsedCitation) -> Option<String> {
        let code = parsed.parsed.get("code")?;
        match parsed.kind {
            CitationKind::Paragraph => {
                let section = parsed.parsed.get("section")?;
                let marker = parsed.parsed.get("marker").map(String::as_str).unwrap_or("§");
                Some(format!("{marker} {section} {code}"))
            }
            CitationKind::Article => {
                let article = parsed.parsed.get("article")?;
                Some(format!("Art. {article} {code}"))
            }
        }
    }
}

/// Swedish `SFS YYYY:N` citation grammar (trivial example).
pub struct SwedishGrammar {
    re: Regex,
}

impl Default for SwedishGrammar {
    fn default() -> Self {
        Self {
            re: Regex::new(r"^SFS\s*(?P<year>\d{4}):(?P<num>\d+)$").expect("valid sfs regex"),
        }
    }
}

impl CitationGrammar for SwedishGrammar {
    fn parse(&self, input: &str) -> Option<ParsedCitation> {
        let collapsed = collapse_whitespace(input.trim()).to_uppercase();
        let caps = self.re.captures(&collapsed)?;
        let year = caps.name("year")?.as_str();
        let num = caps.name("num")?.as_str();
        let normalized = format!("SFS {year}:{num}");
        let mut parsed = BTreeMap::new();
        parsed.insert("year".to_string(), year.to_string());
        parsed.insert("number".to_string(), num.to_string());
        Some(ParsedCitation {
            kind: CitationKind::Paragraph,
            normalized: normalized.clone(),
            parsed,
            lookup_citations: vec![normalized.to_lowercase()],
        })
    }

    fn short_form(&self, parsed: &ParsedCitation) -> Option<String> {
        Some(parsed.normalized.clone())
    }
}

/// Norwegian `LOV-YYYY-MM-DD-N` citation grammar (trivial example).
pub struct NorwegianGrammar {
    re: Regex,
}

impl Default for NorwegianGrammar {
    fn default() -> Self {
        Self {
            re: Regex::new(
                r"^LOV-(?P<year>\d{4})-(?P<month>\d{2})-(?P<day>\d{2})-(?P<num>\d+)$",
            )
            .expect("valid lov regex"),
        }
    }
}

impl CitationGrammar for NorwegianGrammar {
    fn parse(&self, input: &str) -> Option<ParsedCitation> {
        let collapsed = collapse_whitespace(input.trim()).to_uppercase();
        let caps = self.re.captures(&collapsed)?;
        let year = caps.name("year")?.as_str();
        let month = caps.name("month")?.as_str();
        let day = caps.name("day")?.as_str();
        let num = caps.name("num")?.as_str();
        let normalized = format!("LOV-{year}-{month}-{day}-{num}");
        let mut parsed = BTreeMap::new();
        parsed.insert("year".to_string(), year.to_string());
        parsed.insert("month".to_string(), month.to_string());
        parsed.insert("day".to_string(), day.to_string());
        parsed.insert("number".to_string(), num.to_string());
        Some(ParsedCitation {
            kind: CitationKind::Paragraph,
            normalized: normalized.clone(),
            parsed,
            lookup_citations: vec![normalized.to_lowercase()],
        })
    }

    fn short_form(&self, parsed: &ParsedCitation) -> Option<String> {
        Some(parsed.normalized.clone())
    }
}

static GERMAN_GRAMMAR: OnceLock<GermanGrammar> = OnceLock::new();

pub fn german_grammar() -> &'static GermanGrammar {
    GERMAN_GRAMMAR.get_or_init(GermanGrammar::new)
}

/// NFC-normalizes and tokenizes a free-text query, used by the substring
/// search stage. Tokens shorter than 2 characters are dropped.
pub fn tokenize_for_substring(input: &str) -> Vec<String> {
    let normalized: String = input.nfc().collect();
    normalized
        .split_whitespace()
        .map(|t| t.to_lowercase())
        .filter(|t| t.chars().count() >= 2)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_paragraph_citation() {
        let g = GermanGrammar::new();
        let parsed = g.parse("§ 823 abs. 1 bgb").expect("should parse");
        assert_eq!(parsed.normalized, "§ 823 Abs. 1 BGB");
        assert_eq!(parsed.parsed.get("code").unwrap(), "BGB");
        assert_eq!(parsed.parsed.get("section").unwrap(), "823");
        assert_eq!(parsed.parsed.get("paragraph").unwrap(), "1");
    }

    #[test]
    fn parses_article_citation() {
        let g = GermanGrammar::new();
        let parsed = g.parse("Artikel 1 Absatz 1 GG").expect("should parse");
        assert_eq!(parsed.normalized, "Art. 1 Abs. 1 GG");
        assert_eq!(parsed.kind, CitationKind::Article);
    }

    #[test]
    fn range_uses_doubled_marker() {
        let g = GermanGrammar::new();
        let parsed = g.parse("§ 1 bis 3 BGB").expect("should parse");
        assert!(parsed.normalized.starts_with("§§"));

        let parsed2 = g.parse("§§ 1, 2 BGB").expect("should parse");
        assert!(parsed2.normalized.starts_with("§§"));
    }

    #[test]
    fn single_section_uses_single_marker() {
        let g = GermanGrammar::new();
        let parsed = g.parse("§ 1 BGB").expect("should parse");
        assert!(parsed.normalized.starts_with("§ "));
        assert!(!parsed.normalized.starts_with("§§"));
    }

    #[test]
    fn unsupported_input_returns_none() {
        let g = GermanGrammar::new();
        assert!(g.parse("not a citation").is_none());
        assert!(g.parse("").is_none());
    }

    #[test]
    fn short_form_drops_subdivision_tail() {
        let g = GermanGrammar::new();
        let parsed = g.parse("§ 1 Absatz 1 bdsg").expect("should parse");
        assert_eq!(g.short_form(&parsed).unwrap(), "§ 1 BDSG");
    }

    #[test]
    fn short_form_article_preserves_period() {
        let g = GermanGrammar::new();
        let parsed = g.parse("Art. 1 GG").expect("should parse");
        assert_eq!(g.short_form(&parsed).unwrap(), "Art. 1 GG");
    }

    #[test]
    fn idempotence_of_normalization() {
        let g = GermanGrammar::new();
        let parsed = g.parse("§ 1 Abs. 2 BGB").expect("first parse");
        let reparsed = g.parse(&parsed.normalized).expect("second parse");
        assert_eq!(parsed, reparsed);
    }

    #[test]
    fn swedish_grammar_parses_sfs_form() {
        let g = SwedishGrammar::default();
        let parsed = g.parse("sfs 2018:218").expect("should parse");
        assert_eq!(parsed.normalized, "SFS 2018:218");
    }

    #[test]
    fn norwegian_grammar_parses_lov_form() {
        let g = NorwegianGrammar::default();
        let parsed = g.parse("lov-2018-06-15-38").expect("should parse");
        assert_eq!(parsed.normalized, "LOV-2018-06-15-38");
    }

    #[test]
    fn tokenize_drops_short_tokens() {
        let tokens = tokenize_for_substring("a BDSG datenschutz");
        assert_eq!(tokens, vec!["bdsg".to_string(), "datenschutz".to_string()]);
    }
}
