use std::collections::BTreeSet;

/// Topic vocabulary: each tag owns the phrases that admit it.
pub const TOPIC_VOCABULARY: &[(&str, &[&str])] = &[
    (
        "GST",
        &[
            "gst",
            "gstr",
            "gstin",
            "e-invoice",
            "einvoice",
            "irn",
            "e-way bill",
            "eway bill",
            "ewaybill",
            "input tax credit",
            "itc",
            "reverse charge",
        ],
    ),
    (
        "IncomeTax",
        &[
            "income tax",
            "itr",
            "return filing",
            "tax refund",
            "income tax return",
            "advance tax",
            "tds refund",
            "26as",
            "form 16",
        ],
    ),
    (
        "TDS/TCS",
        &[
            "tds",
            "tcs",
            "traces",
            "form 26q",
            "form 27q",
            "tds return",
            "tcs return",
            "tds certificate",
            "tds deduction",
        ],
    ),
    (
        "PF/ESI/PT",
        &[
            "pf",
            "epfo",
            "esic",
            "esi",
            "provident fund",
            "employee state insurance",
            "pt",
            "professional tax",
            "uan",
            "pf return",
        ],
    ),
    (
        "MCA/ROC",
        &[
            "mca",
            "roc",
            "ministry of corporate affairs",
            "annual filing",
            "form aoc",
            "form mgt",
            "dir-3",
            "company filing",
            "roc filing",
        ],
    ),
    (
        "Registration",
        &[
            "registration",
            "tan",
            "pan",
            "din",
            "dsc",
            "digital signature",
            "udyam",
            "msme registration",
            "shop act",
        ],
    ),
];

/// Pain vocabulary: friction and negative-sentiment indicators.
pub const PAIN_VOCABULARY: &[(&str, &[&str])] = &[
    (
        "PortalIssues",
        &[
            "portal down",
            "portal not working",
            "website down",
            "server error",
            "login issue",
            "login failed",
            "otp not received",
            "otp issue",
            "captcha",
            "session timeout",
            "site not working",
            "technical issue",
            "system error",
            "portal error",
            "dsc error",
            "token error",
            "authentication failed",
            "unable to login",
            "cant login",
            "can't login",
            "portal slow",
            "loading error",
        ],
    ),
    (
        "Deadlines",
        &[
            "due date",
            "deadline",
            "last date",
            "penalty",
            "late fee",
            "fine",
            "interest",
            "delayed",
            "extension",
            "missed deadline",
            "overdue",
            "filing date",
            "expiring",
            "expires",
            "urgent",
        ],
    ),
    (
        "Negative",
        &[
            "error",
            "failed",
            "failure",
            "issue",
            "problem",
            "bug",
            "glitch",
            "annoyed",
            "frustrated",
            "angry",
            "terrible",
            "horrible",
            "worst",
            "useless",
            "pathetic",
            "complicated",
            "confusing",
            "difficult",
            "stuck",
            "cant",
            "can't",
            "unable",
            "not working",
            "broken",
            "rejected",
            "delay",
            "delayed",
            "waiting",
            "still waiting",
        ],
    ),
];

/// Heuristic cutoffs for the relevance gate. `min_tags` of 1 means any
/// single vocabulary hit admits a post; raising it trades recall for
/// precision and is a product decision, not a code default.
#[derive(Debug, Clone)]
pub struct TaggerConfig {
    pub min_tags: usize,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self { min_tags: 1 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Tagger {
    config: TaggerConfig,
}

impl Tagger {
    pub fn new(config: TaggerConfig) -> Self {
        Self { config }
    }

    /// Tag content against both vocabularies. Matching is case-insensitive
    /// substring containment, not word-boundary aware: a phrase occurring
    /// inside a larger word still matches. Returns a lexicographically
    /// sorted, duplicate-free sequence.
    pub fn tag_content(&self, title: &str, text: &str) -> Vec<String> {
        let normalized = normalize_text(&format!("{} {}", title, text));

        let mut tags = BTreeSet::new();
        for (tag, keywords) in TOPIC_VOCABULARY.iter().chain(PAIN_VOCABULARY.iter()) {
            if keywords.iter().any(|keyword| normalized.contains(keyword)) {
                tags.insert((*tag).to_string());
            }
        }

        tags.into_iter().collect()
    }

    /// Sole admission filter before storage: content qualifies when its tag
    /// count reaches the configured minimum.
    pub fn is_relevant(&self, title: &str, text: &str) -> bool {
        self.tag_content(title, text).len() >= self.config.min_tags
    }
}

/// Lowercase and collapse runs of whitespace to single spaces.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Comma-delimited search spec, OR semantics. An empty spec matches
/// everything (no filter applied).
pub fn has_tag(tags: &[String], search_tags: &str) -> bool {
    if search_tags.trim().is_empty() {
        return true;
    }

    search_tags
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .any(|search| tags.iter().any(|tag| tag == search))
}

pub fn is_pain_tag(tag: &str) -> bool {
    PAIN_VOCABULARY.iter().any(|(pain, _)| *pain == tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_content_is_deterministic_and_sorted() {
        let tagger = Tagger::default();

        let first = tagger.tag_content("GST portal down, TDS refund delayed", "");
        let second = tagger.tag_content("GST portal down, TDS refund delayed", "");

        assert_eq!(first, second);
        let mut sorted = first.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(first, sorted);
    }

    #[test]
    fn test_gst_portal_scenario() {
        let tagger = Tagger::default();

        let tags = tagger.tag_content("GST portal down, unable to login", "");
        assert!(tags.iter().any(|t| t == "GST"));
        assert!(tags.iter().any(|t| is_pain_tag(t)));
        assert!(tagger.is_relevant("GST portal down, unable to login", ""));
    }

    #[test]
    fn test_is_relevant_matches_nonempty_tags() {
        let tagger = Tagger::default();

        for (title, text) in [
            ("GST portal down", ""),
            ("my cat likes naps", "nothing regulatory here"),
            ("", "itr refund still waiting"),
        ] {
            let tags = tagger.tag_content(title, text);
            assert_eq!(tagger.is_relevant(title, text), !tags.is_empty());
        }
    }

    #[test]
    fn test_min_tags_threshold() {
        let tagger = Tagger::new(TaggerConfig { min_tags: 2 });

        // Single topic hit, no pain indicator
        assert!(!tagger.is_relevant("gstin number query", ""));
        // Topic plus pain indicator
        assert!(tagger.is_relevant("gstin portal down", ""));
    }

    #[test]
    fn test_substring_matching_is_not_word_bounded() {
        let tagger = Tagger::default();

        // "pt" occurs inside "receipt"; the accepted false-positive tradeoff
        let tags = tagger.tag_content("lost my receipt", "");
        assert!(tags.iter().any(|t| t == "PF/ESI/PT"));
    }

    #[test]
    fn test_normalize_text_collapses_whitespace() {
        assert_eq!(normalize_text("  GST \t portal\n\ndown "), "gst portal down");
    }

    #[test]
    fn test_has_tag_or_semantics() {
        let tags = vec!["GST".to_string(), "Negative".to_string()];

        assert!(has_tag(&tags, "GST"));
        assert!(has_tag(&tags, "IncomeTax, Negative"));
        assert!(has_tag(&tags, " GST , IncomeTax "));
        assert!(!has_tag(&tags, "IncomeTax, Deadlines"));
        assert!(has_tag(&tags, ""));
        assert!(has_tag(&tags, "   "));
    }

    #[test]
    fn test_is_pain_tag() {
        assert!(is_pain_tag("PortalIssues"));
        assert!(is_pain_tag("Deadlines"));
        assert!(is_pain_tag("Negative"));
        assert!(!is_pain_tag("GST"));
        assert!(!is_pain_tag("portalissues"));
    }
}
