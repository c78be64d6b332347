use radar_core::UrlTagRules;
use std::collections::BTreeSet;

/// Per-feed post-processing on top of the shared tagger's output: append
/// the provenance tag, then at most one document-type tag chosen by ordered
/// first-match over the lowercased link. The result is deduplicated and
/// re-sorted.
pub fn apply_url_tag_rules(rules: &UrlTagRules, url: &str, mut tags: Vec<String>) -> Vec<String> {
    tags.push(rules.provenance.clone());

    let link = url.to_lowercase();
    for rule in &rules.rules {
        if rule.patterns.iter().any(|pattern| link.contains(pattern)) {
            tags.push(rule.tag.clone());
            break;
        }
    }

    let deduped: BTreeSet<String> = tags.into_iter().collect();
    deduped.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use radar_core::sebi_tag_rules;

    #[test]
    fn test_provenance_is_always_appended() {
        let tags = apply_url_tag_rules(
            &sebi_tag_rules(),
            "https://www.sebi.gov.in/reports/annual.html",
            vec!["Deadlines".to_string()],
        );
        assert_eq!(tags, vec!["Deadlines".to_string(), "SEBI".to_string()]);
    }

    #[test]
    fn test_first_matching_rule_wins() {
        // Matches both the Order and Enforcement patterns; the Order rule
        // comes first in the list
        let tags = apply_url_tag_rules(
            &sebi_tag_rules(),
            "https://www.sebi.gov.in/enforcement/orders/jan-2024/x.html",
            vec![],
        );
        assert_eq!(tags, vec!["Order".to_string(), "SEBI".to_string()]);
    }

    #[test]
    fn test_document_type_from_path() {
        let tags = apply_url_tag_rules(
            &sebi_tag_rules(),
            "https://www.sebi.gov.in/legal/circulars/jan-2024/disclosure.html",
            vec!["Negative".to_string()],
        );
        assert_eq!(
            tags,
            vec![
                "Circular".to_string(),
                "Negative".to_string(),
                "SEBI".to_string()
            ]
        );
    }

    #[test]
    fn test_result_is_deduplicated() {
        let tags = apply_url_tag_rules(
            &sebi_tag_rules(),
            "https://www.sebi.gov.in/reports/annual.html",
            vec!["SEBI".to_string()],
        );
        assert_eq!(tags, vec!["SEBI".to_string()]);
    }

    #[test]
    fn test_matching_is_case_insensitive_on_the_link() {
        let tags = apply_url_tag_rules(
            &sebi_tag_rules(),
            "https://www.sebi.gov.in/Legal/Circulars/jan-2024/x.html",
            vec![],
        );
        assert_eq!(tags, vec!["Circular".to_string(), "SEBI".to_string()]);
    }
}
