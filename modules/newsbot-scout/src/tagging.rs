use newsbot_common::config::TagRuleConfig;

/// Keyword → label rules applied to the translated body.
#[derive(Debug, Clone, Default)]
pub struct TagRules {
    rules: Vec<TagRule>,
}

#[derive(Debug, Clone)]
struct TagRule {
    keywords: Vec<String>,
    label: String,
}

impl TagRules {
    pub fn from_config(rules: &[TagRuleConfig]) -> Self {
        Self {
            rules: rules
                .iter()
                .map(|r| TagRule {
                    keywords: r.keywords.iter().map(|k| k.to_lowercase()).collect(),
                    label: r.label.clone(),
                })
                .collect(),
        }
    }

    /// Labels whose keywords occur in `body` (case-insensitive substring, any
    /// keyword), in rule order, followed by the source label. Joined by two spaces.
    pub fn tags_for(&self, body: &str, source_label: Option<&str>) -> String {
        let lower = body.to_lowercase();
        let mut tags: Vec<&str> = self
            .rules
            .iter()
            .filter(|rule| rule.keywords.iter().any(|k| lower.contains(k.as_str())))
            .map(|rule| rule.label.as_str())
            .collect();
        if let Some(label) = source_label.filter(|l| !l.is_empty()) {
            tags.push(label);
        }
        tags.join("  ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> TagRules {
        TagRules::from_config(&[
            TagRuleConfig {
                keywords: vec!["гидрометеоролог".into(), "метеоцентр".into()],
                label: "#Погода".into(),
            },
            TagRuleConfig {
                keywords: vec!["электричеств".into()],
                label: "#Электричество".into(),
            },
        ])
    }

    #[test]
    fn each_keyword_is_tested_independently() {
        let tags = rules().tags_for("По данным Метеоцентра завтра дождь.", Some("#CDM"));
        assert_eq!(tags, "#Погода  #CDM");
    }

    #[test]
    fn no_keyword_match_leaves_only_source() {
        assert_eq!(rules().tags_for("Скупштина заседает.", Some("#GOV")), "#GOV");
    }

    #[test]
    fn multiple_rules_keep_order() {
        let tags = rules().tags_for("Без ЭЛЕКТРИЧЕСТВА, говорит гидрометеоролог", None);
        assert_eq!(tags, "#Погода  #Электричество");
    }

    #[test]
    fn nothing_matches() {
        assert_eq!(rules().tags_for("текст", None), "");
    }
}
