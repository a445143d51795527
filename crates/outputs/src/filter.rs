//! Per-output metric filter
//!
//! Compiled once from `FilterConfig` glob patterns. Selection rules
//! (`namepass`, `namedrop`, `tagpass`, `tagdrop`) decide whether a metric
//! reaches the output at all; modifier rules (`taginclude`, `tagexclude`)
//! rewrite the tag set of metrics that pass.

use contracts::{FilterConfig, Metric, Tags};
use glob::Pattern;

use crate::error::OutputError;

/// Value patterns for a single tag key
#[derive(Debug, Clone)]
struct TagPatterns {
    key: String,
    patterns: Vec<Pattern>,
}

impl TagPatterns {
    fn matches(&self, tags: &Tags) -> bool {
        tags.get(&self.key)
            .is_some_and(|value| matches_any(&self.patterns, value))
    }
}

/// Compiled filter
#[derive(Debug, Clone, Default)]
pub struct Filter {
    namepass: Vec<Pattern>,
    namedrop: Vec<Pattern>,
    tagpass: Vec<TagPatterns>,
    tagdrop: Vec<TagPatterns>,
    taginclude: Vec<Pattern>,
    tagexclude: Vec<Pattern>,
}

impl Filter {
    /// Compile the filter of output `output`
    ///
    /// # Errors
    /// Returns `OutputError::InvalidFilter` for the first pattern that does
    /// not compile.
    pub fn compile(output: &str, config: &FilterConfig) -> Result<Self, OutputError> {
        let compile_all = |patterns: &[String]| -> Result<Vec<Pattern>, OutputError> {
            patterns
                .iter()
                .map(|p| {
                    Pattern::new(p)
                        .map_err(|e| OutputError::invalid_filter(output, p, e.to_string()))
                })
                .collect()
        };

        let compile_tags = |rules: &std::collections::HashMap<String, Vec<String>>| {
            let mut compiled = rules
                .iter()
                .map(|(key, patterns)| {
                    Ok(TagPatterns {
                        key: key.clone(),
                        patterns: compile_all(patterns)?,
                    })
                })
                .collect::<Result<Vec<_>, OutputError>>()?;
            // Deterministic evaluation order
            compiled.sort_by(|a, b| a.key.cmp(&b.key));
            Ok::<_, OutputError>(compiled)
        };

        Ok(Self {
            namepass: compile_all(&config.namepass)?,
            namedrop: compile_all(&config.namedrop)?,
            tagpass: compile_tags(&config.tagpass)?,
            tagdrop: compile_tags(&config.tagdrop)?,
            taginclude: compile_all(&config.taginclude)?,
            tagexclude: compile_all(&config.tagexclude)?,
        })
    }

    /// True if any selection rule is configured
    pub fn is_active(&self) -> bool {
        !self.namepass.is_empty()
            || !self.namedrop.is_empty()
            || !self.tagpass.is_empty()
            || !self.tagdrop.is_empty()
    }

    /// Tag keys kept by the rewrite
    pub(crate) fn tag_include(&self) -> &[Pattern] {
        &self.taginclude
    }

    /// Tag keys removed by the rewrite
    pub(crate) fn tag_exclude(&self) -> &[Pattern] {
        &self.tagexclude
    }

    /// True if the tag set of passing metrics gets rewritten
    pub fn rewrites_tags(&self) -> bool {
        !self.tag_include().is_empty() || !self.tag_exclude().is_empty()
    }

    /// Apply the selection rules
    pub fn should_metric_pass(&self, metric: &Metric) -> bool {
        let name = metric.name();

        if !self.namepass.is_empty() && !matches_any(&self.namepass, name) {
            return false;
        }
        if matches_any(&self.namedrop, name) {
            return false;
        }

        let tags = metric.tags();
        if !self.tagpass.is_empty() && !self.tagpass.iter().any(|rule| rule.matches(tags)) {
            return false;
        }
        if self.tagdrop.iter().any(|rule| rule.matches(tags)) {
            return false;
        }

        true
    }

    /// Rewrite a tag set in place: include first, then exclude
    pub fn filter_tags(&self, tags: &mut Tags) {
        let include = self.tag_include();
        if !include.is_empty() {
            tags.retain(|key, _| matches_any(include, key));
        }
        let exclude = self.tag_exclude();
        if !exclude.is_empty() {
            tags.retain(|key, _| !matches_any(exclude, key));
        }
    }
}

fn matches_any(patterns: &[Pattern], value: &str) -> bool {
    patterns.iter().any(|p| p.matches(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use contracts::{FieldValue, Fields};
    use std::collections::HashMap;

    fn metric(name: &str, tags: &[(&str, &str)]) -> Metric {
        Metric::new(
            name,
            tags.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            Fields::from([("value".to_string(), FieldValue::Float(1.0))]),
            Utc::now(),
        )
        .unwrap()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_filter_is_inactive() {
        let filter = Filter::compile("out", &FilterConfig::default()).unwrap();
        assert!(!filter.is_active());
        assert!(!filter.rewrites_tags());
        assert!(filter.should_metric_pass(&metric("cpu", &[])));
    }

    #[test]
    fn test_namepass_and_namedrop() {
        let config = FilterConfig {
            namepass: strings(&["cpu*", "mem"]),
            namedrop: strings(&["cpu_guest*"]),
            ..Default::default()
        };
        let filter = Filter::compile("out", &config).unwrap();

        assert!(filter.is_active());
        assert!(filter.should_metric_pass(&metric("cpu_usage", &[])));
        assert!(filter.should_metric_pass(&metric("mem", &[])));
        assert!(!filter.should_metric_pass(&metric("disk", &[])));
        assert!(!filter.should_metric_pass(&metric("cpu_guest_nice", &[])));
    }

    #[test]
    fn test_tagpass_and_tagdrop() {
        let config = FilterConfig {
            tagpass: HashMap::from([("region".to_string(), strings(&["us-*"]))]),
            tagdrop: HashMap::from([("env".to_string(), strings(&["test"]))]),
            ..Default::default()
        };
        let filter = Filter::compile("out", &config).unwrap();

        assert!(filter.should_metric_pass(&metric("cpu", &[("region", "us-east")])));
        assert!(!filter.should_metric_pass(&metric("cpu", &[("region", "eu-west")])));
        // Missing tag cannot satisfy tagpass
        assert!(!filter.should_metric_pass(&metric("cpu", &[])));
        assert!(!filter.should_metric_pass(&metric(
            "cpu",
            &[("region", "us-east"), ("env", "test")]
        )));
    }

    #[test]
    fn test_filter_tags_exclude() {
        let config = FilterConfig {
            tagexclude: strings(&["host"]),
            ..Default::default()
        };
        let filter = Filter::compile("out", &config).unwrap();
        assert!(!filter.is_active());
        assert!(filter.rewrites_tags());

        let mut tags = metric("cpu", &[("host", "a"), ("region", "b")]).tags().clone();
        filter.filter_tags(&mut tags);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags.get("region").map(String::as_str), Some("b"));
    }

    #[test]
    fn test_filter_tags_include_then_exclude() {
        let config = FilterConfig {
            taginclude: strings(&["h*", "region"]),
            tagexclude: strings(&["hostname"]),
            ..Default::default()
        };
        let filter = Filter::compile("out", &config).unwrap();
        assert_eq!(filter.tag_include().len(), 2);
        assert!(filter.tag_include()[0].matches("hostname"));
        assert_eq!(filter.tag_exclude().len(), 1);

        let mut tags = metric(
            "cpu",
            &[("host", "a"), ("hostname", "x"), ("region", "b"), ("dc", "c")],
        )
        .tags()
        .clone();
        filter.filter_tags(&mut tags);

        let keys: Vec<&str> = tags.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["host", "region"]);
    }

    #[test]
    fn test_invalid_pattern() {
        let config = FilterConfig {
            namepass: strings(&["cpu[", "mem"]),
            ..Default::default()
        };
        let err = Filter::compile("influx", &config).unwrap_err();
        assert!(matches!(err, OutputError::InvalidFilter { .. }));
        assert!(err.to_string().contains("influx"));
    }
}
