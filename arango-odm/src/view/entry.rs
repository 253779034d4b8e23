use std::fmt::Debug;

use crate::errors::{ErrorKind, OdmError, OdmResult};
use crate::mapping::{ArangoSearchPropertiesOptions, CollectionLink, ConsolidateThreshold};

/// How conflicting view-level settings of different contributing types are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewConflictPolicy {
    /// A contribution setting a different value for an already set option
    /// is rejected with a `ConfigurationError`.
    #[default]
    Reject,
    /// The value of the first contribution that set an option is kept and
    /// the conflict is logged.
    FirstRegisteredWins,
}

/// The merged configuration of one search view.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedViewConfig {
    view_name: String,
    contributing_types: Vec<String>,
    options: ArangoSearchPropertiesOptions,
}

impl AggregatedViewConfig {
    pub fn view_name(&self) -> &str {
        &self.view_name
    }

    /// Contributing types in order of first registration.
    pub fn contributing_types(&self) -> &[String] {
        &self.contributing_types
    }

    /// The merged view properties, ready to create or update the view with.
    pub fn options(&self) -> &ArangoSearchPropertiesOptions {
        &self.options
    }

    pub fn links(&self) -> &[CollectionLink] {
        &self.options.links
    }

    pub fn into_options(self) -> ArangoSearchPropertiesOptions {
        self.options
    }
}

/// The registration state of one view name.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRegistryEntry {
    view_name: String,
    contributing_types: Vec<String>,
    options: ArangoSearchPropertiesOptions,
}

impl ViewRegistryEntry {
    pub fn new(view_name: &str) -> Self {
        ViewRegistryEntry {
            view_name: view_name.to_string(),
            contributing_types: Vec::new(),
            options: ArangoSearchPropertiesOptions::new(),
        }
    }

    pub fn view_name(&self) -> &str {
        &self.view_name
    }

    pub fn contributing_types(&self) -> &[String] {
        &self.contributing_types
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.contributing_types.iter().any(|t| t == type_name)
    }

    pub fn config(&self) -> AggregatedViewConfig {
        AggregatedViewConfig {
            view_name: self.view_name.clone(),
            contributing_types: self.contributing_types.clone(),
            options: self.options.clone(),
        }
    }

    /// Removes the link to `collection`; returns `true` if there was one.
    pub fn remove_link(&mut self, collection: &str) -> bool {
        let before = self.options.links.len();
        self.options.links.retain(|link| link.name != collection);
        self.options.links.len() != before
    }

    /// Returns the entry with the contribution of `type_name` merged in.
    ///
    /// The entry itself is left untouched, so a rejected contribution
    /// leaves no trace.
    pub fn merged(
        &self,
        type_name: &str,
        contribution: &ArangoSearchPropertiesOptions,
        policy: ViewConflictPolicy,
    ) -> OdmResult<ViewRegistryEntry> {
        let mut next = self.clone();
        let merger = ScalarMerger {
            view_name: &self.view_name,
            type_name,
            policy,
        };

        merger.merge("locale", &mut next.options.locale, &contribution.locale)?;
        merger.merge(
            "commitIntervalMsec",
            &mut next.options.commit_interval_msec,
            &contribution.commit_interval_msec,
        )?;
        merger.merge(
            "cleanupIntervalStep",
            &mut next.options.cleanup_interval_step,
            &contribution.cleanup_interval_step,
        )?;

        for threshold in &contribution.thresholds {
            match next
                .options
                .thresholds
                .iter_mut()
                .find(|existing| existing.kind == threshold.kind)
            {
                Some(existing) => merge_threshold(&merger, existing, threshold)?,
                None => next.options.thresholds.push(threshold.clone()),
            }
        }

        for link in &contribution.links {
            match next.options.links.iter_mut().find(|existing| existing.name == link.name) {
                Some(existing) => {
                    let added = existing.merge_fields(link);
                    log::debug!(
                        "Merged {} field(s) of {} into link {} of view {}",
                        added,
                        type_name,
                        link.name,
                        self.view_name
                    );
                }
                None => next.options.links.push(link.clone()),
            }
        }

        if !next.contains(type_name) {
            next.contributing_types.push(type_name.to_string());
        }
        Ok(next)
    }
}

fn merge_threshold(
    merger: &ScalarMerger<'_>,
    existing: &mut ConsolidateThreshold,
    contribution: &ConsolidateThreshold,
) -> OdmResult<()> {
    let kind = format!("{:?}", existing.kind);
    merger.merge(
        &format!("{} threshold", kind),
        &mut existing.threshold,
        &contribution.threshold,
    )?;
    merger.merge(
        &format!("{} segment threshold", kind),
        &mut existing.segment_threshold,
        &contribution.segment_threshold,
    )
}

struct ScalarMerger<'a> {
    view_name: &'a str,
    type_name: &'a str,
    policy: ViewConflictPolicy,
}

impl ScalarMerger<'_> {
    /// Unset options take the contributed value, equal values are kept and
    /// differing values are handled according to the conflict policy.
    fn merge<V: PartialEq + Clone + Debug>(
        &self,
        option: &str,
        current: &mut Option<V>,
        contributed: &Option<V>,
    ) -> OdmResult<()> {
        let Some(value) = contributed else {
            return Ok(());
        };
        match current {
            None => {
                *current = Some(value.clone());
                Ok(())
            }
            Some(existing) if existing == value => Ok(()),
            Some(existing) => match self.policy {
                ViewConflictPolicy::Reject => {
                    log::error!(
                        "{} sets {} of view {} to {:?}, but it is already {:?}",
                        self.type_name,
                        option,
                        self.view_name,
                        value,
                        existing
                    );
                    Err(OdmError::new(
                        &format!(
                            "Conflicting {} for view '{}': {} declares {:?}, already set to {:?}",
                            option, self.view_name, self.type_name, value, existing
                        ),
                        ErrorKind::ConfigurationError,
                    ))
                }
                ViewConflictPolicy::FirstRegisteredWins => {
                    log::warn!(
                        "Ignoring {} = {:?} of {} for view {}, keeping {:?}",
                        option,
                        value,
                        self.type_name,
                        self.view_name,
                        existing
                    );
                    Ok(())
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{ConsolidateType, FieldLink};

    fn contribution(collection: &str, field: &str) -> ArangoSearchPropertiesOptions {
        ArangoSearchPropertiesOptions::new()
            .link(CollectionLink::on(collection).field(FieldLink::on(field)))
    }

    #[test]
    fn test_distinct_collections_get_distinct_links() {
        let entry = ViewRegistryEntry::new("sharedView")
            .merged("A", &contribution("a", "value"), ViewConflictPolicy::Reject)
            .unwrap()
            .merged("B", &contribution("b", "value"), ViewConflictPolicy::Reject)
            .unwrap();
        let config = entry.config();
        assert_eq!(config.links().len(), 2);
        assert_eq!(config.links()[0].name, "a");
        assert_eq!(config.links()[1].fields[0].name, "value");
        assert_eq!(config.contributing_types(), &["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_same_collection_merges_fields() {
        let entry = ViewRegistryEntry::new("v")
            .merged("Sub", &contribution("c", "value"), ViewConflictPolicy::Reject)
            .unwrap()
            .merged("Other", &contribution("c", "name"), ViewConflictPolicy::Reject)
            .unwrap();
        let links = entry.config().into_options().links;
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].fields.len(), 2);
    }

    #[test]
    fn test_remove_link() {
        let mut entry = ViewRegistryEntry::new("v")
            .merged("A", &contribution("a", "value"), ViewConflictPolicy::Reject)
            .unwrap()
            .merged("B", &contribution("b", "value"), ViewConflictPolicy::Reject)
            .unwrap();
        assert!(entry.remove_link("a"));
        assert!(!entry.remove_link("a"));
        assert_eq!(entry.config().links().len(), 1);
        assert_eq!(entry.config().links()[0].name, "b");
        assert!(entry.contains("A"));
    }

    #[test]
    fn test_reregistration_is_idempotent() {
        let first = ViewRegistryEntry::new("v")
            .merged("A", &contribution("a", "value"), ViewConflictPolicy::Reject)
            .unwrap();
        let second = first
            .merged("A", &contribution("a", "value"), ViewConflictPolicy::Reject)
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unset_options_do_not_overwrite() {
        let entry = ViewRegistryEntry::new("v")
            .merged(
                "A",
                &ArangoSearchPropertiesOptions::new().commit_interval_msec(65000),
                ViewConflictPolicy::Reject,
            )
            .unwrap()
            .merged("B", &ArangoSearchPropertiesOptions::new(), ViewConflictPolicy::Reject)
            .unwrap();
        assert_eq!(entry.config().options().commit_interval_msec, Some(65000));
    }

    #[test]
    fn test_conflicting_scalar_is_rejected() {
        let entry = ViewRegistryEntry::new("v")
            .merged(
                "A",
                &ArangoSearchPropertiesOptions::new().commit_interval_msec(1000),
                ViewConflictPolicy::Reject,
            )
            .unwrap();
        let err = entry
            .merged(
                "B",
                &ArangoSearchPropertiesOptions::new().commit_interval_msec(2000),
                ViewConflictPolicy::Reject,
            )
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ConfigurationError);
        assert!(err.message().contains("commitIntervalMsec"));
        assert!(!entry.contains("B"));
    }

    #[test]
    fn test_first_registered_wins_keeps_first_value() {
        let policy = ViewConflictPolicy::FirstRegisteredWins;
        let entry = ViewRegistryEntry::new("v")
            .merged(
                "A",
                &ArangoSearchPropertiesOptions::new()
                    .with_threshold(ConsolidateThreshold::of(ConsolidateType::Count).threshold(1.0)),
                policy,
            )
            .unwrap()
            .merged(
                "B",
                &ArangoSearchPropertiesOptions::new().with_threshold(
                    ConsolidateThreshold::of(ConsolidateType::Count)
                        .threshold(2.0)
                        .segment_threshold(10),
                ),
                policy,
            )
            .unwrap();
        let options = entry.config().into_options();
        let count = options.threshold_of(ConsolidateType::Count).unwrap();
        assert_eq!(count.threshold, Some(1.0));
        // the segment threshold was unset, so it is taken from B
        assert_eq!(count.segment_threshold, Some(10));
    }
}
