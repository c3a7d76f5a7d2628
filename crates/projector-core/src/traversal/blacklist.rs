use super::{AnchorRole, AnchorSettings};
use std::collections::BTreeSet;

/// Relationship field names skipped for one anchor role
///
/// Always includes every role name, so an anchor never re-enters traversal
/// as a plain relation of another anchor. A field named like a role is
/// skipped even when it points to an unrelated class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blacklist(BTreeSet<String>);

impl Blacklist {
    pub fn for_role(settings: &AnchorSettings, role: AnchorRole) -> Self {
        let mut fields: BTreeSet<String> = AnchorRole::ALL
            .iter()
            .map(|r| r.as_str().to_string())
            .collect();
        fields.extend(settings.spec(role).blacklist.iter().cloned());
        Self(fields)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traversal::AnchorSpec;

    #[test]
    fn test_role_names_always_blacklisted() {
        let settings = AnchorSettings::default();

        let blacklist = Blacklist::for_role(&settings, AnchorRole::Study);

        assert!(blacklist.contains("study"));
        assert!(blacklist.contains("subject"));
        assert!(!blacklist.contains("groups"));
    }

    #[test]
    fn test_configured_fields_are_per_role() {
        let settings = AnchorSettings {
            study: AnchorSpec::new("Study").with_blacklist(["audit_log"]),
            subject: AnchorSpec::new("Subject").with_blacklist(["consents"]),
        };

        let study = Blacklist::for_role(&settings, AnchorRole::Study);
        let subject = Blacklist::for_role(&settings, AnchorRole::Subject);

        assert_eq!(
            study.iter().collect::<Vec<_>>(),
            vec!["audit_log", "study", "subject"]
        );
        assert!(!study.contains("consents"));
        assert!(subject.contains("consents"));
    }
}
