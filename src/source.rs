//! Read access to care record snapshots.

use log::info;
use serde::Deserialize;
use std::path::Path;

use crate::dispatcher::{GuideInputs, GuideType};
use crate::error::{GuideError, Result};
use crate::record::{Child, ChildCareRecord, FamilyCareRecord};

/// Read accessor over stored snapshots. Implementations only hand out
/// records; they never feed anything back.
pub trait CareRecordSource {
    fn children(&self) -> &[Child];

    fn child_records(&self) -> &[ChildCareRecord];

    fn family_record(&self) -> Option<&FamilyCareRecord>;

    fn child(&self, child_id: &str) -> Result<&Child> {
        self.children()
            .iter()
            .find(|child| child.id == child_id)
            .ok_or_else(|| GuideError::RecordNotFound {
                kind: "child",
                id: child_id.to_string(),
            })
    }

    fn child_record(&self, child_id: &str) -> Option<&ChildCareRecord> {
        self.child_records()
            .iter()
            .find(|record| record.child_id == child_id)
    }

    /// Collects the snapshots a guide type needs. Lookups that name a
    /// specific child fail with `RecordNotFound`; anything else missing is
    /// left for the generator to report.
    fn inputs_for(&self, guide_type: GuideType, child_id: Option<&str>) -> Result<GuideInputs<'_>> {
        match guide_type {
            GuideType::Child => {
                let child = match child_id {
                    Some(id) => Some(self.child(id)?),
                    None => match self.children() {
                        [only] => Some(only),
                        _ => None,
                    },
                };
                let child_record = match child {
                    Some(child) => Some(self.child_record(&child.id).ok_or_else(|| {
                        GuideError::RecordNotFound {
                            kind: "child care record",
                            id: child.id.clone(),
                        }
                    })?),
                    None => None,
                };
                Ok(GuideInputs {
                    child,
                    child_record,
                    ..GuideInputs::default()
                })
            }
            GuideType::Family => Ok(GuideInputs {
                family_record: self.family_record(),
                ..GuideInputs::default()
            }),
            GuideType::Babysitter | GuideType::School | GuideType::Grandparent => Ok(GuideInputs {
                children: Some(self.children()),
                child_records: Some(self.child_records()),
                family_record: self.family_record(),
                ..GuideInputs::default()
            }),
        }
    }
}

/// A file holding one family's snapshots, as exported by the app.
#[derive(Debug, Default, Deserialize)]
pub struct GuideBundle {
    #[serde(default)]
    pub children: Vec<Child>,
    #[serde(default)]
    pub child_records: Vec<ChildCareRecord>,
    #[serde(default)]
    pub family_record: Option<FamilyCareRecord>,
}

impl GuideBundle {
    /// Loads a bundle from JSON, or from YAML when the file ends in
    /// `.yaml`/`.yml`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
        let bundle: GuideBundle = if is_yaml {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };
        info!(
            "Loaded {} children and {} child records from {:?}",
            bundle.children.len(),
            bundle.child_records.len(),
            path
        );
        Ok(bundle)
    }
}

impl CareRecordSource for GuideBundle {
    fn children(&self) -> &[Child] {
        &self.children
    }

    fn child_records(&self) -> &[ChildCareRecord] {
        &self.child_records
    }

    fn family_record(&self) -> Option<&FamilyCareRecord> {
        self.family_record.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::HealthKey;
    use std::fs;
    use tempfile::tempdir;

    const BUNDLE_JSON: &str = r#"{
        "children": [
            {"id": "kid-1", "name": "Sam", "birthdate": "2024-01-02"},
            {"id": "kid-2", "name": "Alex"}
        ],
        "child_records": [
            {"id": "rec-1", "child_id": "kid-1", "health": {"allergies": ["peanuts"]}}
        ],
        "family_record": {"id": "fam-1"}
    }"#;

    #[test]
    fn test_load_json_bundle() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bundle.json");
        fs::write(&path, BUNDLE_JSON).unwrap();

        let bundle = GuideBundle::load(&path).unwrap();
        assert_eq!(bundle.children.len(), 2);
        assert_eq!(bundle.child("kid-1").unwrap().name, "Sam");
        assert!(bundle.child_record("kid-2").is_none());
        assert!(matches!(
            bundle.child("kid-9"),
            Err(GuideError::RecordNotFound { kind: "child", .. })
        ));
    }

    #[test]
    fn test_load_yaml_bundle() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bundle.yml");
        fs::write(
            &path,
            "children:\n  - id: kid-1\n    name: Sam\nchild_records:\n  - id: rec-1\n    child_id: kid-1\n    health_redacted_fields: [allergies]\n",
        )
        .unwrap();

        let bundle = GuideBundle::load(&path).unwrap();
        let record = bundle.child_record("kid-1").unwrap();
        assert!(record.health.redacted.contains(HealthKey::Allergies));
        assert!(bundle.family_record().is_none());
    }

    #[test]
    fn test_inputs_for_child_surfaces_missing_record() {
        let bundle: GuideBundle = serde_json::from_str(BUNDLE_JSON).unwrap();
        let inputs = bundle.inputs_for(GuideType::Child, Some("kid-1")).unwrap();
        assert_eq!(inputs.child_record.map(|r| r.id.as_str()), Some("rec-1"));

        let err = bundle.inputs_for(GuideType::Child, Some("kid-2")).unwrap_err();
        assert!(matches!(
            err,
            GuideError::RecordNotFound {
                kind: "child care record",
                ..
            }
        ));
    }

    #[test]
    fn test_inputs_for_pack_borrows_everything() {
        let bundle: GuideBundle = serde_json::from_str(BUNDLE_JSON).unwrap();
        let inputs = bundle.inputs_for(GuideType::Babysitter, None).unwrap();
        assert_eq!(inputs.children.map(<[Child]>::len), Some(2));
        assert_eq!(inputs.child_records.map(<[ChildCareRecord]>::len), Some(1));
        assert!(inputs.family_record.is_some());
        assert!(inputs.child.is_none());
    }
}
