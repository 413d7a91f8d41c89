use chrono::{DateTime, Utc};
use log::{debug, info};
use std::fmt;
use std::str::FromStr;

use crate::builders::{child_guide, family_guide};
use crate::composer::{compose, Audience};
use crate::config::GuideConfig;
use crate::engine::TemplateEngine;
use crate::error::{GuideError, Result};
use crate::record::{Child, ChildCareRecord, FamilyCareRecord};
use crate::section::GuideContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuideType {
    Child,
    Family,
    Babysitter,
    School,
    Grandparent,
}

impl GuideType {
    pub const ALL: [GuideType; 5] = [
        Self::Child,
        Self::Family,
        Self::Babysitter,
        Self::School,
        Self::Grandparent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Child => "child",
            Self::Family => "family",
            Self::Babysitter => "babysitter",
            Self::School => "school",
            Self::Grandparent => "grandparent",
        }
    }
}

impl fmt::Display for GuideType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GuideType {
    type Err = GuideError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|guide_type| guide_type.as_str() == name)
            .ok_or_else(|| GuideError::UnknownGuideType(s.to_string()))
    }
}

/// Borrowed record snapshots handed to [`GuideGenerator::generate`]. Which
/// of them are required depends on the guide type.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuideInputs<'a> {
    pub child: Option<&'a Child>,
    pub children: Option<&'a [Child]>,
    pub child_record: Option<&'a ChildCareRecord>,
    pub child_records: Option<&'a [ChildCareRecord]>,
    pub family_record: Option<&'a FamilyCareRecord>,
}

impl<'a> GuideInputs<'a> {
    pub fn for_child(child: &'a Child, record: &'a ChildCareRecord) -> Self {
        Self {
            child: Some(child),
            child_record: Some(record),
            ..Self::default()
        }
    }

    pub fn for_family(record: &'a FamilyCareRecord) -> Self {
        Self {
            family_record: Some(record),
            ..Self::default()
        }
    }

    pub fn for_audience(
        children: &'a [Child],
        child_records: &'a [ChildCareRecord],
        family_record: &'a FamilyCareRecord,
    ) -> Self {
        Self {
            children: Some(children),
            child_records: Some(child_records),
            family_record: Some(family_record),
            ..Self::default()
        }
    }
}

fn require<T>(value: Option<T>, guide_type: GuideType, argument: &'static str) -> Result<T> {
    value.ok_or(GuideError::MissingInput {
        guide_type,
        argument,
    })
}

/// Public entry point: routes a guide request to the matching builder or
/// audience composer.
pub struct GuideGenerator {
    engine: TemplateEngine,
    config: GuideConfig,
}

impl GuideGenerator {
    pub fn new() -> Self {
        Self::with_config(GuideConfig::default())
    }

    pub fn with_config(config: GuideConfig) -> Self {
        Self {
            engine: TemplateEngine::new(),
            config,
        }
    }

    pub fn config(&self) -> &GuideConfig {
        &self.config
    }

    /// Generates a guide stamped with the current time.
    pub fn generate(&self, guide_type: GuideType, inputs: &GuideInputs<'_>) -> Result<String> {
        self.generate_at(guide_type, inputs, Utc::now())
    }

    /// Generates a guide as of `now`, which feeds the footer and the age line.
    pub fn generate_at(
        &self,
        guide_type: GuideType,
        inputs: &GuideInputs<'_>,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let ctx = GuideContext {
            engine: &self.engine,
            config: &self.config,
            now,
        };
        debug!("Generating {} guide", guide_type);

        let guide = match guide_type {
            GuideType::Child => {
                let child = require(inputs.child, guide_type, "child")?;
                let record = require(inputs.child_record, guide_type, "child_record")?;
                child_guide(&ctx, child, record)?
            }
            GuideType::Family => {
                let record = require(inputs.family_record, guide_type, "family_record")?;
                family_guide(&ctx, record)?
            }
            GuideType::Babysitter => {
                self.audience_pack(&ctx, guide_type, Audience::Babysitter, inputs)?
            }
            GuideType::School => self.audience_pack(&ctx, guide_type, Audience::School, inputs)?,
            GuideType::Grandparent => {
                self.audience_pack(&ctx, guide_type, Audience::Grandparent, inputs)?
            }
        };

        info!("Generated {} guide ({} bytes)", guide_type, guide.len());
        Ok(guide)
    }

    fn audience_pack(
        &self,
        ctx: &GuideContext<'_>,
        guide_type: GuideType,
        audience: Audience,
        inputs: &GuideInputs<'_>,
    ) -> Result<String> {
        let children = require(inputs.children, guide_type, "children")?;
        let records = require(inputs.child_records, guide_type, "child_records")?;
        let family = require(inputs.family_record, guide_type, "family_record")?;
        let policy = self.config.policy(audience);
        compose(ctx, &policy, children, records, family)
    }
}

impl Default for GuideGenerator {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::record::{
        ComfortKey, ContactsKey, EmergencyKey, HealthKey, HomeBaseKey, HouseRulesKey, RoutinesKey,
        SafetyKey, ScheduleKey,
    };
    use crate::schema::{FieldKey, Section, SectionFields};
    use chrono::TimeZone;
    use proptest::prelude::*;
    use serde_json::{Map, Value};

    fn token<K: FieldKey>(key: K) -> String {
        format!("<<{}.{}>>", K::SECTION, key.as_str())
    }

    /// Fills every field of the section with its own token and redacts the
    /// keys selected by `mask`.
    fn add_section<K: FieldKey>(row: &mut Map<String, Value>, mask: &[bool]) {
        let fields: Map<String, Value> = K::ALL
            .iter()
            .map(|key| {
                let value = if key.is_list() {
                    Value::Array(vec![Value::String(token(*key))])
                } else {
                    Value::String(token(*key))
                };
                (key.as_str().to_string(), value)
            })
            .collect();
        let redacted: Vec<Value> = K::ALL
            .iter()
            .zip(mask)
            .filter(|(_, on)| **on)
            .map(|(key, _)| Value::String(key.as_str().to_string()))
            .collect();
        row.insert(K::SECTION.to_string(), Value::Object(fields));
        row.insert(format!("{}_redacted_fields", K::SECTION), Value::Array(redacted));
    }

    fn hidden<F: SectionFields>(section: &Section<F>, out: &mut Vec<String>) {
        out.extend(
            F::Key::ALL
                .iter()
                .filter(|key| section.redacted.covers(**key))
                .map(|key| token(*key)),
        );
    }

    fn visible<F: SectionFields>(section: &Section<F>, out: &mut Vec<String>) {
        out.extend(
            F::Key::ALL
                .iter()
                .filter(|key| !section.redacted.covers(**key) && !section.value(**key).is_empty())
                .map(|key| token(*key)),
        );
    }

    fn records(masks: &[Vec<bool>]) -> (ChildCareRecord, FamilyCareRecord) {
        let mut child_row = Map::new();
        child_row.insert("id".into(), Value::from("rec-1"));
        child_row.insert("child_id".into(), Value::from("kid-1"));
        add_section::<RoutinesKey>(&mut child_row, &masks[0]);
        add_section::<HealthKey>(&mut child_row, &masks[1]);
        add_section::<ComfortKey>(&mut child_row, &masks[2]);
        add_section::<SafetyKey>(&mut child_row, &masks[3]);
        add_section::<ContactsKey>(&mut child_row, &masks[4]);

        let mut family_row = Map::new();
        family_row.insert("id".into(), Value::from("fam-1"));
        add_section::<HomeBaseKey>(&mut family_row, &masks[5]);
        add_section::<HouseRulesKey>(&mut family_row, &masks[6]);
        add_section::<ScheduleKey>(&mut family_row, &masks[7]);
        add_section::<EmergencyKey>(&mut family_row, &masks[8]);

        let record = serde_json::from_value(Value::Object(child_row)).unwrap();
        let family = serde_json::from_value(Value::Object(family_row)).unwrap();
        (record, family)
    }

    proptest! {
        #[test]
        fn redacted_values_never_appear(
            masks in prop::collection::vec(prop::collection::vec(any::<bool>(), 16), 9)
        ) {
            let (record, family) = records(&masks);
            let children = vec![Child::new("kid-1", "Sam")];
            let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();

            let mut hidden_tokens = Vec::new();
            hidden(&record.routines, &mut hidden_tokens);
            hidden(&record.health, &mut hidden_tokens);
            hidden(&record.comfort, &mut hidden_tokens);
            hidden(&record.safety, &mut hidden_tokens);
            hidden(&record.contacts, &mut hidden_tokens);
            hidden(&family.home_base, &mut hidden_tokens);
            hidden(&family.house_rules, &mut hidden_tokens);
            hidden(&family.schedule, &mut hidden_tokens);
            hidden(&family.emergency, &mut hidden_tokens);

            let generator = GuideGenerator::new();
            let inputs = GuideInputs {
                child: Some(&children[0]),
                children: Some(&children),
                child_record: Some(&record),
                child_records: Some(std::slice::from_ref(&record)),
                family_record: Some(&family),
            };
            for guide_type in GuideType::ALL {
                let doc = generator.generate_at(guide_type, &inputs, now).unwrap();
                for token in &hidden_tokens {
                    prop_assert!(
                        !doc.contains(token.as_str()),
                        "{} leaked into {} guide",
                        token,
                        guide_type
                    );
                }
            }
        }

        #[test]
        fn unredacted_values_reach_entity_guides(
            masks in prop::collection::vec(prop::collection::vec(any::<bool>(), 16), 9)
        ) {
            let (record, family) = records(&masks);
            let child = Child::new("kid-1", "Sam");
            let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
            let generator = GuideGenerator::new();

            let mut child_tokens = Vec::new();
            visible(&record.routines, &mut child_tokens);
            visible(&record.health, &mut child_tokens);
            visible(&record.comfort, &mut child_tokens);
            visible(&record.safety, &mut child_tokens);
            visible(&record.contacts, &mut child_tokens);
            let doc = generator
                .generate_at(GuideType::Child, &GuideInputs::for_child(&child, &record), now)
                .unwrap();
            for token in &child_tokens {
                prop_assert!(doc.contains(token.as_str()), "{} missing from child guide", token);
            }

            let mut family_tokens = Vec::new();
            visible(&family.home_base, &mut family_tokens);
            visible(&family.house_rules, &mut family_tokens);
            visible(&family.schedule, &mut family_tokens);
            visible(&family.emergency, &mut family_tokens);
            let doc = generator
                .generate_at(GuideType::Family, &GuideInputs::for_family(&family), now)
                .unwrap();
            for token in &family_tokens {
                prop_assert!(doc.contains(token.as_str()), "{} missing from family guide", token);
            }
        }
    }

    #[test]
    fn fully_redacted_records_render_no_sections() {
        let (record, family) = records(&vec![vec![true; 16]; 9]);
        let children = vec![Child::new("kid-1", "Sam")];
        let generator = GuideGenerator::new();
        let inputs = GuideInputs {
            child: Some(&children[0]),
            children: Some(&children),
            child_record: Some(&record),
            child_records: Some(std::slice::from_ref(&record)),
            family_record: Some(&family),
        };
        for guide_type in GuideType::ALL {
            let doc = generator.generate(guide_type, &inputs).unwrap();
            assert!(!doc.contains("## "), "{guide_type} guide rendered a section");
            assert!(!doc.contains("<<"), "{guide_type} guide leaked a value");
        }
    }
}
