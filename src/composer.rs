//! Audience packs: a reduced, per-audience view across several children and
//! the family record.

use log::debug;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::builders::{address_line, require_id, ALLERGY_CALLOUT};
use crate::error::{GuideError, Result};
use crate::projector::{project, project_callout};
use crate::record::{
    Child, ChildCareRecord, ComfortKey, ContactsKey, EmergencyKey, FamilyCareRecord, HealthKey,
    HomeBaseFields, HomeBaseKey, HouseRulesKey, RoutinesKey, SafetyKey, ScheduleKey,
};
use crate::schema::{FieldKey, Section, SectionFields};
use crate::section::{GuideContext, SectionBuilder};

const HOUSEHOLD_TITLE: &str = "Household";
const DEFAULT_TITLE: &str = "Caregiver Guide";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    Babysitter,
    School,
    Grandparent,
}

impl Audience {
    pub const ALL: [Audience; 3] = [Self::Babysitter, Self::School, Self::Grandparent];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Babysitter => "babysitter",
            Self::School => "school",
            Self::Grandparent => "grandparent",
        }
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A child field selected by an audience policy, written `section.field`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum ChildFieldRef {
    Routines(RoutinesKey),
    Health(HealthKey),
    Comfort(ComfortKey),
    Safety(SafetyKey),
    Contacts(ContactsKey),
}

impl ChildFieldRef {
    pub fn project(self, record: &ChildCareRecord) -> Option<String> {
        match self {
            Self::Routines(key) => project_key(&record.routines, key),
            Self::Health(HealthKey::Allergies) => project_callout(
                ALLERGY_CALLOUT,
                &record.health.fields.allergies,
                HealthKey::Allergies,
                &record.health.redacted,
            ),
            Self::Health(key) => project_key(&record.health, key),
            Self::Comfort(key) => project_key(&record.comfort, key),
            Self::Safety(key) => project_key(&record.safety, key),
            Self::Contacts(key) => project_key(&record.contacts, key),
        }
    }
}

impl FromStr for ChildFieldRef {
    type Err = GuideError;

    fn from_str(s: &str) -> Result<Self> {
        let unknown = || GuideError::UnknownFieldRef(s.to_string());
        let (section, field) = s.trim().split_once('.').ok_or_else(unknown)?;
        let parsed = match section {
            "routines" => RoutinesKey::parse(field).map(Self::Routines),
            "health" => HealthKey::parse(field).map(Self::Health),
            "comfort" => ComfortKey::parse(field).map(Self::Comfort),
            "safety" => SafetyKey::parse(field).map(Self::Safety),
            "contacts" => ContactsKey::parse(field).map(Self::Contacts),
            _ => None,
        };
        parsed.ok_or_else(unknown)
    }
}

impl TryFrom<String> for ChildFieldRef {
    type Error = GuideError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// An entry of the shared household block of an audience pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum HouseholdItem {
    /// Combined `network / password` line.
    Wifi,
    /// Composite street/city/state/zip line.
    Address,
    HomeBase(HomeBaseKey),
    HouseRules(HouseRulesKey),
    Schedule(ScheduleKey),
    Emergency(EmergencyKey),
}

impl HouseholdItem {
    pub fn project(self, family: &FamilyCareRecord) -> Option<String> {
        match self {
            Self::Wifi => wifi_line(&family.home_base),
            Self::Address => address_line(&family.home_base),
            Self::HomeBase(key) => project_key(&family.home_base, key),
            Self::HouseRules(key) => project_key(&family.house_rules, key),
            Self::Schedule(key) => project_key(&family.schedule, key),
            Self::Emergency(key) => project_key(&family.emergency, key),
        }
    }
}

impl FromStr for HouseholdItem {
    type Err = GuideError;

    fn from_str(s: &str) -> Result<Self> {
        let unknown = || GuideError::UnknownFieldRef(s.to_string());
        let (section, field) = s.trim().split_once('.').ok_or_else(unknown)?;
        let parsed = match (section, field) {
            ("home_base", "wifi") => Some(Self::Wifi),
            ("home_base", "address") => Some(Self::Address),
            ("home_base", _) => HomeBaseKey::parse(field).map(Self::HomeBase),
            ("house_rules", _) => HouseRulesKey::parse(field).map(Self::HouseRules),
            ("schedule", _) => ScheduleKey::parse(field).map(Self::Schedule),
            ("emergency", _) => EmergencyKey::parse(field).map(Self::Emergency),
            _ => None,
        };
        parsed.ok_or_else(unknown)
    }
}

impl TryFrom<String> for HouseholdItem {
    type Error = GuideError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// What one audience gets to see, and in which order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AudiencePolicy {
    #[serde(default = "default_title")]
    pub title: String,
    pub child_fields: Vec<ChildFieldRef>,
    pub household: Vec<HouseholdItem>,
    #[serde(default = "default_poison_control")]
    pub poison_control: bool,
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn default_poison_control() -> bool {
    true
}

impl AudiencePolicy {
    /// Built-in policy. All audiences currently share the same minimal
    /// disclosure.
    pub fn default_for(_audience: Audience) -> Self {
        Self {
            title: default_title(),
            child_fields: vec![
                ChildFieldRef::Routines(RoutinesKey::Bedtime),
                ChildFieldRef::Routines(RoutinesKey::Meals),
                ChildFieldRef::Health(HealthKey::Allergies),
                ChildFieldRef::Comfort(ComfortKey::CalmingTips),
                ChildFieldRef::Safety(SafetyKey::CannotDo),
            ],
            household: vec![
                HouseholdItem::Wifi,
                HouseholdItem::Emergency(EmergencyKey::EmergencyPlan),
            ],
            poison_control: true,
        }
    }
}

fn project_key<F: SectionFields>(section: &Section<F>, key: F::Key) -> Option<String> {
    project(key.label(), section.value(key), key, &section.redacted)
}

/// Combined Wi-Fi credentials. Redacting either half, or the `wifi` group,
/// suppresses the whole line.
pub fn wifi_line(home: &Section<HomeBaseFields>) -> Option<String> {
    let redacted = &home.redacted;
    if redacted.covers(HomeBaseKey::WifiNetwork) || redacted.covers(HomeBaseKey::WifiPassword) {
        return None;
    }
    let network = home.fields.wifi_network.display()?;
    match home.fields.wifi_password.display() {
        Some(password) => Some(format!("**Wi-Fi:** {} / {}", network, password)),
        None => Some(format!("**Wi-Fi:** {}", network)),
    }
}

/// Composes an audience pack for `children`. Children without a care record
/// are skipped.
pub fn compose(
    ctx: &GuideContext<'_>,
    policy: &AudiencePolicy,
    children: &[Child],
    child_records: &[ChildCareRecord],
    family: &FamilyCareRecord,
) -> Result<String> {
    require_id(&family.id, "family care")?;

    let mut sections = Vec::with_capacity(children.len() + 1);
    for child in children {
        let Some(record) = child_records.iter().find(|r| r.child_id == child.id) else {
            debug!("No care record for child {}, skipping", child.id);
            continue;
        };
        require_id(&record.id, "child care")?;

        let lines = policy.child_fields.iter().map(|field| field.project(record));
        let builder = lines.fold(SectionBuilder::new(child.display_name()), |b, line| b.line(line));
        sections.push(builder.render(ctx.engine)?);
    }

    let mut household = policy
        .household
        .iter()
        .fold(SectionBuilder::new(HOUSEHOLD_TITLE), |b, item| {
            b.line(item.project(family))
        });
    if policy.poison_control {
        household = household.trailer(ctx.config.poison_control.clone());
    }
    sections.push(household.render(ctx.engine)?);

    ctx.finish(&policy.title, &[], sections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldValue;

    #[test]
    fn test_parse_child_field_ref() {
        assert_eq!(
            "health.allergies".parse::<ChildFieldRef>().unwrap(),
            ChildFieldRef::Health(HealthKey::Allergies)
        );
        assert!("health.alergies".parse::<ChildFieldRef>().is_err());
        assert!("allergies".parse::<ChildFieldRef>().is_err());
        assert!("home_base.wifi".parse::<ChildFieldRef>().is_err());
    }

    #[test]
    fn test_parse_household_item() {
        assert_eq!("home_base.wifi".parse::<HouseholdItem>().unwrap(), HouseholdItem::Wifi);
        assert_eq!(
            "emergency.hospital".parse::<HouseholdItem>().unwrap(),
            HouseholdItem::Emergency(EmergencyKey::Hospital)
        );
        assert!("emergency.wifi".parse::<HouseholdItem>().is_err());
    }

    #[test]
    fn test_default_policies_are_identical_across_audiences() {
        let babysitter = AudiencePolicy::default_for(Audience::Babysitter);
        for audience in Audience::ALL {
            assert_eq!(AudiencePolicy::default_for(audience), babysitter);
        }
    }

    fn home(network: &str, password: &str) -> Section<HomeBaseFields> {
        Section::new(HomeBaseFields {
            wifi_network: FieldValue::text(network),
            wifi_password: FieldValue::text(password),
            ..HomeBaseFields::default()
        })
    }

    #[test]
    fn test_wifi_line_combines_pair() {
        assert_eq!(
            wifi_line(&home("Home", "secret")).as_deref(),
            Some("**Wi-Fi:** Home / secret")
        );
        assert_eq!(wifi_line(&home("Cafe", "")).as_deref(), Some("**Wi-Fi:** Cafe"));
        assert_eq!(wifi_line(&home("", "secret")), None);
    }

    #[test]
    fn test_blank_child_name_uses_id_as_heading() {
        use crate::config::GuideConfig;
        use crate::engine::TemplateEngine;
        use crate::record::RoutinesFields;
        use chrono::{TimeZone, Utc};

        let engine = TemplateEngine::new();
        let config = GuideConfig::default();
        let ctx = GuideContext {
            engine: &engine,
            config: &config,
            now: Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap(),
        };
        let children = vec![Child::new("kid-1", " ")];
        let mut record = ChildCareRecord::new("rec-1", "kid-1");
        record.routines = Section::new(RoutinesFields {
            bedtime: FieldValue::text("7:30pm"),
            ..RoutinesFields::default()
        });
        let family = FamilyCareRecord::new("fam-1");
        let policy = AudiencePolicy::default_for(Audience::Babysitter);

        let doc = compose(&ctx, &policy, &children, &[record], &family).unwrap();
        assert!(doc.contains("## kid-1\n**Bedtime:** 7:30pm\n"));
        assert!(!doc.contains("## \n"));
    }

    #[test]
    fn test_wifi_line_suppressed_by_either_half() {
        assert_eq!(
            wifi_line(&home("Home", "secret").with_redacted(HomeBaseKey::WifiPassword)),
            None
        );
        assert_eq!(
            wifi_line(&home("Home", "secret").with_redacted(HomeBaseKey::WifiNetwork)),
            None
        );
        assert_eq!(
            wifi_line(&home("Home", "secret").with_redacted(HomeBaseKey::Wifi)),
            None
        );
    }
}
