//! Child and family care records as handed over by the persistence layer.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::error::GuideError;
use crate::schema::{lenient_timestamp, section_fields, Section};

section_fields! {
    /// Daily rhythm of a child.
    pub struct RoutinesFields / RoutinesKey : "routines" {
        wake_time => WakeTime = "Wake up",
        bedtime => Bedtime = "Bedtime",
        naps => Naps = "Naps",
        meals => Meals = "Meals",
        snacks => Snacks = "Snacks",
        screen_time => ScreenTime = "Screen time",
        bath_time => BathTime = "Bath time",
    }
}

section_fields! {
    pub struct HealthFields / HealthKey : "health" {
        allergies => Allergies = "Allergies" as list,
        reaction_protocol => ReactionProtocol = "Reaction protocol",
        medications => Medications = "Medications" as list,
        conditions => Conditions = "Conditions" as list,
        doctor_name => DoctorName = "Pediatrician",
        doctor_phone => DoctorPhone = "Pediatrician phone",
        insurance => Insurance = "Insurance",
    }
}

section_fields! {
    pub struct ComfortFields / ComfortKey : "comfort" {
        calming_tips => CalmingTips = "Calming tips",
        comfort_items => ComfortItems = "Comfort items",
        favorite_activities => FavoriteActivities = "Favorite activities",
        fears => Fears = "Fears",
        words => Words = "Words they use",
    }
}

section_fields! {
    pub struct SafetyFields / SafetyKey : "safety" {
        cannot_do => CannotDo = "Things they cannot do",
        supervision => Supervision = "Needs supervision for",
        car_seat => CarSeat = "Car seat",
        water_safety => WaterSafety = "Water safety",
    }
}

section_fields! {
    pub struct ContactsFields / ContactsKey : "contacts" {
        parent_phone => ParentPhone = "Parent phone",
        backup_contact => BackupContact = "Backup contact",
        authorized_pickup => AuthorizedPickup = "Authorized pickup",
        do_not_release => DoNotRelease = "Do not release to",
    }
}

section_fields! {
    /// Where the family lives and how to get around the house.
    pub struct HomeBaseFields / HomeBaseKey : "home_base" {
        street => Street = "Street" in Address,
        city => City = "City" in Address,
        state => State = "State" in Address,
        zip => Zip = "ZIP" in Address,
        wifi_network => WifiNetwork = "Wi-Fi network" in Wifi,
        wifi_password => WifiPassword = "Wi-Fi password" in Wifi,
        door_code => DoorCode = "Door code",
        parking => Parking = "Parking",
        pets => Pets = "Pets",
    }
    groups {
        Address => "address" = "Address",
        Wifi => "wifi" = "Wi-Fi",
    }
}

section_fields! {
    pub struct HouseRulesFields / HouseRulesKey : "house_rules" {
        screen_rules => ScreenRules = "Screen rules",
        food_rules => FoodRules = "Food rules",
        off_limits => OffLimits = "Off limits",
        bedtime_rules => BedtimeRules = "Bedtime rules",
        discipline => Discipline = "Discipline",
    }
}

section_fields! {
    pub struct ScheduleFields / ScheduleKey : "schedule" {
        weekday => Weekday = "Weekdays",
        weekend => Weekend = "Weekends",
        activities => Activities = "Activities",
        school_pickup => SchoolPickup = "School pickup",
    }
}

section_fields! {
    pub struct EmergencyFields / EmergencyKey : "emergency" {
        emergency_plan => EmergencyPlan = "Emergency plan",
        hospital => Hospital = "Nearest hospital",
        meeting_point => MeetingPoint = "Meeting point",
        fire_extinguisher => FireExtinguisher = "Fire extinguisher",
        first_aid_kit => FirstAidKit = "First aid kit",
    }
}

/// The child a record belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Child {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub birthdate: Option<NaiveDate>,
}

impl Child {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            birthdate: None,
        }
    }

    pub fn born(mut self, birthdate: NaiveDate) -> Self {
        self.birthdate = Some(birthdate);
        self
    }

    /// Name used in headings; falls back to the id when the name is blank.
    pub fn display_name(&self) -> &str {
        match self.name.trim() {
            "" => self.id.trim(),
            name => name,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(try_from = "ChildCareRow")]
pub struct ChildCareRecord {
    pub id: String,
    pub child_id: String,
    pub routines: Section<RoutinesFields>,
    pub health: Section<HealthFields>,
    pub comfort: Section<ComfortFields>,
    pub safety: Section<SafetyFields>,
    pub contacts: Section<ContactsFields>,
}

impl ChildCareRecord {
    pub fn new(id: impl Into<String>, child_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            child_id: child_id.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(try_from = "FamilyCareRow")]
pub struct FamilyCareRecord {
    pub id: String,
    pub home_base: Section<HomeBaseFields>,
    pub house_rules: Section<HouseRulesFields>,
    pub schedule: Section<ScheduleFields>,
    pub emergency: Section<EmergencyFields>,
}

impl FamilyCareRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// Stored shape of a child record: one column group per section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChildCareRow {
    id: String,
    child_id: String,
    routines: Option<RoutinesFields>,
    routines_notes: Option<String>,
    routines_redacted_fields: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_timestamp")]
    routines_updated_at: Option<DateTime<Utc>>,
    health: Option<HealthFields>,
    health_notes: Option<String>,
    health_redacted_fields: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_timestamp")]
    health_updated_at: Option<DateTime<Utc>>,
    comfort: Option<ComfortFields>,
    comfort_notes: Option<String>,
    comfort_redacted_fields: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_timestamp")]
    comfort_updated_at: Option<DateTime<Utc>>,
    safety: Option<SafetyFields>,
    safety_notes: Option<String>,
    safety_redacted_fields: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_timestamp")]
    safety_updated_at: Option<DateTime<Utc>>,
    contacts: Option<ContactsFields>,
    contacts_notes: Option<String>,
    contacts_redacted_fields: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_timestamp")]
    contacts_updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<ChildCareRow> for ChildCareRecord {
    type Error = GuideError;

    fn try_from(row: ChildCareRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            child_id: row.child_id,
            routines: Section::from_parts(
                row.routines,
                row.routines_notes,
                row.routines_redacted_fields,
                row.routines_updated_at,
            )?,
            health: Section::from_parts(
                row.health,
                row.health_notes,
                row.health_redacted_fields,
                row.health_updated_at,
            )?,
            comfort: Section::from_parts(
                row.comfort,
                row.comfort_notes,
                row.comfort_redacted_fields,
                row.comfort_updated_at,
            )?,
            safety: Section::from_parts(
                row.safety,
                row.safety_notes,
                row.safety_redacted_fields,
                row.safety_updated_at,
            )?,
            contacts: Section::from_parts(
                row.contacts,
                row.contacts_notes,
                row.contacts_redacted_fields,
                row.contacts_updated_at,
            )?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FamilyCareRow {
    id: String,
    home_base: Option<HomeBaseFields>,
    home_base_notes: Option<String>,
    home_base_redacted_fields: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_timestamp")]
    home_base_updated_at: Option<DateTime<Utc>>,
    house_rules: Option<HouseRulesFields>,
    house_rules_notes: Option<String>,
    house_rules_redacted_fields: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_timestamp")]
    house_rules_updated_at: Option<DateTime<Utc>>,
    schedule: Option<ScheduleFields>,
    schedule_notes: Option<String>,
    schedule_redacted_fields: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_timestamp")]
    schedule_updated_at: Option<DateTime<Utc>>,
    emergency: Option<EmergencyFields>,
    emergency_notes: Option<String>,
    emergency_redacted_fields: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_timestamp")]
    emergency_updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<FamilyCareRow> for FamilyCareRecord {
    type Error = GuideError;

    fn try_from(row: FamilyCareRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            home_base: Section::from_parts(
                row.home_base,
                row.home_base_notes,
                row.home_base_redacted_fields,
                row.home_base_updated_at,
            )?,
            house_rules: Section::from_parts(
                row.house_rules,
                row.house_rules_notes,
                row.house_rules_redacted_fields,
                row.house_rules_updated_at,
            )?,
            schedule: Section::from_parts(
                row.schedule,
                row.schedule_notes,
                row.schedule_redacted_fields,
                row.schedule_updated_at,
            )?,
            emergency: Section::from_parts(
                row.emergency,
                row.emergency_notes,
                row.emergency_redacted_fields,
                row.emergency_updated_at,
            )?,
        })
    }
}
