//! Full guides for a single child record or the family record.

use chrono::{Datelike, NaiveDate};

use crate::error::{GuideError, Result};
use crate::record::{
    Child, ChildCareRecord, ComfortKey, ContactsKey, EmergencyKey, FamilyCareRecord, HealthKey,
    HomeBaseFields, HomeBaseKey, HouseRulesKey, RoutinesKey, SafetyKey, ScheduleKey,
};
use crate::schema::Section;
use crate::section::{specs_for, FieldSpec, GuideContext};

pub const ALLERGY_CALLOUT: &str = "⚠️ ALLERGIES";

pub const FAMILY_TITLE: &str = "Family Care Guide";

const ROUTINES_ORDER: &[RoutinesKey] = &[
    RoutinesKey::WakeTime,
    RoutinesKey::Meals,
    RoutinesKey::Snacks,
    RoutinesKey::Naps,
    RoutinesKey::ScreenTime,
    RoutinesKey::BathTime,
    RoutinesKey::Bedtime,
];

// Allergies and the reaction protocol lead the section and are not listed here.
const HEALTH_ORDER: &[HealthKey] = &[
    HealthKey::Medications,
    HealthKey::Conditions,
    HealthKey::DoctorName,
    HealthKey::DoctorPhone,
    HealthKey::Insurance,
];

const COMFORT_ORDER: &[ComfortKey] = &[
    ComfortKey::CalmingTips,
    ComfortKey::ComfortItems,
    ComfortKey::FavoriteActivities,
    ComfortKey::Fears,
    ComfortKey::Words,
];

const SAFETY_ORDER: &[SafetyKey] = &[
    SafetyKey::CannotDo,
    SafetyKey::Supervision,
    SafetyKey::CarSeat,
    SafetyKey::WaterSafety,
];

const CONTACTS_ORDER: &[ContactsKey] = &[
    ContactsKey::ParentPhone,
    ContactsKey::BackupContact,
    ContactsKey::AuthorizedPickup,
    ContactsKey::DoNotRelease,
];

// Address parts are rendered as one composite line ahead of these.
const HOME_BASE_ORDER: &[HomeBaseKey] = &[
    HomeBaseKey::WifiNetwork,
    HomeBaseKey::WifiPassword,
    HomeBaseKey::DoorCode,
    HomeBaseKey::Parking,
    HomeBaseKey::Pets,
];

const HOUSE_RULES_ORDER: &[HouseRulesKey] = &[
    HouseRulesKey::ScreenRules,
    HouseRulesKey::FoodRules,
    HouseRulesKey::OffLimits,
    HouseRulesKey::BedtimeRules,
    HouseRulesKey::Discipline,
];

const SCHEDULE_ORDER: &[ScheduleKey] = &[
    ScheduleKey::Weekday,
    ScheduleKey::Weekend,
    ScheduleKey::Activities,
    ScheduleKey::SchoolPickup,
];

const EMERGENCY_ORDER: &[EmergencyKey] = &[
    EmergencyKey::EmergencyPlan,
    EmergencyKey::Hospital,
    EmergencyKey::MeetingPoint,
    EmergencyKey::FireExtinguisher,
    EmergencyKey::FirstAidKit,
];

pub(crate) fn require_id(id: &str, entity: &'static str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(GuideError::MissingRecordId { entity });
    }
    Ok(())
}

/// Builds the complete guide for one child.
pub fn child_guide(ctx: &GuideContext<'_>, child: &Child, record: &ChildCareRecord) -> Result<String> {
    require_id(&child.id, "child")?;
    require_id(&record.id, "child care")?;

    let preamble: Vec<String> = child
        .birthdate
        .map(|birthdate| age_line(birthdate, ctx.now.date_naive()))
        .into_iter()
        .collect();

    let health = &record.health;
    let mut health_specs = vec![
        FieldSpec::callout(ALLERGY_CALLOUT, &health.fields.allergies, HealthKey::Allergies),
        FieldSpec::labeled(
            "Reaction protocol",
            &health.fields.reaction_protocol,
            HealthKey::ReactionProtocol,
        ),
    ];
    health_specs.extend(specs_for(health, HEALTH_ORDER));

    let sections = vec![
        ctx.section("Routines", &record.routines)
            .fields(&specs_for(&record.routines, ROUTINES_ORDER), &record.routines.redacted)
            .render(ctx.engine)?,
        ctx.section("Health", health)
            .fields(&health_specs, &health.redacted)
            .render(ctx.engine)?,
        ctx.section("Comfort", &record.comfort)
            .fields(&specs_for(&record.comfort, COMFORT_ORDER), &record.comfort.redacted)
            .render(ctx.engine)?,
        ctx.section("Safety", &record.safety)
            .fields(&specs_for(&record.safety, SAFETY_ORDER), &record.safety.redacted)
            .render(ctx.engine)?,
        ctx.section("Contacts", &record.contacts)
            .fields(&specs_for(&record.contacts, CONTACTS_ORDER), &record.contacts.redacted)
            .render(ctx.engine)?,
    ];

    ctx.finish(&format!("{}'s Care Guide", child.display_name()), &preamble, sections)
}

/// Builds the complete guide for the family record.
pub fn family_guide(ctx: &GuideContext<'_>, record: &FamilyCareRecord) -> Result<String> {
    require_id(&record.id, "family care")?;

    let home = &record.home_base;
    let emergency = &record.emergency;
    let sections = vec![
        ctx.section("Home Base", home)
            .line(address_line(home))
            .fields(&specs_for(home, HOME_BASE_ORDER), &home.redacted)
            .render(ctx.engine)?,
        ctx.section("House Rules", &record.house_rules)
            .fields(
                &specs_for(&record.house_rules, HOUSE_RULES_ORDER),
                &record.house_rules.redacted,
            )
            .render(ctx.engine)?,
        ctx.section("Schedule", &record.schedule)
            .fields(&specs_for(&record.schedule, SCHEDULE_ORDER), &record.schedule.redacted)
            .render(ctx.engine)?,
        ctx.section("Emergency", emergency)
            .fields(&specs_for(emergency, EMERGENCY_ORDER), &emergency.redacted)
            .trailer(ctx.config.poison_control.clone())
            .render(ctx.engine)?,
    ];

    ctx.finish(FAMILY_TITLE, &[], sections)
}

/// Composite address line built from the parts that are neither redacted
/// nor empty.
pub fn address_line(home: &Section<HomeBaseFields>) -> Option<String> {
    let part = |key: HomeBaseKey| {
        if home.redacted.covers(key) {
            None
        } else {
            home.value(key).display()
        }
    };
    let locality: Vec<String> = [HomeBaseKey::State, HomeBaseKey::Zip]
        .into_iter()
        .filter_map(part)
        .collect();
    let locality = (!locality.is_empty()).then(|| locality.join(" "));
    let parts: Vec<String> = [part(HomeBaseKey::Street), part(HomeBaseKey::City), locality]
        .into_iter()
        .flatten()
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(format!("**Address:** {}", parts.join(", ")))
}

/// Age (or due date) line for the top of a child guide.
pub fn age_line(birthdate: NaiveDate, today: NaiveDate) -> String {
    if birthdate > today {
        return format!("**Due:** {}", birthdate.format("%B %-d, %Y"));
    }
    format!("**Age:** {}", describe_age(birthdate, today))
}

fn describe_age(birthdate: NaiveDate, today: NaiveDate) -> String {
    let mut months = (today.year() - birthdate.year()) * 12 + today.month() as i32
        - birthdate.month() as i32;
    if today.day() < birthdate.day() {
        months -= 1;
    }
    if months < 1 {
        return match (today - birthdate).num_weeks() {
            0 => "Newborn".to_string(),
            weeks => plural(weeks as i32, "week"),
        };
    }
    if months < 24 {
        return plural(months, "month");
    }
    match (months / 12, months % 12) {
        (years, 0) => plural(years, "year"),
        (years, rest) => format!("{}, {}", plural(years, "year"), plural(rest, "month")),
    }
}

fn plural(count: i32, unit: &str) -> String {
    if count == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", count, unit)
    }
}
