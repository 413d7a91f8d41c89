//! Care guide generation from child and family care records.
//!
//! Records are projected section by section into a small markdown dialect
//! (`#`/`##` headers, `**label:** value` lines, a `---` rule and an italic
//! footer). Every section carries its own redaction set; a redacted field is
//! never emitted by any guide type.
//!
//! ```no_run
//! use careguide::{Child, ChildCareRecord, GuideGenerator, GuideInputs, GuideType};
//!
//! let child = Child::new("kid-1", "Sam");
//! let record = ChildCareRecord::new("rec-1", "kid-1");
//! let guide = GuideGenerator::new()
//!     .generate(GuideType::Child, &GuideInputs::for_child(&child, &record))
//!     .unwrap();
//! println!("{}", guide);
//! ```

pub mod builders;
pub mod composer;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod filters;
pub mod projector;
pub mod record;
pub mod schema;
pub mod section;
pub mod source;

pub use composer::{Audience, AudiencePolicy, ChildFieldRef, HouseholdItem};
pub use config::GuideConfig;
pub use dispatcher::{GuideGenerator, GuideInputs, GuideType};
pub use engine::TemplateEngine;
pub use error::{GuideError, Result};
pub use record::{Child, ChildCareRecord, FamilyCareRecord};
pub use schema::{FieldKey, FieldValue, RedactionSet, Section};
pub use source::{CareRecordSource, GuideBundle};
