//! Section rendering and final document assembly.

use chrono::{DateTime, Utc};
use log::debug;
use std::fmt::Write;

use crate::config::GuideConfig;
use crate::engine::TemplateEngine;
use crate::error::{GuideError, Result};
use crate::projector::{project, project_callout};
use crate::schema::{FieldKey, FieldValue, RedactionSet, Section, SectionFields};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Labeled,
    /// Highlighted line with the given prefix, e.g. an allergy warning.
    Callout(&'static str),
}

/// One entry of a section's fixed reading order.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec<'a, K> {
    pub label: &'a str,
    pub value: &'a FieldValue,
    pub key: K,
    pub style: LineStyle,
}

impl<'a, K: FieldKey> FieldSpec<'a, K> {
    pub fn labeled(label: &'a str, value: &'a FieldValue, key: K) -> Self {
        Self {
            label,
            value,
            key,
            style: LineStyle::Labeled,
        }
    }

    pub fn callout(prefix: &'static str, value: &'a FieldValue, key: K) -> Self {
        Self {
            label: prefix,
            value,
            key,
            style: LineStyle::Callout(prefix),
        }
    }

    pub fn project(&self, redacted: &RedactionSet<K>) -> Option<String> {
        match self.style {
            LineStyle::Labeled => project(self.label, self.value, self.key, redacted),
            LineStyle::Callout(prefix) => project_callout(prefix, self.value, self.key, redacted),
        }
    }
}

/// Labeled specs for `keys` of `section`, in the given order.
pub fn specs_for<'a, F: SectionFields>(
    section: &'a Section<F>,
    keys: &[F::Key],
) -> Vec<FieldSpec<'a, F::Key>> {
    keys.iter()
        .map(|key| FieldSpec::labeled(key.label(), section.value(*key), *key))
        .collect()
}

/// Collects the lines of one section and renders it, or nothing at all when
/// neither a field line nor notes made it through.
pub struct SectionBuilder<'a> {
    title: &'a str,
    lines: Vec<String>,
    trailer: Vec<String>,
    notes: Option<String>,
    updated: Option<DateTime<Utc>>,
}

impl<'a> SectionBuilder<'a> {
    pub fn new(title: &'a str) -> Self {
        Self {
            title,
            lines: Vec::new(),
            trailer: Vec::new(),
            notes: None,
            updated: None,
        }
    }

    pub fn line(mut self, line: Option<String>) -> Self {
        self.lines.extend(line);
        self
    }

    pub fn fields<K: FieldKey>(mut self, specs: &[FieldSpec<'_, K>], redacted: &RedactionSet<K>) -> Self {
        self.lines
            .extend(specs.iter().filter_map(|spec| spec.project(redacted)));
        self
    }

    /// Fixed line appended after the field lines. It is printed only when
    /// the section renders for other reasons.
    pub fn trailer(mut self, line: impl Into<String>) -> Self {
        self.trailer.push(line.into());
        self
    }

    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes.filter(|text| !text.trim().is_empty());
        self
    }

    pub fn updated(mut self, updated: Option<DateTime<Utc>>) -> Self {
        self.updated = updated;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.notes.is_none()
    }

    pub fn render(self, engine: &TemplateEngine) -> Result<String> {
        if self.is_empty() {
            debug!("Section '{}' has nothing to share, omitting", self.title);
            return Ok(String::new());
        }
        let updated = self
            .updated
            .map(|at| format!("Updated {}", at.format("%Y-%m-%d")));
        let mut lines = self.lines;
        lines.extend(self.trailer);
        engine.render_section(self.title, updated.as_deref(), &lines, self.notes.as_deref())
    }
}

/// Renders a titled section from ordered field specs, its notes and its
/// redaction set. Returns an empty string when nothing is renderable.
pub fn render_section<K: FieldKey>(
    engine: &TemplateEngine,
    title: &str,
    specs: &[FieldSpec<'_, K>],
    notes: Option<&str>,
    redacted: &RedactionSet<K>,
) -> Result<String> {
    SectionBuilder::new(title)
        .fields(specs, redacted)
        .notes(notes.map(str::to_owned))
        .render(engine)
}

/// Everything a builder needs to produce one document.
pub struct GuideContext<'a> {
    pub engine: &'a TemplateEngine,
    pub config: &'a GuideConfig,
    pub now: DateTime<Utc>,
}

impl GuideContext<'_> {
    /// Starts a builder pre-filled with a record section's notes and
    /// timestamp.
    pub fn section<'s, F: SectionFields>(&self, title: &'s str, section: &Section<F>) -> SectionBuilder<'s> {
        SectionBuilder::new(title)
            .notes(section.notes_text())
            .updated(section.updated_at)
    }

    /// Assembles the document; empty sections are dropped.
    pub fn finish(&self, title: &str, preamble: &[String], sections: Vec<String>) -> Result<String> {
        let sections: Vec<String> = sections.into_iter().filter(|s| !s.is_empty()).collect();
        let footer = self.footer()?;
        self.engine.render_document(title, preamble, &sections, &footer)
    }

    fn footer(&self) -> Result<String> {
        let mut footer = String::from("Generated on ");
        write!(footer, "{}", self.now.format(&self.config.footer_format)).map_err(|_| {
            GuideError::InvalidConfig(format!(
                "invalid footer_format '{}'",
                self.config.footer_format
            ))
        })?;
        Ok(footer)
    }
}
