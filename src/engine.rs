use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;

use crate::error::Result;

/// Shell of one `## Section` block. Every emitted line ends in a newline.
pub const SECTION_TEMPLATE: &str = "## {{ title | heading }}
{% if updated %}{{ updated | italic }}
{% endif %}{% for line in lines %}{{ line }}
{% endfor %}{% if notes %}{{ notes | italic }}
{% endif %}
";

/// Shell of a whole guide: title, preamble lines, sections, rule and footer.
pub const DOCUMENT_TEMPLATE: &str = "# {{ title | heading }}
{% for line in preamble %}{{ line }}
{% endfor %}{% for section in sections %}
{{ section }}{% endfor %}
---
{{ footer | italic }}
";

/// TemplateEngine wraps minijinja::Environment and renders the guide markup.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Creates a new TemplateEngine with default configuration.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(false);

        env.add_filter("italic", crate::filters::filter_italic);
        env.add_filter("heading", crate::filters::filter_heading);

        Self { env }
    }

    /// Renders a template string with the given context.
    pub fn render_string<T: Serialize>(&self, template_str: &str, context: &T) -> Result<String> {
        let template = self.env.template_from_str(template_str)?;
        Ok(template.render(context)?)
    }

    /// Renders a section shell. The caller decides whether the section is
    /// worth rendering at all.
    pub fn render_section(
        &self,
        title: &str,
        updated: Option<&str>,
        lines: &[String],
        notes: Option<&str>,
    ) -> Result<String> {
        self.render_string(
            SECTION_TEMPLATE,
            &minijinja::context! {
                title => title,
                updated => updated,
                lines => lines,
                notes => notes,
            },
        )
    }

    /// Renders a full document around already rendered sections.
    pub fn render_document(
        &self,
        title: &str,
        preamble: &[String],
        sections: &[String],
        footer: &str,
    ) -> Result<String> {
        self.render_string(
            DOCUMENT_TEMPLATE,
            &minijinja::context! {
                title => title,
                preamble => preamble,
                sections => sections,
                footer => footer,
            },
        )
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GuideError;

    #[test]
    fn test_section_shell_rejects_missing_lines() {
        let engine = TemplateEngine::new();
        let context = minijinja::context! {
            title => "Routines",
            updated => None::<&str>,
            notes => None::<&str>,
        };
        let result = engine.render_string(SECTION_TEMPLATE, &context);
        assert!(matches!(result, Err(GuideError::Template(_))));
    }

    #[test]
    fn test_section_title_is_kept_on_one_line() {
        let engine = TemplateEngine::new();
        let rendered = engine
            .render_section("Home\n  Base", None, &["**Pets:** Cat".to_string()], None)
            .unwrap();
        assert_eq!(rendered, "## Home Base\n**Pets:** Cat\n");
    }

    #[test]
    fn test_render_section() {
        let engine = TemplateEngine::new();
        let lines = vec!["**Bedtime:** 7pm".to_string(), "**Naps:** 1pm".to_string()];
        let rendered = engine
            .render_section("Routines", None, &lines, Some("Lights out by 7:15"))
            .unwrap();
        assert_eq!(
            rendered,
            "## Routines\n**Bedtime:** 7pm\n**Naps:** 1pm\n*Lights out by 7:15*\n"
        );
    }

    #[test]
    fn test_render_section_with_updated_line() {
        let engine = TemplateEngine::new();
        let lines = vec!["**Bedtime:** 7pm".to_string()];
        let rendered = engine
            .render_section("Routines", Some("Updated 2026-10-01"), &lines, None)
            .unwrap();
        assert_eq!(
            rendered,
            "## Routines\n*Updated 2026-10-01*\n**Bedtime:** 7pm\n"
        );
    }

    #[test]
    fn test_render_document_without_sections() {
        let engine = TemplateEngine::new();
        let rendered = engine
            .render_document("Family Care Guide", &[], &[], "Generated now")
            .unwrap();
        assert_eq!(rendered, "# Family Care Guide\n\n---\n*Generated now*");
    }

    #[test]
    fn test_render_document_with_sections() {
        let engine = TemplateEngine::new();
        let preamble = vec!["**Age:** 2 years".to_string()];
        let sections = vec!["## A\n**x:** 1\n".to_string(), "## B\n**y:** 2\n".to_string()];
        let rendered = engine
            .render_document("Guide", &preamble, &sections, "Generated now")
            .unwrap();
        assert_eq!(
            rendered,
            "# Guide\n**Age:** 2 years\n\n## A\n**x:** 1\n\n## B\n**y:** 2\n\n---\n*Generated now*"
        );
    }
}
