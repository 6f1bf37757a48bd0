//! Embedded HTML templates.
//!
//! Templates are compiled into the binary and rendered with minijinja. Every template name ends
//! in `.html`, so interpolated values are HTML-escaped.

use minijinja::Environment;
use serde::Serialize;

use crate::errors::Error;

const TEMPLATES: &[(&str, &str)] = &[
    ("base_style.html", include_str!("../templates/base_style.html")),
    ("analysis_report.html", include_str!("../templates/analysis_report.html")),
    ("inquiry_reply.html", include_str!("../templates/inquiry_reply.html")),
    ("member_invitation.html", include_str!("../templates/member_invitation.html")),
    ("withdrawal_notice.html", include_str!("../templates/withdrawal_notice.html")),
];

/// Static page served to blocked regions
pub const GEO_BLOCKED_PAGE: &str = include_str!("../templates/geo_blocked.html");

pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    pub fn new() -> Result<Self, Error> {
        let mut env = Environment::new();
        for (name, source) in TEMPLATES {
            env.add_template(*name, *source).map_err(|e| Error::Internal {
                operation: format!("load template {name}: {e}"),
            })?;
        }
        Ok(Self { env })
    }

    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, Error> {
        self.env
            .get_template(name)
            .and_then(|template| template.render(ctx))
            .map_err(|e| Error::Internal {
                operation: format!("render template {name}: {e}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn test_all_templates_load() {
        assert!(Templates::new().is_ok());
    }

    #[test]
    fn test_html_is_escaped() {
        let templates = Templates::new().unwrap();
        let html = templates
            .render(
                "inquiry_reply.html",
                context! {
                    name => "<script>alert(1)</script>",
                    inquiry_type => "Demo",
                    reply_message => "See you <b>soon</b>",
                    original_content => "hello",
                    site_url => "https://denjoy.kr",
                },
            )
            .unwrap();

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("See you &lt;b&gt;soon"));
    }

    #[test]
    fn test_unknown_template_is_internal_error() {
        let templates = Templates::new().unwrap();
        let err = templates.render("missing.html", context! {}).unwrap_err();
        assert_eq!(err.error_code(), "internal_error");
    }
}
