//! Template execution against an alert payload.

use chrono_tz::Tz;
use minijinja::{AutoEscape, Environment, ErrorKind};

use crate::{
    domain::Payload,
    errors::Error,
    formatting::{escape_html, format_bytes, format_date},
    templates::TemplateHandle,
    Result,
};

/// Settings the template filters depend on.
#[derive(Clone, Debug)]
pub struct RenderSettings {
    pub time_zone: Tz,
    pub date_format: String,
}

/// Executes template handles against payloads.
///
/// One environment (and its filter set) is shared by every render; templates
/// are compiled from the handle's source per call.
pub struct Renderer {
    env: Environment<'static>,
}

impl Renderer {
    pub fn new(settings: RenderSettings) -> Self {
        let mut env = Environment::new();
        // Template names are file paths; never pick escaping from their extension.
        env.set_auto_escape_callback(|_| AutoEscape::None);

        let RenderSettings {
            time_zone,
            date_format,
        } = settings;
        env.add_filter(
            "format_date",
            move |value: String| -> std::result::Result<String, minijinja::Error> {
                format_date(&value, time_zone, &date_format)
                    .map_err(|e| minijinja::Error::new(ErrorKind::InvalidOperation, e))
            },
        );
        env.add_filter("format_bytes", format_bytes);
        env.add_filter("escape_html", |value: String| escape_html(&value));

        Self { env }
    }

    /// Render `handle` with `payload` as the root context.
    ///
    /// Execution errors are returned to the caller; they never abort the process.
    pub fn render(&self, handle: &TemplateHandle, payload: &Payload) -> Result<String> {
        let render_err = |e: minijinja::Error| Error::Render {
            name: handle.name.clone(),
            message: format!("{e:#}"),
        };

        self.env
            .render_named_str(&handle.name, &handle.source, payload)
            .map_err(render_err)
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer").finish_non_exhaustive()
    }
}
