use std::{num::NonZeroUsize, sync::Arc};

use crate::{
    chunking::split_text, domain::Payload, render::Renderer, templates::TemplateStore, Result,
};

/// Rendered alert, ready for delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedAlert {
    pub template: String,
    pub text: String,
    pub chunks: Vec<String>,
}

/// resolve -> render -> split.
pub struct AlertPipeline {
    store: Arc<TemplateStore>,
    renderer: Arc<Renderer>,
    split_chars: NonZeroUsize,
}

impl AlertPipeline {
    pub fn new(
        store: Arc<TemplateStore>,
        renderer: Arc<Renderer>,
        split_chars: NonZeroUsize,
    ) -> Self {
        Self {
            store,
            renderer,
            split_chars,
        }
    }

    /// Render `payload` with the template named by `template` (`None`/empty means default).
    pub async fn prepare(
        &self,
        payload: &Payload,
        template: Option<&str>,
    ) -> Result<RenderedAlert> {
        let handle = self.store.resolve(template.unwrap_or_default()).await;
        let text = self.renderer.render(&handle, payload)?;
        let chunks = split_text(&text, self.split_chars);

        Ok(RenderedAlert {
            template: handle.name.clone(),
            text,
            chunks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        errors::Error,
        render::RenderSettings,
        templates::{FsTemplateLoader, DEFAULT_TEMPLATE},
    };
    use serde_json::json;

    async fn pipeline(dir: &tempfile::TempDir, default_src: &str, split: usize) -> AlertPipeline {
        let default_path = dir.path().join("default.tmpl");
        std::fs::write(&default_path, default_src).unwrap();
        let store = TemplateStore::new(Arc::new(FsTemplateLoader), default_path, false)
            .await
            .unwrap();
        let renderer = Renderer::new(RenderSettings {
            time_zone: chrono_tz::UTC,
            date_format: "%Y".to_string(),
        });
        AlertPipeline::new(
            Arc::new(store),
            Arc::new(renderer),
            NonZeroUsize::new(split).unwrap(),
        )
    }

    fn payload(v: serde_json::Value) -> Payload {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn default_template_renders_and_splits() {
        let dir = tempfile::tempdir().unwrap();
        let src = "{% for a in alerts %}{{ a.status }}{% endfor %}{{ filler }}";
        let p = pipeline(&dir, src, 4000).await;

        let body = payload(json!({
            "alerts": [{"status": "firing"}],
            "filler": "x".repeat(8994),
        }));
        let out = p.prepare(&body, None).await.unwrap();

        assert_eq!(out.template, DEFAULT_TEMPLATE);
        assert_eq!(out.text.chars().count(), 9000);
        let sizes: Vec<usize> = out.chunks.iter().map(|c| c.chars().count()).collect();
        assert_eq!(sizes, vec![4000, 4000, 1000]);
        assert!(out.chunks[0].starts_with("firing"));
    }

    #[tokio::test]
    async fn named_template_is_used_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let named = dir.path().join("short.tmpl");
        std::fs::write(&named, "short {{ status }}").unwrap();
        let p = pipeline(&dir, "long {{ status }}", 4000).await;

        let name = named.to_string_lossy().into_owned();
        let out = p
            .prepare(&payload(json!({"status": "resolved"})), Some(&name))
            .await
            .unwrap();
        assert_eq!(out.text, "short resolved");
        assert_eq!(out.template, name);
    }

    #[tokio::test]
    async fn render_errors_surface_to_caller() {
        let dir = tempfile::tempdir().unwrap();
        let p = pipeline(&dir, "{{ missing.field }}", 4000).await;

        let err = p.prepare(&Payload::new(), None).await.unwrap_err();
        assert!(matches!(err, Error::Render { .. }));
    }

    #[tokio::test]
    async fn empty_render_yields_no_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let p = pipeline(&dir, "{% if status %}{{ status }}{% endif %}", 10).await;

        let out = p.prepare(&Payload::new(), Some("")).await.unwrap();
        assert!(out.text.is_empty());
        assert!(out.chunks.is_empty());
    }
}
