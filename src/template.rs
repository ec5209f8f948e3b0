use crate::{
    error::{Error, Result},
    post::FrontMatter,
    prompt::{PromptContext, PromptKind},
};
use serde::Serialize;
use tera::{Context, Tera};

const POST_TEMPLATE: &str = "post.md";

#[derive(Serialize)]
struct PostView<'a> {
    post: &'a FrontMatter,
    body: &'a str,
}

/// Template engine for post files and prompts.
pub(crate) struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Creates an engine with the built-in templates registered.
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in template fails to compile.
    pub(crate) fn new() -> Result<Self> {
        let mut tera = Tera::default();
        Self::register_builtin_templates(&mut tera)?;
        Ok(Self { tera })
    }

    fn register_builtin_templates(tera: &mut Tera) -> Result<()> {
        let builtins = [
            (POST_TEMPLATE, include_str!("../templates/post.md.tera")),
            (
                PromptKind::Title.template_name(),
                include_str!("../templates/prompts/title.tera"),
            ),
            (
                PromptKind::Excerpt.template_name(),
                include_str!("../templates/prompts/excerpt.tera"),
            ),
            (
                PromptKind::Tags.template_name(),
                include_str!("../templates/prompts/tags.tera"),
            ),
            (
                PromptKind::Article.template_name(),
                include_str!("../templates/prompts/article.tera"),
            ),
            (
                PromptKind::Topics.template_name(),
                include_str!("../templates/prompts/topics.tera"),
            ),
        ];

        for (name, source) in builtins {
            tera.add_raw_template(name, source)
                .map_err(|e| Error::template(name, &e))?;
        }
        Ok(())
    }

    /// Renders the user prompt for `kind`.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub(crate) fn render_prompt(&self, kind: PromptKind, ctx: &PromptContext) -> Result<String> {
        let context = Context::from_serialize(ctx)
            .map_err(|e| Error::template(kind.template_name(), &e))?;
        let rendered = self
            .tera
            .render(kind.template_name(), &context)
            .map_err(|e| Error::template(kind.template_name(), &e))?;
        Ok(rendered.trim().to_string())
    }

    /// Renders a complete post file: front-matter followed by the body.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub(crate) fn render_post(&self, front_matter: &FrontMatter, body: &str) -> Result<String> {
        let view = PostView {
            post: front_matter,
            body: body.trim(),
        };
        let context =
            Context::from_serialize(&view).map_err(|e| Error::template(POST_TEMPLATE, &e))?;
        self.tera
            .render(POST_TEMPLATE, &context)
            .map_err(|e| Error::template(POST_TEMPLATE, &e))
    }
}
