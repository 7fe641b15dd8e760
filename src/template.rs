// src/template.rs

//! Template rendering
//!
//! Runner and packager templates ship embedded in the binary. A caller may
//! point the engine at an override directory; a template found there shadows
//! the embedded one with the same relative path.

use crate::error::{Error, Result};
use crate::variables::Variables;
use include_dir::{Dir, include_dir};
use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

static TEMPLATE_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/assets/templates");

/// Renders one template file into one output file
pub trait TemplateEngine {
    /// Render `template` with `variables` into `output`
    ///
    /// On success the parent directories of `output` exist and the file holds
    /// the rendered UTF-8 text.
    fn render(&self, template: &Path, output: &Path, variables: &Variables) -> Result<()>;
}

/// minijinja-backed template engine
#[derive(Debug, Clone, Default)]
pub struct MiniJinjaEngine {
    override_dir: Option<PathBuf>,
}

impl MiniJinjaEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look for templates in `dir` before falling back to the embedded set
    pub fn with_override_dir(mut self, dir: &Path) -> Self {
        self.override_dir = Some(dir.to_path_buf());
        self
    }

    /// Load the raw source of a template
    pub fn load_source(&self, template: &Path) -> Result<String> {
        if let Some(dir) = &self.override_dir {
            let candidate = dir.join(template);
            if candidate.is_file() {
                debug!("Using override template {}", candidate.display());
                return fs::read_to_string(&candidate).map_err(|e| Error::io(&candidate, e));
            }
        }

        if template.is_absolute() {
            return fs::read_to_string(template).map_err(|e| Error::io(template, e));
        }

        TEMPLATE_DIR
            .get_file(template)
            .and_then(|file| file.contents_utf8())
            .map(str::to_string)
            .ok_or_else(|| Error::Template {
                template: template.display().to_string(),
                message: "template not found".to_string(),
            })
    }

    /// Render template source text with the given variables
    pub fn render_str(&self, name: &str, source: &str, variables: &Variables) -> Result<String> {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        // Rendered files are config and scripts, never HTML
        env.set_auto_escape_callback(|_| AutoEscape::None);

        let template_err = |e: minijinja::Error| Error::Template {
            template: name.to_string(),
            message: e.to_string(),
        };

        env.add_template(name, source).map_err(template_err)?;
        env.get_template(name)
            .map_err(template_err)?
            .render(variables)
            .map_err(template_err)
    }
}

impl TemplateEngine for MiniJinjaEngine {
    fn render(&self, template: &Path, output: &Path, variables: &Variables) -> Result<()> {
        let source = self.load_source(template)?;
        let name = template.display().to_string();
        let rendered = self.render_str(&name, &source, variables)?;

        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        fs::write(output, rendered).map_err(|e| Error::io(output, e))?;

        debug!("Rendered {} -> {}", name, output.display());
        Ok(())
    }
}

/// Whether an embedded template exists at `template`
pub fn is_embedded(template: &Path) -> bool {
    TEMPLATE_DIR.get_file(template).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::from_pairs;
    use tempfile::TempDir;

    #[test]
    fn test_render_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let tpl = temp_dir.path().join("greeting.txt.j2");
        fs::write(&tpl, "hello {{ NAME }}\n").unwrap();

        let output = temp_dir.path().join("out/nested/greeting.txt");
        let engine = MiniJinjaEngine::new();
        engine
            .render(&tpl, &output, &from_pairs([("NAME", "world")]))
            .unwrap();

        assert_eq!(fs::read_to_string(&output).unwrap(), "hello world\n");
    }

    #[test]
    fn test_undefined_variable_is_an_error() {
        let engine = MiniJinjaEngine::new();
        let err = engine
            .render_str("t", "{{ MISSING }}", &Variables::new())
            .unwrap_err();
        assert!(matches!(err, Error::Template { .. }));
    }

    #[test]
    fn test_override_dir_shadows_embedded() {
        let temp_dir = TempDir::new().unwrap();
        let rel = Path::new("packagers/rpm/postremove.sh.j2");
        assert!(is_embedded(rel));

        let shadow = temp_dir.path().join(rel);
        fs::create_dir_all(shadow.parent().unwrap()).unwrap();
        fs::write(&shadow, "# custom {{ PKG_NAME }}").unwrap();

        let engine = MiniJinjaEngine::new().with_override_dir(temp_dir.path());
        assert_eq!(engine.load_source(rel).unwrap(), "# custom {{ PKG_NAME }}");
    }

    #[test]
    fn test_unknown_template_fails() {
        let engine = MiniJinjaEngine::new();
        assert!(engine.load_source(Path::new("nope/missing.j2")).is_err());
    }

    #[test]
    fn test_xml_templates_are_not_escaped() {
        let engine = MiniJinjaEngine::new();
        let out = engine
            .render_str(
                "runners/web-container/container.xml.j2",
                "<Set name=\"contextPath\">{{ CONTEXT }}</Set> {{ OPTS }}",
                &from_pairs([("CONTEXT", "/app"), ("OPTS", "-Da=\"x\" & -Db=/opt")]),
            )
            .unwrap();
        assert_eq!(out, "<Set name=\"contextPath\">/app</Set> -Da=\"x\" & -Db=/opt");
    }

    #[test]
    fn test_embedded_xml_template_keeps_paths() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("container.xml");
        let vars = from_pairs([
            ("CONTEXT", "/app"),
            ("WEB_NAME", "webapp"),
            ("WEB_PORT", "8080"),
            ("RUNNER_INSTALL_LOC", "/usr/local/svcdrop/runner"),
        ]);

        MiniJinjaEngine::new()
            .render(Path::new("runners/web-container/container.xml.j2"), &output, &vars)
            .unwrap();

        let rendered = fs::read_to_string(&output).unwrap();
        assert!(rendered.contains("<Set name=\"contextPath\">/app</Set>"));
        assert!(!rendered.contains("&#x2f;"));
    }

    #[test]
    fn test_shell_syntax_survives_rendering() {
        let engine = MiniJinjaEngine::new();
        let out = engine
            .render_str("s", "echo ${HOME} {{ A }}", &from_pairs([("A", "b")]))
            .unwrap();
        assert_eq!(out, "echo ${HOME} b");
    }
}
