// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use blackprint_engine::{template_name_for, ImportResolver, Template, Value};
use tracing::{debug, trace};

use crate::error::PagesError;
use crate::site::{with_site, SiteConfig};

/// File suffix of templates picked up by [`TemplateRegistry::load_dir`].
pub const TEMPLATE_SUFFIX: &str = ".bp.html";

/// Sources of every registered template, shared with the templates as their
/// import resolver so later registrations are visible to earlier ones.
#[derive(Debug, Default)]
struct SourceTable {
    sources: RwLock<BTreeMap<String, String>>,
}

impl SourceTable {
    fn insert(&self, name: String, source: String) {
        self.sources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, source);
    }
}

#[async_trait]
impl ImportResolver for SourceTable {
    async fn resolve(&self, name: &str) -> Option<String> {
        let source = self
            .sources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned();
        trace!(template = name, found = source.is_some(), "resolving import");
        source
    }
}

/// Named templates that import each other and render with site data.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, Template>,
    sources: Arc<SourceTable>,
    site: Option<SiteConfig>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration injected as `site` into every render.
    #[must_use]
    pub fn with_site(mut self, site: SiteConfig) -> Self {
        self.site = Some(site);
        self
    }

    pub fn site(&self) -> Option<&SiteConfig> {
        self.site.as_ref()
    }

    /// Registers `source` under `name`, replacing any earlier template of
    /// that name. The template can import every registered template.
    pub fn register(&mut self, name: impl Into<String>, source: impl Into<String>) -> &Template {
        let name = name.into();
        let source = source.into();
        self.sources.insert(name.clone(), source.clone());
        let resolver: Arc<dyn ImportResolver> = self.sources.clone();
        let template = Template::new(name.clone(), source).with_resolver(resolver);
        debug!(template = %name, "registered template");
        self.templates.insert(name.clone(), template);
        &self.templates[&name]
    }

    /// Registers every `*.bp.html` file directly inside `dir` under its name
    /// without the suffix. Returns how many templates were loaded.
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize, PagesError> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let is_template = entry.file_name().to_string_lossy().ends_with(TEMPLATE_SUFFIX);
            if is_template && entry.file_type()?.is_file() {
                paths.push(entry.path());
            }
        }
        paths.sort();

        for path in &paths {
            let source = fs::read_to_string(path)?;
            self.register(template_name_for(path), source);
        }
        debug!(dir = %dir.display(), count = paths.len(), "loaded templates");
        Ok(paths.len())
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Renders the template `name`. When a site configuration is set it is
    /// added to `data` as `site` unless `data` already has that key.
    pub async fn render(&self, name: &str, data: &Value) -> Result<String, PagesError> {
        let template = self
            .get(name)
            .ok_or_else(|| PagesError::UnknownTemplate(name.to_string()))?;
        let output = match &self.site {
            Some(site) => template.render(&with_site(data, site)).await?,
            None => template.render(data).await?,
        };
        Ok(output)
    }
}
