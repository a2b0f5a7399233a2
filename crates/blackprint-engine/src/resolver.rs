// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;

/// Source of template fragments for `<ref! import="...">`.
///
/// Implementations must be reentrant: one render may resolve several imports
/// and the same resolver is shared by concurrent renders.
#[async_trait]
pub trait ImportResolver: Send + Sync {
    /// Returns the HTML source registered under `name`, or `None` when the
    /// name is unknown.
    async fn resolve(&self, name: &str) -> Option<String>;
}

/// Resolver that knows no templates. Every import fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImports;

#[async_trait]
impl ImportResolver for NoImports {
    async fn resolve(&self, _name: &str) -> Option<String> {
        None
    }
}

#[async_trait]
impl ImportResolver for HashMap<String, String> {
    async fn resolve(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

#[async_trait]
impl ImportResolver for BTreeMap<String, String> {
    async fn resolve(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}
