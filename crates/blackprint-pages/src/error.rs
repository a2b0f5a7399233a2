// SPDX-License-Identifier: Apache-2.0 OR MIT
use thiserror::Error;

/// Errors raised while loading or rendering registered pages.
#[derive(Debug, Error)]
pub enum PagesError {
    #[error(transparent)]
    Engine(#[from] blackprint_engine::Error),
    #[error("failed to read templates: {0}")]
    Io(#[from] std::io::Error),
    #[error("unknown template \"{0}\"")]
    UnknownTemplate(String),
}
