//! Caller identity threaded through every session.
//!
//! # Invariants
//! - A `CallerContext` always holds a validated project id.
//! - There is no ambient identity; every session receives one explicitly.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Project used when authentication is disabled.
pub const DEFAULT_PROJECT_ID: &str = "<default-project>";

static PROJECT_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.:<>-]{1,80}$").expect("valid project id regex"));

/// Tenant and user acting on the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallerContext {
    project_id: String,
    user_id: Option<String>,
}

impl CallerContext {
    /// Builds a context for `project_id`.
    ///
    /// # Errors
    /// - Returns [`ContextError::InvalidProjectId`] unless the id is 1 to 80
    ///   characters of `[A-Za-z0-9_.:<>-]`.
    pub fn new(project_id: impl Into<String>) -> Result<Self, ContextError> {
        let project_id = project_id.into();
        if !PROJECT_ID_RE.is_match(&project_id) {
            return Err(ContextError::InvalidProjectId(project_id));
        }
        Ok(Self {
            project_id,
            user_id: None,
        })
    }

    /// Context of the default project.
    pub fn default_project() -> Self {
        Self {
            project_id: DEFAULT_PROJECT_ID.to_string(),
            user_id: None,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    InvalidProjectId(String),
}

impl Display for ContextError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidProjectId(value) => write!(f, "invalid project id `{value}`"),
        }
    }
}

impl Error for ContextError {}
