//! Logical admin routes.
//!
//! `/admin/{resource}`, `/admin/{resource}/create`,
//! `/admin/{resource}/edit/{id}`, `/admin/{resource}/view/{id}`, and `/`.
//! Only slugs present in the resource catalog parse.

use std::fmt;
use std::str::FromStr;

use crate::record::RecordId;
use crate::resource::{self, Resource};

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("unknown resource: {0}")]
    UnknownResource(String),
    #[error("unrecognized path: {0}")]
    Unrecognized(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminRoute {
    /// Landing page; where non-admins are sent.
    Home,
    List(&'static Resource),
    Create(&'static Resource),
    Edit(&'static Resource, RecordId),
    View(&'static Resource, RecordId),
}

impl AdminRoute {
    /// Resource the route belongs to, if any.
    #[must_use]
    pub fn resource(&self) -> Option<&'static Resource> {
        match self {
            Self::Home => None,
            Self::List(r) | Self::Create(r) | Self::Edit(r, _) | Self::View(r, _) => Some(*r),
        }
    }
}

impl fmt::Display for AdminRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Home => f.write_str("/"),
            Self::List(r) => write!(f, "/admin/{}", r.slug),
            Self::Create(r) => write!(f, "/admin/{}/create", r.slug),
            Self::Edit(r, id) => write!(f, "/admin/{}/edit/{id}", r.slug),
            Self::View(r, id) => write!(f, "/admin/{}/view/{id}", r.slug),
        }
    }
}

impl FromStr for AdminRoute {
    type Err = RouteError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::Home);
        }
        let segments: Vec<&str> = trimmed.split('/').collect();
        let unrecognized = || RouteError::Unrecognized(path.to_string());

        let ["", "admin", slug, rest @ ..] = segments.as_slice() else {
            return Err(unrecognized());
        };
        let resource = resource::find(slug).ok_or_else(|| RouteError::UnknownResource((*slug).to_string()))?;

        match rest {
            [] => Ok(Self::List(resource)),
            ["create"] => Ok(Self::Create(resource)),
            ["edit", id] if !id.is_empty() => Ok(Self::Edit(resource, RecordId::from(*id))),
            ["view", id] if !id.is_empty() => Ok(Self::View(resource, RecordId::from(*id))),
            _ => Err(unrecognized()),
        }
    }
}
