//! Shared page chrome and the page render path.

use askama::Template;
use axum::response::{Html, IntoResponse, Response};
use chrono::{Datelike, Utc};

use crate::boundary::ErrorBoundary;
use crate::config::AnalyticsConfig;
use crate::error::AppError;
use crate::nav::{NavLink, nav_links};
use crate::seo::{PageMeta, SeoTags};
use crate::state::AppState;

/// Everything `base.html` needs besides the page body.
#[derive(Debug, Clone)]
pub struct Layout {
    pub seo: SeoTags,
    pub nav: Vec<NavLink>,
    /// Analytics providers, present only when analytics is enabled
    pub analytics: Option<AnalyticsConfig>,
    pub dev_tools: bool,
    pub year: i32,
}

impl Layout {
    /// Chrome for the page described by `meta`.
    #[must_use]
    pub fn new(state: &AppState, meta: &PageMeta) -> Self {
        let config = state.config();
        Self {
            seo: state.seo().resolve(meta),
            nav: nav_links(&meta.path),
            analytics: config
                .analytics_enabled()
                .then(|| config.analytics.clone()),
            dev_tools: config.features.dev_tools,
            year: Utc::now().year(),
        }
    }
}

/// Render a page through an [`ErrorBoundary`].
///
/// A template failure (or a panic while rendering) turns into the error
/// page instead of a broken response.
pub fn render<T: Template>(page: &T) -> Response {
    render_with(|| page.render())
}

/// Like [`render`], for content produced by a closure.
///
/// Each call gets a fresh boundary, so a failed page is retried on the next
/// request.
pub fn render_with<E, F>(content: F) -> Response
where
    E: std::fmt::Display,
    F: FnOnce() -> Result<String, E>,
{
    render_in(&mut ErrorBoundary::new("page"), content)
}

/// Like [`render_with`], through a boundary that outlives the request.
///
/// Once `boundary` has failed it serves the error page without calling
/// `content` until someone resets it.
pub fn render_in<E, F>(boundary: &mut ErrorBoundary, content: F) -> Response
where
    E: std::fmt::Display,
    F: FnOnce() -> Result<String, E>,
{
    boundary.render(
        || content().map(|html| Html(html).into_response()),
        |caught| AppError::Render(caught.clone()).into_response(),
    )
}
