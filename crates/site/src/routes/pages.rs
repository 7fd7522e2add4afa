//! Static marketing pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Router, extract::State, response::Response, routing::get};
use tracing::instrument;

use crate::layout::{Layout, render};
use crate::seo::PageMeta;
use crate::state::AppState;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
}

#[derive(Template, WebTemplate)]
#[template(path = "pages/about.html")]
pub struct AboutTemplate {
    pub layout: Layout,
}

#[derive(Template, WebTemplate)]
#[template(path = "pages/service.html")]
pub struct ServiceTemplate {
    pub layout: Layout,
}

/// Placeholder page under the main layout.
#[derive(Template, WebTemplate)]
#[template(path = "pages/placeholder.html")]
pub struct PlaceholderTemplate {
    pub layout: Layout,
}

/// Display the home page.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Response {
    let meta = PageMeta::new("/")
        .title("Lekas - Professional Services & Business Solutions")
        .description(
            "Transform your business with Lekas's expert professional services. We provide \
             comprehensive business solutions, consulting, and strategic guidance to help your \
             company achieve sustainable growth and success.",
        )
        .keywords(
            "lekas, professional services, business consulting, strategic planning, business \
             solutions, corporate consulting, business growth, expert advice",
        );

    render(&HomeTemplate {
        layout: Layout::new(&state, &meta),
    })
}

/// Display the about page.
#[instrument(skip(state))]
pub async fn about(State(state): State<AppState>) -> Response {
    let meta = PageMeta::new("/about-us")
        .title("About Us - Lekas Professional Services")
        .description(
            "Learn about Lekas's journey, mission, and values. Discover how our experienced \
             team of professionals helps businesses achieve their goals through innovative \
             solutions and expert guidance.",
        )
        .keywords(
            "about lekas, company history, mission, values, professional team, business \
             expertise, company culture",
        );

    render(&AboutTemplate {
        layout: Layout::new(&state, &meta),
    })
}

/// Display the services page.
#[instrument(skip(state))]
pub async fn service(State(state): State<AppState>) -> Response {
    let meta = PageMeta::new("/service")
        .title("Our Services - Lekas Professional Solutions")
        .description(
            "Explore Lekas's comprehensive range of professional services designed to \
             accelerate your business growth. From strategic consulting to implementation \
             support, we deliver results that matter.",
        )
        .keywords(
            "lekas services, business consulting, professional services, strategic consulting, \
             business solutions, consulting services, expert guidance",
        );

    render(&ServiceTemplate {
        layout: Layout::new(&state, &meta),
    })
}

/// Display the placeholder page.
#[instrument(skip(state))]
pub async fn placeholder(State(state): State<AppState>) -> Response {
    render(&PlaceholderTemplate {
        layout: Layout::new(&state, &PageMeta::new("/page")),
    })
}

/// Create the pages routes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/about-us", get(about))
        .route("/service", get(service))
        .route("/page", get(placeholder))
}
