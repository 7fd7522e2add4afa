//! Contact page and form submission.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::Response,
    routing::get,
};
use lekas_core::ContactForm;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::layout::{Layout, render};
use crate::query::QueryError;
use crate::seo::PageMeta;
use crate::state::AppState;

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/contact.html")]
pub struct ContactTemplate {
    pub layout: Layout,
    /// Values to refill the form with
    pub form: ContactForm,
    pub success: bool,
    pub error: Option<String>,
}

fn contact_meta() -> PageMeta {
    PageMeta::new("/contact")
        .title("Contact Us - Lekas Professional Services")
        .description(
            "Get in touch with Lekas for expert professional services and business consulting. \
             Contact our team today to discuss how we can help your business achieve its goals \
             and drive sustainable growth.",
        )
        .keywords(
            "contact lekas, business inquiry, professional consultation, get in touch, business \
             contact, consulting inquiry",
        )
}

fn page(state: &AppState, form: ContactForm, success: bool, error: Option<String>) -> ContactTemplate {
    ContactTemplate {
        layout: Layout::new(state, &contact_meta()),
        form,
        success,
        error,
    }
}

/// Replace the status of a successfully rendered page.
fn with_status(mut response: Response, status: StatusCode) -> Response {
    if response.status().is_success() {
        *response.status_mut() = status;
    }
    response
}

/// Display the contact page.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Response {
    render(&page(&state, ContactForm::default(), false, None))
}

/// Validate and submit the contact form.
///
/// Invalid input re-renders the form with a 400; an API failure re-renders
/// it with a 502 so the visitor keeps what they typed.
///
/// # Errors
///
/// Returns [`AppError::Api`] when the API rejects our credentials, which
/// redirects to the login route.
#[instrument(skip(state, form), fields(subject = %form.subject))]
pub async fn submit(State(state): State<AppState>, Form(form): Form<ContactForm>) -> Result<Response> {
    let submitted = form.clone();
    let form = match form.validated() {
        Ok(form) => form,
        Err(e) => {
            tracing::debug!(error = %e, "Contact form rejected");
            let response = render(&page(&state, submitted, false, Some(e.to_string())));
            return Ok(with_status(response, StatusCode::BAD_REQUEST));
        }
    };

    match state.contact().submit(&form).await {
        Ok(_) => Ok(render(&page(&state, ContactForm::default(), true, None))),
        Err(QueryError::Api(e)) if e.is_unauthorized() => Err(AppError::Api(e)),
        Err(e) => {
            tracing::warn!(error = %e, "Contact form submission failed");
            let message = "Failed to submit contact form. Please try again.".to_string();
            let response = render(&page(&state, form, false, Some(message)));
            Ok(with_status(response, StatusCode::BAD_GATEWAY))
        }
    }
}

/// Create the contact routes router.
pub fn router() -> Router<AppState> {
    Router::new().route("/contact", get(show).post(submit))
}
