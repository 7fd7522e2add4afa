//! `/contact` endpoints.

use lekas_core::{ContactForm, ContactId, ContactStatus, ContactSubmission};
use serde::Serialize;
use tracing::instrument;

use crate::api::{ApiClient, ApiResult};

#[derive(Serialize)]
struct StatusUpdate {
    status: ContactStatus,
}

/// Contact form endpoints.
#[derive(Clone)]
pub struct ContactService {
    client: ApiClient,
}

impl ContactService {
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// `POST /contact`.
    ///
    /// # Errors
    ///
    /// Returns the normalized API error.
    #[instrument(skip(self, form), fields(subject = %form.subject))]
    pub async fn submit(&self, form: &ContactForm) -> ApiResult<ContactSubmission> {
        self.client.post("/contact", form).await
    }

    /// `GET /contact/submissions`.
    ///
    /// # Errors
    ///
    /// Returns the normalized API error.
    #[instrument(skip(self))]
    pub async fn submissions(&self) -> ApiResult<Vec<ContactSubmission>> {
        self.client.get("/contact/submissions").await
    }

    /// `GET /contact/{id}`.
    ///
    /// # Errors
    ///
    /// Returns the normalized API error.
    #[instrument(skip(self))]
    pub async fn get(&self, id: ContactId) -> ApiResult<ContactSubmission> {
        self.client.get(&format!("/contact/{id}")).await
    }

    /// `PATCH /contact/{id}` with `{"status": ...}`.
    ///
    /// Any status may follow any other.
    ///
    /// # Errors
    ///
    /// Returns the normalized API error.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: ContactId,
        status: ContactStatus,
    ) -> ApiResult<ContactSubmission> {
        self.client
            .patch(&format!("/contact/{id}"), &StatusUpdate { status })
            .await
    }
}
