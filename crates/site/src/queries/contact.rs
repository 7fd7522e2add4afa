//! Contact form submission and the admin view of submissions.

use std::time::Duration;

use lekas_core::{ContactForm, ContactId, ContactStatus, ContactSubmission};
use tracing::{info, instrument, warn};

use crate::api::ContactService;
use crate::query::{QueryClient, QueryError, keys};

const SUBMISSIONS_STALE_TIME: Duration = Duration::from_secs(2 * 60);

#[derive(Clone)]
pub struct ContactQueries {
    client: QueryClient,
    service: ContactService,
}

impl ContactQueries {
    #[must_use]
    pub const fn new(client: QueryClient, service: ContactService) -> Self {
        Self { client, service }
    }

    /// Send a validated form. Cached submission listings go stale.
    ///
    /// # Errors
    ///
    /// Returns the mutation error.
    #[instrument(skip(self, form))]
    pub async fn submit(&self, form: &ContactForm) -> Result<ContactSubmission, QueryError> {
        let submission = self.client.mutate(|| self.service.submit(form)).await?;
        info!(contact_id = %submission.id, "Contact form submitted");

        self.client.invalidate_queries(&keys::contact()).await;
        Ok(submission)
    }

    /// All submissions, fresh for two minutes.
    ///
    /// # Errors
    ///
    /// Returns the fetch error when nothing is cached.
    #[instrument(skip(self))]
    pub async fn submissions(&self) -> Result<Vec<ContactSubmission>, QueryError> {
        let service = self.service.clone();
        self.client
            .fetch_query_with(keys::contact(), SUBMISSIONS_STALE_TIME, move || {
                let service = service.clone();
                async move { service.submissions().await }
            })
            .await
    }

    /// # Errors
    ///
    /// Returns the fetch error when nothing is cached.
    #[instrument(skip(self))]
    pub async fn submission(&self, id: ContactId) -> Result<ContactSubmission, QueryError> {
        let service = self.service.clone();
        self.client
            .fetch_query(keys::contact_submission(id), move || {
                let service = service.clone();
                async move { service.get(id).await }
            })
            .await
    }

    /// Move a submission to `status`. Any transition is allowed.
    ///
    /// # Errors
    ///
    /// Returns the mutation error; the cache is untouched in that case.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: ContactId,
        status: ContactStatus,
    ) -> Result<ContactSubmission, QueryError> {
        let key = keys::contact_submission(id);
        if let Some(previous) = self.client.get_query_data::<ContactSubmission>(&key).await
            && status.is_backward_from(previous.status)
        {
            warn!(contact_id = %id, from = %previous.status, to = %status, "Contact status moved backwards");
        }

        let submission = self
            .client
            .mutate(|| self.service.update_status(id, status))
            .await?;

        self.client.invalidate_queries(&keys::contact()).await;
        self.client.set_query_data(key, submission.clone()).await;
        Ok(submission)
    }
}
