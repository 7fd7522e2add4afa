//! Cached user reads and the cache upkeep after user mutations.

use std::time::Duration;

use lekas_core::{CreateUserRequest, QueryParams, UpdateUserRequest, User, UserId};
use tracing::{instrument, warn};

use crate::api::UserService;
use crate::query::{QueryClient, QueryError, keys};

const USERS_STALE_TIME: Duration = Duration::from_secs(5 * 60);
const PROFILE_STALE_TIME: Duration = Duration::from_secs(10 * 60);

#[derive(Clone)]
pub struct UserQueries {
    client: QueryClient,
    service: UserService,
}

impl UserQueries {
    #[must_use]
    pub const fn new(client: QueryClient, service: UserService) -> Self {
        Self { client, service }
    }

    /// User list, fresh for five minutes.
    ///
    /// # Errors
    ///
    /// Returns the fetch error when nothing is cached.
    #[instrument(skip(self))]
    pub async fn users(&self, params: &QueryParams) -> Result<Vec<User>, QueryError> {
        let service = self.service.clone();
        let owned = params.clone();
        self.client
            .fetch_query_with(keys::users_list(params), USERS_STALE_TIME, move || {
                let service = service.clone();
                let params = owned.clone();
                async move { service.list(&params).await }
            })
            .await
    }

    /// One user, fresh for the default window.
    ///
    /// # Errors
    ///
    /// Returns the fetch error when nothing is cached.
    #[instrument(skip(self))]
    pub async fn user(&self, id: UserId) -> Result<User, QueryError> {
        let service = self.service.clone();
        self.client
            .fetch_query(keys::user(id), move || {
                let service = service.clone();
                async move { service.get(id).await }
            })
            .await
    }

    /// The signed-in user, fresh for ten minutes.
    ///
    /// # Errors
    ///
    /// Returns the fetch error when nothing is cached.
    #[instrument(skip(self))]
    pub async fn profile(&self) -> Result<User, QueryError> {
        let service = self.service.clone();
        self.client
            .fetch_query_with(keys::user_profile(), PROFILE_STALE_TIME, move || {
                let service = service.clone();
                async move { service.profile().await }
            })
            .await
    }

    /// Create a user; lists go stale and the new user is cached.
    ///
    /// # Errors
    ///
    /// Returns the mutation error; the cache is untouched in that case.
    #[instrument(skip(self, request))]
    pub async fn create(&self, request: &CreateUserRequest) -> Result<User, QueryError> {
        let user = self.client.mutate(|| self.service.create(request)).await?;

        self.client.invalidate_queries(&keys::users()).await;
        self.client
            .set_query_data(keys::user(user.id), user.clone())
            .await;
        Ok(user)
    }

    /// Replace a user; lists go stale and the detail is overwritten.
    ///
    /// # Errors
    ///
    /// Returns the mutation error; the cache is untouched in that case.
    #[instrument(skip(self, request))]
    pub async fn update(&self, id: UserId, request: &UpdateUserRequest) -> Result<User, QueryError> {
        let user = self.client.mutate(|| self.service.update(id, request)).await?;

        self.client.invalidate_queries(&keys::users()).await;
        self.client.set_query_data(keys::user(id), user.clone()).await;
        Ok(user)
    }

    /// Delete a user and forget its cached detail.
    ///
    /// # Errors
    ///
    /// Returns the mutation error; the cache is untouched in that case.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: UserId) -> Result<(), QueryError> {
        self.client.mutate(|| self.service.delete(id)).await?;

        self.client.remove_queries(&keys::user(id)).await;
        self.client.invalidate_queries(&keys::users()).await;
        Ok(())
    }

    /// Update a user, showing the change in the cache before the API
    /// confirms it.
    ///
    /// In-flight reads of the user are detached first so they cannot
    /// overwrite the optimistic value. On failure the previous value is
    /// restored. Either way the detail is invalidated afterwards.
    ///
    /// # Errors
    ///
    /// Returns the mutation error after rolling back.
    #[instrument(skip(self, request))]
    pub async fn optimistic_update(
        &self,
        id: UserId,
        request: &UpdateUserRequest,
    ) -> Result<User, QueryError> {
        let key = keys::user(id);
        self.client.cancel_queries(&key).await;

        let previous: Option<User> = self.client.get_query_data(&key).await;
        if let Some(previous) = &previous {
            self.client
                .set_query_data(key.clone(), request.apply_to(previous))
                .await;
        }

        let result = self.client.mutate(|| self.service.update(id, request)).await;

        if let (Err(err), Some(previous)) = (&result, previous) {
            warn!(user_id = %id, error = %err, "Update failed, rolling back");
            self.client.set_query_data(key.clone(), previous).await;
        }
        self.client.invalidate_queries(&key).await;
        result
    }
}
