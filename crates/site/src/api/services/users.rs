//! `/users` endpoints.

use lekas_core::{CreateUserRequest, QueryParams, UpdateUserRequest, User, UserId};
use tracing::instrument;

use super::with_query;
use crate::api::{ApiClient, ApiResult};

/// User endpoints.
#[derive(Clone)]
pub struct UserService {
    client: ApiClient,
}

impl UserService {
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// `GET /users`, paged and filtered by `params`.
    ///
    /// # Errors
    ///
    /// Returns the normalized API error.
    #[instrument(skip(self))]
    pub async fn list(&self, params: &QueryParams) -> ApiResult<Vec<User>> {
        self.client
            .get(&with_query("/users", &params.to_query_pairs()))
            .await
    }

    /// `GET /users/{id}`.
    ///
    /// # Errors
    ///
    /// Returns the normalized API error.
    #[instrument(skip(self))]
    pub async fn get(&self, id: UserId) -> ApiResult<User> {
        self.client.get(&format!("/users/{id}")).await
    }

    /// `POST /users`.
    ///
    /// # Errors
    ///
    /// Returns the normalized API error.
    #[instrument(skip(self, request))]
    pub async fn create(&self, request: &CreateUserRequest) -> ApiResult<User> {
        self.client.post("/users", request).await
    }

    /// `PUT /users/{id}`.
    ///
    /// # Errors
    ///
    /// Returns the normalized API error.
    #[instrument(skip(self, request))]
    pub async fn update(&self, id: UserId, request: &UpdateUserRequest) -> ApiResult<User> {
        self.client.put(&format!("/users/{id}"), request).await
    }

    /// `PATCH /users/{id}`.
    ///
    /// # Errors
    ///
    /// Returns the normalized API error.
    #[instrument(skip(self, request))]
    pub async fn patch(&self, id: UserId, request: &UpdateUserRequest) -> ApiResult<User> {
        self.client.patch(&format!("/users/{id}"), request).await
    }

    /// `DELETE /users/{id}`.
    ///
    /// # Errors
    ///
    /// Returns the normalized API error.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: UserId) -> ApiResult<()> {
        self.client.delete(&format!("/users/{id}")).await
    }

    /// `GET /users/me`: the user the stored token belongs to.
    ///
    /// # Errors
    ///
    /// Returns the normalized API error; a 401 also clears the token.
    #[instrument(skip(self))]
    pub async fn profile(&self) -> ApiResult<User> {
        self.client.get("/users/me").await
    }
}
