//! `/posts` endpoints.

use lekas_core::{CreatePostRequest, Post, PostId, QueryParams, UpdatePostRequest, UserId};
use tracing::instrument;

use super::with_query;
use crate::api::{ApiClient, ApiResult};

/// Post endpoints.
#[derive(Clone)]
pub struct PostService {
    client: ApiClient,
}

impl PostService {
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// `GET /posts`, paged and filtered by `params`.
    ///
    /// # Errors
    ///
    /// Returns the normalized API error.
    #[instrument(skip(self))]
    pub async fn list(&self, params: &QueryParams) -> ApiResult<Vec<Post>> {
        self.client
            .get(&with_query("/posts", &params.to_query_pairs()))
            .await
    }

    /// `GET /posts/{id}`.
    ///
    /// # Errors
    ///
    /// Returns the normalized API error.
    #[instrument(skip(self))]
    pub async fn get(&self, id: PostId) -> ApiResult<Post> {
        self.client.get(&format!("/posts/{id}")).await
    }

    /// `GET /posts?userId={id}`.
    ///
    /// # Errors
    ///
    /// Returns the normalized API error.
    #[instrument(skip(self))]
    pub async fn by_user(&self, user_id: UserId) -> ApiResult<Vec<Post>> {
        self.client
            .get(&with_query("/posts", &[("userId", user_id.to_string())]))
            .await
    }

    /// `POST /posts`.
    ///
    /// # Errors
    ///
    /// Returns the normalized API error.
    #[instrument(skip(self, request))]
    pub async fn create(&self, request: &CreatePostRequest) -> ApiResult<Post> {
        self.client.post("/posts", request).await
    }

    /// `PUT /posts/{id}`.
    ///
    /// # Errors
    ///
    /// Returns the normalized API error.
    #[instrument(skip(self, request))]
    pub async fn update(&self, id: PostId, request: &UpdatePostRequest) -> ApiResult<Post> {
        self.client.put(&format!("/posts/{id}"), request).await
    }

    /// `DELETE /posts/{id}`.
    ///
    /// # Errors
    ///
    /// Returns the normalized API error.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: PostId) -> ApiResult<()> {
        self.client.delete(&format!("/posts/{id}")).await
    }
}
