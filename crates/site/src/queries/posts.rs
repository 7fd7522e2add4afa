//! Cached post reads and the cache upkeep after post mutations.

use std::time::Duration;

use lekas_core::{CreatePostRequest, Post, PostId, QueryParams, UpdatePostRequest, UserId};
use tracing::instrument;

use crate::api::PostService;
use crate::query::{QueryClient, QueryError, keys};

const POSTS_STALE_TIME: Duration = Duration::from_secs(3 * 60);
const POSTS_BY_USER_STALE_TIME: Duration = Duration::from_secs(5 * 60);

#[derive(Clone)]
pub struct PostQueries {
    client: QueryClient,
    service: PostService,
}

impl PostQueries {
    #[must_use]
    pub const fn new(client: QueryClient, service: PostService) -> Self {
        Self { client, service }
    }

    /// Post list, fresh for three minutes.
    ///
    /// # Errors
    ///
    /// Returns the fetch error when nothing is cached.
    #[instrument(skip(self))]
    pub async fn posts(&self, params: &QueryParams) -> Result<Vec<Post>, QueryError> {
        let service = self.service.clone();
        let owned = params.clone();
        self.client
            .fetch_query_with(keys::posts_list(params), POSTS_STALE_TIME, move || {
                let service = service.clone();
                let params = owned.clone();
                async move { service.list(&params).await }
            })
            .await
    }

    /// # Errors
    ///
    /// Returns the fetch error when nothing is cached.
    #[instrument(skip(self))]
    pub async fn post(&self, id: PostId) -> Result<Post, QueryError> {
        let service = self.service.clone();
        self.client
            .fetch_query(keys::post(id), move || {
                let service = service.clone();
                async move { service.get(id).await }
            })
            .await
    }

    /// Posts written by one user, fresh for five minutes.
    ///
    /// # Errors
    ///
    /// Returns the fetch error when nothing is cached.
    #[instrument(skip(self))]
    pub async fn posts_by_user(&self, user_id: UserId) -> Result<Vec<Post>, QueryError> {
        let service = self.service.clone();
        self.client
            .fetch_query_with(
                keys::posts_by_user(user_id),
                POSTS_BY_USER_STALE_TIME,
                move || {
                    let service = service.clone();
                    async move { service.by_user(user_id).await }
                },
            )
            .await
    }

    /// # Errors
    ///
    /// Returns the mutation error; the cache is untouched in that case.
    #[instrument(skip(self, request))]
    pub async fn create(&self, request: &CreatePostRequest) -> Result<Post, QueryError> {
        let post = self.client.mutate(|| self.service.create(request)).await?;
        self.store(&post).await;
        Ok(post)
    }

    /// # Errors
    ///
    /// Returns the mutation error; the cache is untouched in that case.
    #[instrument(skip(self, request))]
    pub async fn update(&self, id: PostId, request: &UpdatePostRequest) -> Result<Post, QueryError> {
        let post = self.client.mutate(|| self.service.update(id, request)).await?;
        self.store(&post).await;
        Ok(post)
    }

    /// # Errors
    ///
    /// Returns the mutation error; the cache is untouched in that case.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: PostId) -> Result<(), QueryError> {
        self.client.mutate(|| self.service.delete(id)).await?;

        self.client.remove_queries(&keys::post(id)).await;
        self.client.invalidate_queries(&keys::posts()).await;
        Ok(())
    }

    /// Stale the lists this post appears in, then cache the post itself.
    async fn store(&self, post: &Post) {
        self.client.invalidate_queries(&keys::posts()).await;
        self.client
            .invalidate_queries(&keys::posts_by_user(post.user_id))
            .await;
        self.client.set_query_data(keys::post(post.id), post.clone()).await;
    }
}
