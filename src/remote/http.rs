//! HTTP client for the books API
//!
//! Every request is authenticated with the session token in the
//! `Authorization` header. Endpoints:
//! - `GET /books` lists the library
//! - `PUT /books/{id}` with `{"shelf": ...}` moves a book
//! - `POST /search` with `{"query": ...}` searches the catalog

use async_trait::async_trait;
use reqwest::{header, Client, Response, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::{RemoteLibrary, SearchResponse, UpdateResponse};
use crate::{
    config::ApiConfig,
    error::{AppError, AppResult},
    models::{Book, ShelfId},
};

#[derive(Deserialize)]
struct BooksEnvelope<T> {
    books: T,
}

#[derive(Serialize)]
struct UpdateShelfRequest {
    shelf: ShelfId,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
}

#[derive(Clone)]
pub struct BooksApiClient {
    client: Client,
    base_url: Url,
    token: String,
}

impl BooksApiClient {
    pub fn new(config: &ApiConfig) -> AppResult<Self> {
        let base_url = Url::parse(&config.url)
            .map_err(|e| AppError::Internal(format!("Invalid API url {}: {}", config.url, e)))?;

        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            base_url,
            token: config.token_or_generate(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Internal(format!("API url cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header(header::ACCEPT, "application/json")
            .header(header::AUTHORIZATION, &self.token)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> AppResult<T> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AppError::UnexpectedStatus {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl RemoteLibrary for BooksApiClient {
    async fn get_all(&self) -> AppResult<Vec<Book>> {
        let url = self.endpoint(&["books"])?;
        tracing::debug!("GET {}", url);

        let response = self.request(reqwest::Method::GET, url).send().await?;
        let envelope: BooksEnvelope<Vec<Book>> = Self::decode(response).await?;
        Ok(envelope.books)
    }

    async fn update_shelf(&self, book_id: &str, shelf: ShelfId) -> AppResult<UpdateResponse> {
        let url = self.endpoint(&["books", book_id])?;
        tracing::debug!("PUT {} shelf={}", url, shelf);

        let response = self
            .request(reqwest::Method::PUT, url)
            .json(&UpdateShelfRequest { shelf })
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn search(&self, query: &str) -> AppResult<SearchResponse> {
        let url = self.endpoint(&["search"])?;
        tracing::debug!("POST {} query={:?}", url, query);

        let response = self
            .request(reqwest::Method::POST, url)
            .json(&SearchRequest { query })
            .send()
            .await?;
        let envelope: BooksEnvelope<SearchResponse> = Self::decode(response).await?;
        Ok(envelope.books)
    }
}
