//! HTTP layer: every request the client makes goes through [`ApiClient`].
//!
//! The error taxonomy is fixed: a 401 becomes [`ApiError::Unauthorized`] so
//! the command layer can drop the session, any other non-2xx surfaces the
//! backend's `detail` verbatim, and transport failures collapse into one
//! generic connection message.

use reqwest::{multipart, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use shared::usuario::Detalhe;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The stored token no longer works; the session must be cleared.
    #[error("Sessão expirada ou inválida")]
    Unauthorized,

    /// Non-2xx answer with the backend's own message.
    #[error("{detail}")]
    Api { status: StatusCode, detail: String },

    #[error("Erro de conexão com o servidor")]
    Network(#[from] reqwest::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = self.http.request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let resp = self.request(Method::GET, path).send().await?;
        Self::parse(resp).await
    }

    pub async fn get_query<T, Q>(&self, path: &str, query: &Q) -> ApiResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let resp = self.request(Method::GET, path).query(query).send().await?;
        Self::parse(resp).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let resp = self.request(Method::POST, path).json(body).send().await?;
        Self::parse(resp).await
    }

    /// POST without a body, for endpoints that only care about the caller
    /// (heartbeat). The answer body is ignored.
    pub async fn post_vazio(&self, path: &str) -> ApiResult<()> {
        let resp = self.request(Method::POST, path).send().await?;
        Self::checar(resp).await?;
        Ok(())
    }

    /// POST outside the session (login). A 401 here means wrong credentials,
    /// not an expired session, so the backend detail is kept.
    pub async fn post_publico<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let resp = self.http
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Self::erro_da_resposta(resp).await);
        }
        Ok(resp.json().await?)
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let resp = self.request(Method::PUT, path).json(body).send().await?;
        Self::parse(resp).await
    }

    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        let resp = self.request(Method::DELETE, path).send().await?;
        Self::checar(resp).await?;
        Ok(())
    }

    /// Multipart upload of a single file under the `file` field.
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        nome: &str,
        mime: &str,
        bytes: Vec<u8>,
    ) -> ApiResult<T> {
        let parte = multipart::Part::bytes(bytes)
            .file_name(nome.to_string())
            .mime_str(mime)?;
        let form = multipart::Form::new().part("file", parte);
        let resp = self
            .request(Method::POST, path)
            .multipart(form)
            .send()
            .await?;
        Self::parse(resp).await
    }

    /// Raw download (Excel/PDF exports).
    pub async fn download(&self, path: &str) -> ApiResult<Vec<u8>> {
        let resp = self.request(Method::GET, path).send().await?;
        let resp = Self::checar(resp).await?;
        Ok(resp.bytes().await?.to_vec())
    }

    async fn parse<T: DeserializeOwned>(resp: Response) -> ApiResult<T> {
        let resp = Self::checar(resp).await?;
        Ok(resp.json().await?)
    }

    async fn checar(resp: Response) -> ApiResult<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        Err(Self::erro_da_resposta(resp).await)
    }

    async fn erro_da_resposta(resp: Response) -> ApiError {
        let status = resp.status();
        let detail = match resp.json::<Detalhe>().await {
            Ok(corpo) => corpo.detail,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("Erro inesperado")
                .to_string(),
        };
        ApiError::Api { status, detail }
    }
}
