use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

use super::csrf::{xsrf_from_headers, CSRF_COOKIE_PATH, XSRF_HEADER};
use super::response::map_status;
use crate::api::FederationApi;
use crate::config::ClientConfig;
use crate::error::{FederationError, Result};
use crate::invitation::{AvailableEntities, Invitation, InvitationRequest};
use crate::record::RegistrantRecord;
use crate::session::{sign_in_required, MemorySessionStore, SessionStore, AUTH_PROBE_PATH};
use crate::submission::{Attachment, SubmissionPayload};
use crate::types::{
    AdminDeletion, AuthSession, AuthUser, Credentials, CustomFieldAdded, CustomFieldCheck,
    CustomFieldRequest, DataEnvelope, FieldType, QuickRegistration,
};

/// HTTP client for the federation REST API.
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Arc<dyn SessionStore>,
    csrf: RwLock<Option<String>>,
    current_view: RwLock<String>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = Client::builder()
            .cookie_store(true)
            .timeout(config.http_timeout)
            .build()?;

        let session: Arc<dyn SessionStore> = match &config.api_token {
            Some(token) => Arc::new(MemorySessionStore::with_token(token.clone())),
            None => Arc::new(MemorySessionStore::new()),
        };

        Ok(Self {
            http,
            base_url: config.api_url.clone(),
            session,
            csrf: RwLock::new(None),
            current_view: RwLock::new("/".to_string()),
        })
    }

    /// Create from `FEDERATION_API_URL` and friends.
    pub fn from_env() -> Result<Self> {
        Self::new(&ClientConfig::from_env()?)
    }

    /// Replace the token store, e.g. with one backed by persistent storage.
    pub fn with_session(mut self, session: Arc<dyn SessionStore>) -> Self {
        self.session = session;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Record the view the user is on; a 401 on an auth view does not ask
    /// for a sign-in redirect.
    pub fn set_current_view(&self, path: impl Into<String>) {
        *self
            .current_view
            .write()
            .unwrap_or_else(PoisonError::into_inner) = path.into();
    }

    fn current_view(&self) -> String {
        self.current_view
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn csrf_token(&self) -> Option<String> {
        self.csrf
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Fetch a fresh CSRF cookie and remember its token.
    pub async fn refresh_csrf(&self) -> Result<()> {
        debug!("Fetching CSRF cookie");
        let resp = self
            .http
            .get(self.url(CSRF_COOKIE_PATH))
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(map_status(status.as_u16(), &body, false));
        }

        let token = xsrf_from_headers(resp.headers());
        if token.is_none() {
            warn!("CSRF endpoint did not set an XSRF-TOKEN cookie");
        }
        *self.csrf.write().unwrap_or_else(PoisonError::into_inner) = token;
        Ok(())
    }

    /// Send a request built by `build`, retrying once after a CSRF refresh
    /// on 419. `build` runs once per attempt so bodies that cannot be
    /// cloned (multipart) are rebuilt.
    async fn execute<F>(&self, method: Method, path: &str, build: F) -> Result<Response>
    where
        F: Fn(RequestBuilder) -> Result<RequestBuilder> + Send + Sync,
    {
        let mutating = !matches!(method, Method::GET | Method::HEAD);
        if mutating && self.csrf_token().is_none() {
            self.refresh_csrf().await?;
        }

        let mut retried = false;
        loop {
            let mut request = self
                .http
                .request(method.clone(), self.url(path))
                .header(ACCEPT, "application/json")
                .header("X-Requested-With", "XMLHttpRequest");
            if let Some(token) = self.session.token() {
                request = request.bearer_auth(token);
            }
            if mutating {
                if let Some(csrf) = self.csrf_token() {
                    request = request.header(XSRF_HEADER, csrf);
                }
            }

            let resp = build(request)?.send().await?;
            let status = resp.status();
            if status.is_success() {
                return Ok(resp);
            }

            if status.as_u16() == 419 && mutating && !retried {
                warn!(path, "CSRF token mismatch, refreshing and retrying once");
                self.refresh_csrf().await?;
                retried = true;
                continue;
            }

            let body = resp.text().await.unwrap_or_default();
            let error = map_status(
                status.as_u16(),
                &body,
                sign_in_required(&self.current_view(), path),
            );
            if matches!(error, FederationError::Unauthorized { .. }) {
                self.session.clear();
            }
            warn!(path, status = status.as_u16(), error = %error, "API request failed");
            return Err(error);
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self.execute(Method::GET, path, Ok).await?;
        read_json(resp).await
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self
            .execute(method, path, |request| Ok(request.json(body)))
            .await?;
        read_json(resp).await
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub async fn login(&self, credentials: &Credentials) -> Result<AuthSession> {
        let session: AuthSession = self
            .send_json(Method::POST, "/api/auth/login", credentials)
            .await?;
        self.session.store(&session.token);
        info!(user_id = session.user.id, "Signed in");
        Ok(session)
    }

    /// Sign out. The local token is cleared even if the call fails.
    pub async fn logout(&self) -> Result<()> {
        let result = self
            .execute(Method::POST, "/api/auth/logout", Ok)
            .await
            .map(|_| ());
        self.session.clear();
        result
    }

    /// The signed-in user. A 401 here never asks for a sign-in redirect.
    pub async fn me(&self) -> Result<AuthUser> {
        let resp = self.execute(Method::GET, AUTH_PROBE_PATH, Ok).await?;
        read_enveloped(resp).await
    }

    // =========================================================================
    // Administration
    // =========================================================================

    /// Delete a league and everything under it, by exact name.
    pub async fn delete_league(&self, name: &str) -> Result<AdminDeletion> {
        let path = league_deletion_path(name);
        let resp = self.execute(Method::DELETE, &path, Ok).await?;
        read_json(resp).await
    }
}

/// `DELETE` path for a league, name percent-encoded.
pub fn league_deletion_path(name: &str) -> String {
    format!("/api/admin/leagues/{}", urlencoding::encode(name.trim()))
}

#[async_trait]
impl FederationApi for ApiClient {
    async fn dynamic_options(&self, field_type: FieldType) -> Result<Vec<String>> {
        self.get_json(&format!("/api/dynamic-options/{}", field_type))
            .await
    }

    async fn validate_custom_field(
        &self,
        field_type: FieldType,
        value: &str,
    ) -> Result<CustomFieldCheck> {
        let body = CustomFieldRequest { field_type, value };
        self.send_json(Method::POST, "/api/validate-custom-field", &body)
            .await
    }

    async fn add_custom_field(
        &self,
        field_type: FieldType,
        value: &str,
    ) -> Result<CustomFieldAdded> {
        let body = CustomFieldRequest { field_type, value };
        self.send_json(Method::POST, "/api/add-custom-field", &body)
            .await
    }

    async fn submit_registration(&self, payload: SubmissionPayload) -> Result<QuickRegistration> {
        const PATH: &str = "/api/registro-rapido";
        match payload {
            SubmissionPayload::Json(body) => self.send_json(Method::POST, PATH, &body).await,
            SubmissionPayload::Multipart { fields, attachment } => {
                let resp = self
                    .execute(Method::POST, PATH, |request| {
                        Ok(request.multipart(multipart_form(&fields, &attachment)?))
                    })
                    .await?;
                read_json(resp).await
            }
        }
    }

    async fn register(&self, record: &RegistrantRecord) -> Result<AuthSession> {
        let session: AuthSession = self
            .send_json(Method::POST, "/api/auth/register", record)
            .await?;
        self.session.store(&session.token);
        info!(user_id = session.user.id, "Registered and signed in");
        Ok(session)
    }

    async fn create_invitation(&self, request: &InvitationRequest) -> Result<Invitation> {
        let resp = self
            .execute(Method::POST, "/api/invitations", |builder| {
                Ok(builder.json(request))
            })
            .await?;
        read_enveloped(resp).await
    }

    async fn available_entities(&self) -> Result<AvailableEntities> {
        let resp = self
            .execute(Method::GET, "/api/invitations/available-entities", Ok)
            .await?;
        read_enveloped(resp).await
    }
}

fn multipart_form(fields: &[(String, String)], attachment: &Attachment) -> Result<Form> {
    let part = Part::bytes(attachment.bytes.clone())
        .file_name(attachment.file_name.clone())
        .mime_str(&attachment.content_type)?;

    let form = fields
        .iter()
        .fold(Form::new(), |form, (name, value)| {
            form.text(name.clone(), value.clone())
        });
    Ok(form.part(attachment.field.clone(), part))
}

async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| FederationError::Parse(e.to_string()))
}

/// Some endpoints wrap their payload in `{ "data": ... }`; accept both.
#[derive(Deserialize)]
#[serde(untagged)]
enum MaybeEnveloped<T> {
    Wrapped(DataEnvelope<T>),
    Bare(T),
}

async fn read_enveloped<T: DeserializeOwned>(resp: Response) -> Result<T> {
    Ok(match read_json::<MaybeEnveloped<T>>(resp).await? {
        MaybeEnveloped::Wrapped(envelope) => envelope.data,
        MaybeEnveloped::Bare(value) => value,
    })
}
