//! Async client for the Swagger Petstore demo API.
//!
//! Responses are returned with their status code instead of being turned
//! into errors, so checks can assert on 404s and 405s as easily as on
//! 200s. Use [`ApiResponse::into_body`] when only success matters.

use crate::result::{ProbeError, ProbeResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Public Petstore instance
pub const DEFAULT_PETSTORE_URL: &str = "https://petstore.swagger.io/v2";

/// User-Agent sent with every request
pub const USER_AGENT: &str = concat!("cura-probe/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// MODELS
// =============================================================================

/// Pet availability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetStatus {
    /// In stock
    Available,
    /// Reserved
    Pending,
    /// Gone
    Sold,
}

impl PetStatus {
    /// Wire name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Pending => "pending",
            Self::Sold => "sold",
        }
    }
}

impl fmt::Display for PetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pet category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Category name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Pet tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Tag name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A pet record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    /// Pet id; assigned by the server when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    /// Name
    #[serde(default)]
    pub name: String,
    /// Photo URLs
    #[serde(default)]
    pub photo_urls: Vec<String>,
    /// Tags
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Availability
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PetStatus>,
}

impl Pet {
    /// A pet with a name and nothing else
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            category: None,
            name: name.into(),
            photo_urls: Vec::new(),
            tags: Vec::new(),
            status: None,
        }
    }

    /// Set the id
    #[must_use]
    pub const fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the status
    #[must_use]
    pub const fn with_status(mut self, status: PetStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the category name
    #[must_use]
    pub fn with_category(mut self, id: i64, name: impl Into<String>) -> Self {
        self.category = Some(Category {
            id: Some(id),
            name: Some(name.into()),
        });
        self
    }

    /// Add a photo URL
    #[must_use]
    pub fn with_photo_url(mut self, url: impl Into<String>) -> Self {
        self.photo_urls.push(url.into());
        self
    }
}

/// A store user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Login name
    pub username: String,
    /// First name
    #[serde(default)]
    pub first_name: String,
    /// Last name
    #[serde(default)]
    pub last_name: String,
    /// Email address
    #[serde(default)]
    pub email: String,
    /// Password
    #[serde(default)]
    pub password: String,
    /// Phone number
    #[serde(default)]
    pub phone: String,
    /// Status flag
    #[serde(default)]
    pub user_status: i32,
}

/// Generic `{code, type, message}` reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    /// Numeric code
    #[serde(default)]
    pub code: i32,
    /// Message type (`unknown`, `error`, ...)
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Message text
    #[serde(default)]
    pub message: String,
}

/// Status, decoded body (on success) and raw text of a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse<T> {
    /// HTTP status code
    pub status: u16,
    /// Decoded body for a 2xx reply with content
    pub body: Option<T>,
    /// Raw response text
    pub raw: String,
}

impl<T> ApiResponse<T> {
    /// Whether the status is 2xx
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// The body of a successful reply
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Api`] for a non-2xx status or an empty body.
    pub fn into_body(self) -> ProbeResult<T> {
        match self.body {
            Some(body) if self.is_success() => Ok(body),
            _ => Err(ProbeError::Api {
                status: self.status,
                body: self.raw,
            }),
        }
    }

    /// Parse the raw text as an [`ApiMessage`], whatever the status
    #[must_use]
    pub fn message(&self) -> Option<ApiMessage> {
        serde_json::from_str(&self.raw).ok()
    }
}

// =============================================================================
// CLIENT
// =============================================================================

/// Petstore REST client
#[derive(Debug, Clone)]
pub struct PetstoreClient {
    base_url: String,
    client: reqwest::Client,
}

impl PetstoreClient {
    /// Create a client for `base_url` with a 30 s timeout and the
    /// crate's User-Agent
    ///
    /// # Errors
    ///
    /// Returns [`crate::ProbeError::Http`] if the TLS backend cannot be
    /// initialized.
    pub fn new(base_url: impl Into<String>) -> ProbeResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self::with_client(base_url, client))
    }

    /// Create a client over a preconfigured `reqwest::Client`
    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Base URL without trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> ProbeResult<ApiResponse<T>> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let raw = response.text().await?;
        debug!(status, bytes = raw.len(), "petstore response");
        let body = if (200..300).contains(&status) && !raw.trim().is_empty() {
            Some(serde_json::from_str(&raw)?)
        } else {
            None
        };
        Ok(ApiResponse { status, body, raw })
    }

    /// `POST /pet`
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors; HTTP statuses are in the response.
    pub async fn add_pet(&self, pet: &Pet) -> ProbeResult<ApiResponse<Pet>> {
        info!(name = %pet.name, "adding pet");
        self.send(self.client.post(self.url("/pet")).json(pet)).await
    }

    /// `GET /pet/{id}`
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors; HTTP statuses are in the response.
    pub async fn get_pet(&self, pet_id: i64) -> ProbeResult<ApiResponse<Pet>> {
        self.send(self.client.get(self.url(&format!("/pet/{pet_id}"))))
            .await
    }

    /// `PUT /pet`
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors; HTTP statuses are in the response.
    pub async fn update_pet(&self, pet: &Pet) -> ProbeResult<ApiResponse<Pet>> {
        info!(id = ?pet.id, "updating pet");
        self.send(self.client.put(self.url("/pet")).json(pet)).await
    }

    /// `GET /pet/findByStatus?status=..`
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors; HTTP statuses are in the response.
    pub async fn find_by_status(&self, status: PetStatus) -> ProbeResult<ApiResponse<Vec<Pet>>> {
        self.send(
            self.client
                .get(self.url("/pet/findByStatus"))
                .query(&[("status", status.as_str())]),
        )
        .await
    }

    /// `DELETE /pet/{id}`
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors; HTTP statuses are in the response.
    pub async fn delete_pet(&self, pet_id: i64) -> ProbeResult<ApiResponse<ApiMessage>> {
        info!(pet_id, "deleting pet");
        self.send(self.client.delete(self.url(&format!("/pet/{pet_id}"))))
            .await
    }

    /// Delete a pet during cleanup. Failures are logged and reported as
    /// `false`, never raised.
    pub async fn delete_pet_best_effort(&self, pet_id: i64) -> bool {
        match self.delete_pet(pet_id).await {
            Ok(response) if response.is_success() => true,
            Ok(response) => {
                warn!(pet_id, status = response.status, "cleanup delete rejected");
                false
            }
            Err(e) => {
                warn!(pet_id, error = %e, "cleanup delete failed");
                false
            }
        }
    }

    /// `POST /pet/{id}/uploadImage` as multipart form data
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors; HTTP statuses are in the response.
    pub async fn upload_image(
        &self,
        pet_id: i64,
        file_name: &str,
        bytes: Vec<u8>,
        metadata: Option<&str>,
    ) -> ProbeResult<ApiResponse<ApiMessage>> {
        info!(pet_id, file_name, size = bytes.len(), "uploading pet image");
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_for(file_name))?;
        let mut form = reqwest::multipart::Form::new().part("file", part);
        if let Some(metadata) = metadata {
            form = form.text("additionalMetadata", metadata.to_string());
        }
        self.send(
            self.client
                .post(self.url(&format!("/pet/{pet_id}/uploadImage")))
                .multipart(form),
        )
        .await
    }

    /// `POST /user`
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors; HTTP statuses are in the response.
    pub async fn create_user(&self, user: &User) -> ProbeResult<ApiResponse<ApiMessage>> {
        info!(username = %user.username, "creating user");
        self.send(self.client.post(self.url("/user")).json(user)).await
    }

    /// `GET /user/{username}`
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors; HTTP statuses are in the response.
    pub async fn get_user(&self, username: &str) -> ProbeResult<ApiResponse<User>> {
        self.send(self.client.get(self.url(&format!("/user/{username}"))))
            .await
    }
}

fn mime_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    mod model_tests {
        use super::*;

        #[test]
        fn test_pet_wire_shape() {
            let pet = Pet::new("doggie")
                .with_id(12345)
                .with_status(PetStatus::Available)
                .with_photo_url("https://example.com/dog.jpg");
            let json = serde_json::to_value(&pet).unwrap();
            assert_eq!(json["photoUrls"][0], "https://example.com/dog.jpg");
            assert_eq!(json["status"], "available");
            assert!(json.get("category").is_none());
        }

        #[test]
        fn test_api_message_type_field() {
            let msg: ApiMessage =
                serde_json::from_str(r#"{"code":1,"type":"error","message":"Pet not found"}"#).unwrap();
            assert_eq!(msg.kind, "error");
            assert_eq!(msg.message, "Pet not found");
        }

        #[test]
        fn test_into_body_rejects_failure() {
            let response: ApiResponse<Pet> = ApiResponse {
                status: 404,
                body: None,
                raw: "not found".to_string(),
            };
            assert!(!response.is_success());
            let err = response.into_body().unwrap_err();
            assert!(matches!(err, ProbeError::Api { status: 404, .. }));
        }

        #[test]
        fn test_mime_for() {
            assert_eq!(mime_for("dog.JPG"), "image/jpeg");
            assert_eq!(mime_for("notes.txt"), "text/plain");
            assert_eq!(mime_for("blob"), "application/octet-stream");
        }
    }

    mod client_tests {
        use super::*;

        #[tokio::test]
        async fn test_add_pet() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/pet"))
                .and(header("user-agent", USER_AGENT))
                .and(body_partial_json(json!({ "name": "doggie", "status": "available" })))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "id": 12345, "name": "doggie", "photoUrls": [], "tags": [], "status": "available"
                })))
                .expect(1)
                .mount(&server)
                .await;

            let client = PetstoreClient::new(server.uri()).unwrap();
            let pet = Pet::new("doggie").with_status(PetStatus::Available);
            let response = client.add_pet(&pet).await.unwrap();
            assert_eq!(response.status, 200);
            assert_eq!(response.into_body().unwrap().id, Some(12345));
        }

        #[tokio::test]
        async fn test_update_pet_puts_whole_record() {
            let server = MockServer::start().await;
            Mock::given(method("PUT"))
                .and(path("/pet"))
                .and(body_partial_json(json!({ "id": 12345, "name": "doggie", "status": "sold" })))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "id": 12345, "name": "doggie", "photoUrls": [], "status": "sold"
                })))
                .expect(1)
                .mount(&server)
                .await;

            let client = PetstoreClient::new(server.uri()).unwrap();
            let pet = Pet::new("doggie").with_id(12345).with_status(PetStatus::Sold);
            let updated = client.update_pet(&pet).await.unwrap().into_body().unwrap();
            assert_eq!(updated.status, Some(PetStatus::Sold));
        }

        #[tokio::test]
        async fn test_get_missing_pet_keeps_status() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/pet/999999"))
                .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                    "code": 1, "type": "error", "message": "Pet not found"
                })))
                .mount(&server)
                .await;

            let response = PetstoreClient::new(server.uri()).unwrap().get_pet(999_999).await.unwrap();
            assert_eq!(response.status, 404);
            assert!(response.body.is_none());
            assert_eq!(response.message().unwrap().message, "Pet not found");
        }

        #[tokio::test]
        async fn test_find_by_status() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/pet/findByStatus"))
                .and(query_param("status", "sold"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                    { "id": 1, "name": "a", "photoUrls": [], "status": "sold" },
                    { "id": 2, "name": "b", "photoUrls": [], "status": "sold" }
                ])))
                .mount(&server)
                .await;

            let pets = PetstoreClient::new(server.uri()).unwrap()
                .find_by_status(PetStatus::Sold)
                .await
                .unwrap()
                .into_body()
                .unwrap();
            assert_eq!(pets.len(), 2);
            assert!(pets.iter().all(|p| p.status == Some(PetStatus::Sold)));
        }

        #[tokio::test]
        async fn test_upload_image_is_multipart() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/pet/12345/uploadImage"))
                .and(header_exists("content-type"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "code": 200, "type": "unknown", "message": "additionalMetadata: Profile picture"
                })))
                .mount(&server)
                .await;

            let client = PetstoreClient::new(server.uri()).unwrap();
            let response = client
                .upload_image(12345, "profile.jpg", vec![0xFF, 0xD8, 0xFF], Some("Profile picture"))
                .await
                .unwrap();
            assert_eq!(response.status, 200);

            let requests = server.received_requests().await.unwrap();
            let content_type = requests[0].headers.get("content-type").unwrap().to_str().unwrap();
            assert!(content_type.starts_with("multipart/form-data"));
            let body = String::from_utf8_lossy(&requests[0].body);
            assert!(body.contains("name=\"additionalMetadata\""));
            assert!(body.contains("filename=\"profile.jpg\""));
        }

        #[tokio::test]
        async fn test_delete_best_effort_swallows_failures() {
            let server = MockServer::start().await;
            Mock::given(method("DELETE"))
                .and(path("/pet/1"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "code": 200, "type": "unknown", "message": "1"
                })))
                .mount(&server)
                .await;
            Mock::given(method("DELETE"))
                .and(path("/pet/2"))
                .respond_with(ResponseTemplate::new(404))
                .mount(&server)
                .await;

            let client = PetstoreClient::new(server.uri()).unwrap();
            assert!(client.delete_pet_best_effort(1).await);
            assert!(!client.delete_pet_best_effort(2).await);
            assert!(!PetstoreClient::new("http://127.0.0.1:1").unwrap().delete_pet_best_effort(3).await);
        }

        #[tokio::test]
        async fn test_user_round_trip() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/user"))
                .and(body_partial_json(json!({ "username": "jdoe", "firstName": "John" })))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "code": 200, "type": "unknown", "message": "42"
                })))
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/user/jdoe"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "id": 42, "username": "jdoe", "firstName": "John", "userStatus": 1
                })))
                .mount(&server)
                .await;

            let client = PetstoreClient::new(server.uri()).unwrap();
            let user = User {
                username: "jdoe".to_string(),
                first_name: "John".to_string(),
                ..User::default()
            };
            assert!(client.create_user(&user).await.unwrap().is_success());
            let fetched = client.get_user("jdoe").await.unwrap().into_body().unwrap();
            assert_eq!(fetched.id, Some(42));
            assert_eq!(fetched.user_status, 1);
        }
    }
}
