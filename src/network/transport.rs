use async_trait::async_trait;
use reqwest::{Client, Request};

use crate::common::{PollResponse, SubmitRequest};
use crate::error::SyncError;

/// Kênh tới message store phía server.
///
/// Ghi là opaque: `submit` chỉ biết request đã được gửi đi, không đọc được
/// server có lưu tin hay không.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn submit(&self, request: SubmitRequest<'_>) -> Result<(), SyncError>;

    /// Lấy các tin nhắn của `room` mới hơn `since` (0 = từ đầu), cũ tới mới.
    async fn fetch(&self, room: &str, since: i64) -> Result<PollResponse, SyncError>;
}

/// Transport qua HTTP: POST để gửi, GET `?room=..&since=..` để poll.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    api_url: String,
}

impl HttpTransport {
    pub fn new(api_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .user_agent(concat!("school_chat/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_url: api_url.into(),
        }
    }

    pub fn build_poll_request(&self, room: &str, since: i64) -> Result<Request, SyncError> {
        let since = since.to_string();
        self.client
            .get(&self.api_url)
            .query(&[("room", room), ("since", since.as_str())])
            .build()
            .map_err(SyncError::from)
    }

    pub fn build_submit_request(&self, request: &SubmitRequest<'_>) -> Result<Request, SyncError> {
        self.client
            .post(&self.api_url)
            .json(request)
            .build()
            .map_err(SyncError::from)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn submit(&self, request: SubmitRequest<'_>) -> Result<(), SyncError> {
        let http_request = self.build_submit_request(&request)?;
        let response = self.client.execute(http_request).await?;
        // Status và body không được dùng: chỉ cần request đã tới server.
        log::debug!(
            "Submit to room {} answered with HTTP {}",
            request.room,
            response.status()
        );
        Ok(())
    }

    async fn fetch(&self, room: &str, since: i64) -> Result<PollResponse, SyncError> {
        let http_request = self.build_poll_request(room, since)?;
        let response = self.client.execute(http_request).await?;
        let body = response.bytes().await?;
        serde_json::from_slice::<PollResponse>(&body)
            .map_err(|err| SyncError::MalformedResponse(err.to_string()))
    }
}
