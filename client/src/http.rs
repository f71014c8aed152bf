use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::Serialize;

use crate::error::{RemoteError, Result};
use crate::remote::Remote;
use crate::types::*;

/// JSON/HTTP adapter for a remote filesystem engine.
///
/// The engine itself (handle resolution, wire encoding, authentication) is
/// an external collaborator behind these endpoints; this adapter only maps
/// the capability set onto it and carries the negotiated block sizes.
pub struct HttpRemote {
    client: Client,
    base_url: String,
    rtsize: u32,
    wtsize: u32,
}

impl HttpRemote {
    /// Connect with default options and negotiate a session.
    pub async fn connect(base_url: &str) -> Result<Self> {
        Self::builder(base_url).connect().await
    }

    pub fn builder(base_url: &str) -> HttpRemoteBuilder {
        HttpRemoteBuilder::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T> {
        if !resp.status().is_success() {
            return Err(self.extract_error(resp).await);
        }
        Ok(resp.json().await?)
    }

    async fn handle_empty_response(&self, resp: reqwest::Response) -> Result<()> {
        if !resp.status().is_success() {
            return Err(self.extract_error(resp).await);
        }
        Ok(())
    }

    async fn extract_error(&self, resp: reqwest::Response) -> RemoteError {
        let status = resp.status().as_u16();
        match resp.json::<ErrorResponse>().await {
            Ok(err_resp) => RemoteError::from_response(status, err_resp.error),
            Err(_) => RemoteError::Request {
                status,
                message: "unknown error".to_string(),
            },
        }
    }
}

#[async_trait]
impl Remote for HttpRemote {
    async fn getattr(&self, path: &str) -> Result<RemoteAttr> {
        let resp = self
            .client
            .get(format!("{}/api/v1/attr", self.base_url))
            .query(&[("path", path)])
            .send()
            .await?;

        self.handle_response::<AttrResponse>(resp)
            .await
            .map(Into::into)
    }

    async fn readdir(&self, path: &str, cookie: u64) -> Result<(Vec<DirEntry>, Option<u64>)> {
        let cookie = cookie.to_string();
        let resp = self
            .client
            .get(format!("{}/api/v1/readdir", self.base_url))
            .query(&[("path", path), ("cookie", cookie.as_str())])
            .send()
            .await?;

        let page: ReaddirResponse = self.handle_response(resp).await?;
        Ok((
            page.entries.into_iter().map(Into::into).collect(),
            page.next_cookie,
        ))
    }

    async fn read(&self, path: &str, offset: u64, len: u32) -> Result<Bytes> {
        #[derive(Serialize)]
        struct ReadRequest<'a> {
            path: &'a str,
            offset: u64,
            len: u32,
        }

        tracing::debug!(path, offset, len, "read");
        let resp = self
            .client
            .post(format!("{}/api/v1/read", self.base_url))
            .json(&ReadRequest { path, offset, len })
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(self.extract_error(resp).await);
        }

        Ok(resp.bytes().await?)
    }

    async fn write(&self, path: &str, offset: u64, data: &[u8]) -> Result<usize> {
        tracing::debug!(path, offset, len = data.len(), "write");
        let offset = offset.to_string();
        let resp = self
            .client
            .post(format!("{}/api/v1/write", self.base_url))
            .query(&[("path", path), ("offset", offset.as_str())])
            .body(data.to_vec())
            .send()
            .await?;

        let write_resp: WriteResponse = self.handle_response(resp).await?;
        Ok(write_resp.written)
    }

    async fn mknod(&self, path: &str, mode: u32, dev: u32) -> Result<()> {
        #[derive(Serialize)]
        struct MknodRequest<'a> {
            path: &'a str,
            mode: u32,
            dev: u32,
        }

        let resp = self
            .client
            .post(format!("{}/api/v1/mknod", self.base_url))
            .json(&MknodRequest { path, mode, dev })
            .send()
            .await?;

        self.handle_empty_response(resp).await
    }

    async fn truncate(&self, path: &str, len: u64) -> Result<()> {
        #[derive(Serialize)]
        struct TruncateRequest<'a> {
            path: &'a str,
            length: u64,
        }

        let resp = self
            .client
            .post(format!("{}/api/v1/truncate", self.base_url))
            .json(&TruncateRequest { path, length: len })
            .send()
            .await?;

        self.handle_empty_response(resp).await
    }

    async fn mkdir(&self, path: &str, mode: u32) -> Result<()> {
        #[derive(Serialize)]
        struct MkdirRequest<'a> {
            path: &'a str,
            mode: u32,
        }

        let resp = self
            .client
            .post(format!("{}/api/v1/mkdir", self.base_url))
            .json(&MkdirRequest { path, mode })
            .send()
            .await?;

        self.handle_empty_response(resp).await
    }

    async fn rmdir(&self, path: &str) -> Result<()> {
        let resp = self
            .client
            .delete(format!("{}/api/v1/rmdir", self.base_url))
            .query(&[("path", path)])
            .send()
            .await?;

        self.handle_empty_response(resp).await
    }

    async fn unlink(&self, path: &str) -> Result<()> {
        let resp = self
            .client
            .delete(format!("{}/api/v1/unlink", self.base_url))
            .query(&[("path", path)])
            .send()
            .await?;

        self.handle_empty_response(resp).await
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        #[derive(Serialize)]
        struct RenameRequest<'a> {
            from: &'a str,
            to: &'a str,
        }

        let resp = self
            .client
            .post(format!("{}/api/v1/rename", self.base_url))
            .json(&RenameRequest { from, to })
            .send()
            .await?;

        self.handle_empty_response(resp).await
    }

    async fn chmod(&self, path: &str, mode: u32) -> Result<()> {
        #[derive(Serialize)]
        struct ChmodRequest<'a> {
            path: &'a str,
            mode: u32,
        }

        let resp = self
            .client
            .post(format!("{}/api/v1/chmod", self.base_url))
            .json(&ChmodRequest { path, mode })
            .send()
            .await?;

        self.handle_empty_response(resp).await
    }

    async fn chown(&self, path: &str, uid: Option<u32>, gid: Option<u32>) -> Result<()> {
        #[derive(Serialize)]
        struct ChownRequest<'a> {
            path: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            uid: Option<u32>,
            #[serde(skip_serializing_if = "Option::is_none")]
            gid: Option<u32>,
        }

        let resp = self
            .client
            .post(format!("{}/api/v1/chown", self.base_url))
            .json(&ChownRequest { path, uid, gid })
            .send()
            .await?;

        self.handle_empty_response(resp).await
    }

    async fn readlink(&self, path: &str) -> Result<String> {
        let resp = self
            .client
            .get(format!("{}/api/v1/readlink", self.base_url))
            .query(&[("path", path)])
            .send()
            .await?;

        self.handle_response::<ReadlinkResponse>(resp)
            .await
            .map(|r| r.target)
    }

    async fn statfs(&self) -> Result<FsStats> {
        let resp = self
            .client
            .get(format!("{}/api/v1/statfs", self.base_url))
            .send()
            .await?;

        self.handle_response::<StatfsResponse>(resp)
            .await
            .map(Into::into)
    }

    async fn teardown(&self) -> Result<()> {
        let resp = self
            .client
            .delete(format!("{}/api/v1/session", self.base_url))
            .send()
            .await?;

        self.handle_empty_response(resp).await
    }

    fn read_block_size(&self) -> u32 {
        self.rtsize
    }

    fn write_block_size(&self) -> u32 {
        self.wtsize
    }
}

pub struct HttpRemoteBuilder {
    base_url: String,
    timeout: Option<Duration>,
    token: Option<String>,
}

impl HttpRemoteBuilder {
    fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            // A stalled engine call blocks the shell until it completes or
            // errors; there is deliberately no default deadline.
            timeout: None,
            token: None,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Build the HTTP client and negotiate a session; the reply carries the
    /// engine's read/write transfer sizes.
    pub async fn connect(self) -> Result<HttpRemote> {
        let mut builder = Client::builder();

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(token) = &self.token {
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {token}")
                    .parse()
                    .map_err(|_| RemoteError::InvalidArgument("invalid token".to_string()))?,
            );
            builder = builder.default_headers(headers);
        }

        let client = builder
            .build()
            .map_err(|e| RemoteError::Connection(e.to_string()))?;

        let resp = client
            .post(format!("{}/api/v1/session", self.base_url))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(RemoteError::from_response(status, message));
        }
        let session: SessionResponse = resp.json().await?;

        if session.rtsize == 0 || session.wtsize == 0 {
            return Err(RemoteError::Protocol(
                "engine negotiated a zero transfer size".to_string(),
            ));
        }

        tracing::debug!(
            rtsize = session.rtsize,
            wtsize = session.wtsize,
            "session negotiated"
        );

        Ok(HttpRemote {
            client,
            base_url: self.base_url,
            rtsize: session.rtsize,
            wtsize: session.wtsize,
        })
    }
}
