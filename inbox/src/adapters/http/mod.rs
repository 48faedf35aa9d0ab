use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::{Client, Response};
use tracing::{debug, info};
use url::Url;

use super::MessageBackend;
use crate::config::InboxConfig;
use crate::types::{ChangeRecord, InboxError, Message, Result, View};

/// Client for the portfolio message API
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(config: &InboxConfig) -> Result<Self> {
        let mut base = Url::parse(&config.api_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let mut headers = HeaderMap::new();
        if let Some(cookie) = &config.auth_cookie {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| InboxError::Config(format!("Invalid auth cookie: {}", e)))?;
            headers.insert(COOKIE, value);
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| InboxError::Backend(format!("HTTP client error: {}", e)))?;

        Ok(Self { client, base })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }
}

/// Turn a non-2xx response into `InboxError::Status`
async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(InboxError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl MessageBackend for HttpBackend {
    async fn fetch(&self, view: View) -> Result<Vec<Message>> {
        let url = self.endpoint(&format!("messages/{}", view))?;
        debug!("GET {}", url);

        let resp = self.client.get(url).send().await?;
        let messages: Vec<Message> = check_status(resp).await?.json().await?;

        info!("Fetched {} {} messages", messages.len(), view);
        Ok(messages)
    }

    async fn put_many(&self, records: &[ChangeRecord]) -> Result<()> {
        let url = self.endpoint("messages/putMany")?;
        debug!("PUT {} ({} records)", url, records.len());

        let resp = self.client.put(url).json(records).send().await?;
        check_status(resp).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = InboxConfig {
            api_url: "http://localhost:3000/api".into(),
            ..Default::default()
        };
        let backend = HttpBackend::new(&config).unwrap();
        assert_eq!(
            backend.endpoint("messages/archived").unwrap().as_str(),
            "http://localhost:3000/api/messages/archived"
        );
        assert_eq!(
            backend.endpoint("messages/putMany").unwrap().as_str(),
            "http://localhost:3000/api/messages/putMany"
        );
    }

    #[test]
    fn test_invalid_cookie_is_config_error() {
        let config = InboxConfig {
            auth_cookie: Some("token=\nbad".into()),
            ..Default::default()
        };
        assert!(matches!(HttpBackend::new(&config), Err(InboxError::Config(_))));
    }
}
