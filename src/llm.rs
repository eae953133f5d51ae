use std::time::Duration;
use reqwest::blocking::{Client, ClientBuilder};
use tracing::debug;
use crate::{config::Config, error::ExchangeError, message::{GenerateRequest, GenerateResponse}};

/// One prompt in, one decoded reply body out.
pub trait Transport: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<GenerateResponse, ExchangeError>;
}

pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self, ExchangeError> {
        Self::with_builder(Client::builder(), config)
    }

    fn with_builder(builder: ClientBuilder, config: &Config) -> Result<Self, ExchangeError> {
        // reqwest's blocking client times out after 30s unless told otherwise
        let timeout = config.request_timeout_secs.map(Duration::from_secs);
        let client = builder.timeout(timeout).build()?;
        Ok(Self { client, endpoint: config.endpoint.clone() })
    }
}

impl Transport for HttpTransport {
    fn generate(&self, prompt: &str) -> Result<GenerateResponse, ExchangeError> {
        let request = GenerateRequest { prompt };
        debug!(endpoint = %self.endpoint, body = %serde_json::to_string(&request)?, "sending prompt");

        let res = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()?;

        // The status code is ignored; an error reply still carries a JSON body.
        let status = res.status();
        let body = res.text()?;
        debug!(%status, bytes = body.len(), "reply received");

        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::net::TcpListener;
    use wiremock::{
        matchers::{body_json, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn transport_for(url: &str, timeout_secs: u64) -> HttpTransport {
        let config = Config { endpoint: url.to_string(), request_timeout_secs: Some(timeout_secs), ..Config::default() };
        // keep a proxy from the test environment away from the loopback server
        HttpTransport::with_builder(Client::builder().no_proxy(), &config).unwrap()
    }

    /// Runs the blocking client off the runtime, which reqwest requires.
    async fn generate(server: &MockServer, prompt: &str, timeout_secs: u64) -> Result<GenerateResponse, ExchangeError> {
        let url = format!("{}/generate", server.uri());
        let prompt = prompt.to_string();
        tokio::task::spawn_blocking(move || transport_for(&url, timeout_secs).generate(&prompt))
            .await
            .unwrap()
    }

    async fn mount_generate(server: &MockServer, prompt: &str, template: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path("/generate"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({ "prompt": prompt })))
            .respond_with(template)
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn posts_prompt_as_json() {
        let server = MockServer::start().await;
        mount_generate(&server, "hi there", ResponseTemplate::new(200).set_body_json(json!({ "response": "hello" }))).await;

        let reply = generate(&server, "hi there", 5).await.unwrap();
        assert_eq!(reply.reply_text().as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn error_body_on_failure_status_is_still_decoded() {
        let server = MockServer::start().await;
        mount_generate(&server, "x", ResponseTemplate::new(400).set_body_json(json!({ "error": "bad prompt" }))).await;

        let reply = generate(&server, "x", 5).await.unwrap();
        assert_eq!(reply.error_text().as_deref(), Some("bad prompt"));
        assert!(reply.response.is_none());
    }

    #[tokio::test]
    async fn non_json_body_is_a_decode_error() {
        let server = MockServer::start().await;
        mount_generate(&server, "x", ResponseTemplate::new(502).set_body_string("<html>tunnel offline</html>")).await;

        let err = generate(&server, "x", 5).await.unwrap_err();
        assert!(matches!(err, ExchangeError::Decode(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn silent_endpoint_hits_the_configured_timeout() {
        let server = MockServer::start().await;
        let stalled = ResponseTemplate::new(200)
            .set_body_json(json!({ "response": "too late" }))
            .set_delay(Duration::from_secs(10));
        mount_generate(&server, "x", stalled).await;

        let err = generate(&server, "x", 1).await.unwrap_err();
        assert!(matches!(err, ExchangeError::Timeout), "got {err:?}");
    }

    #[test]
    fn closed_port_is_unreachable() {
        let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let err = transport_for(&format!("http://127.0.0.1:{port}/generate"), 5).generate("x").unwrap_err();
        assert!(matches!(err, ExchangeError::Unreachable(_)), "got {err:?}");
    }
}
