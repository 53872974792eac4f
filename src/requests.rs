use reqwest::{Client, ClientBuilder, RequestBuilder, Response};

use crate::ratelimit::RateLimiter;

pub struct RequestClient {
    client: Client,
    rate_limiter: RateLimiter,
}

impl RequestClient {
    pub fn new() -> anyhow::Result<Self> {
        let client = ClientBuilder::new()
            .danger_accept_invalid_certs(true)
            .build()?;
        let rate_limiter = RateLimiter::new();
        Ok(Self {
            client,
            rate_limiter,
        })
    }

    /// Both pipelines attach their own headers and bodies, so the
    /// builder is exposed rather than a plain fetch-by-url method.
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub async fn send(&self, request: RequestBuilder) -> anyhow::Result<Response> {
        // Wait (non-blocking) until we're allowed to make a request according
        // to our self-imposed rate-limiting policy.
        self.rate_limiter.wait_until_ready().await;

        let response = request.send().await?;
        Ok(response)
    }
}
