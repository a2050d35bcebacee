use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes prepared HTTP requests; wrappers layer credentials on top.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
