#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

pub const TRUSTED_PRIVATE: &str = include_str!("../fixtures/trusted_private.pem");
pub const UNTRUSTED_PRIVATE: &str = include_str!("../fixtures/untrusted_private.pem");

/// A `todo-api serve` child process backed by the in-memory store.
/// Each test gets its own server, so stored items never leak between tests.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: reqwest::Client,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);
        let public_key = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/trusted_public.pem");

        let child = Command::new(env!("CARGO_BIN_EXE_todo-api"))
            .arg("serve")
            .args(["--host", "127.0.0.1", "--port", &port.to_string()])
            .env("APP_ENV", "development")
            .env("TODO_STORE", "memory")
            .env("ATTACHMENTS_S3_BUCKET", "test-bucket")
            .env("SIGNED_URL_EXPIRATION", "300")
            .env("AUTH_PUBLIC_KEY_FILE", public_key)
            .env_remove("AUTH_PUBLIC_KEY")
            .env_remove("AUTH_ISSUER")
            .env_remove("AUTH_AUDIENCE")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .context("failed to spawn server binary")?;

        Ok(Self {
            port,
            base_url,
            client: reqwest::Client::new(),
            child,
        })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(token)
    }

    pub fn post(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(token)
    }

    pub fn patch(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client.patch(self.url(path)).bearer_auth(token)
    }

    pub fn delete(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client.delete(self.url(path)).bearer_auth(token)
    }

    /// POST /todos and return the stored item.
    pub async fn create_todo(&self, token: &str, name: &str, due_date: Option<&str>) -> Result<serde_json::Value> {
        let res = self
            .post("/todos", token)
            .json(&json!({ "name": name, "dueDate": due_date }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "create returned {}", res.status());
        let body: serde_json::Value = res.json().await?;
        Ok(body["item"].clone())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub async fn start_server() -> Result<TestServer> {
    let server = TestServer::spawn()?;
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// RS256 token for `sub`, signed by the key the server trusts, valid for ten minutes.
pub fn token_for(sub: &str) -> String {
    sign(TRUSTED_PRIVATE, json!({ "sub": sub, "exp": chrono::Utc::now().timestamp() + 600 }))
}

pub fn sign(private_pem: &str, claims: serde_json::Value) -> String {
    let key = EncodingKey::from_rsa_pem(private_pem.as_bytes()).expect("fixture key should parse");
    encode(&Header::new(Algorithm::RS256), &claims, &key).expect("fixture claims should encode")
}
