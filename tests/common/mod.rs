#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

pub const ADMIN_USERNAME: &str = "integration-admin";
pub const ADMIN_PASSWORD: &str = "integration-admin-pw";
const JWT_SECRET: &str = "integration-test-secret";

static SERVER: OnceLock<Option<TestServer>> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
    watchdog: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = self.watchdog.kill();
    }
}

fn binary() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_school-admin-api"));
    cmd.env("JWT_SECRET", JWT_SECRET)
        .env("BCRYPT_COST", "4")
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    cmd
}

fn run_to_completion(args: &[&str]) -> Result<()> {
    let status = binary().args(args).status().context("failed to run server binary")?;
    anyhow::ensure!(status.success(), "`{}` exited with {}", args.join(" "), status);
    Ok(())
}

impl TestServer {
    fn spawn() -> Result<Self> {
        run_to_completion(&["migrate"])?;
        run_to_completion(&["create-admin", "--username", ADMIN_USERNAME, "--password", ADMIN_PASSWORD])?;

        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut child = binary()
            .arg("serve")
            .env("APP_HOST", "127.0.0.1")
            .env("PORT", port.to_string())
            .env("DATABASE_RUN_MIGRATIONS", "false")
            .spawn()
            .context("failed to spawn server binary")?;
        let watchdog = match stop_when_gone(std::process::id(), child.id()) {
            Ok(watchdog) => watchdog,
            Err(err) => {
                let _ = child.kill();
                return Err(err);
            }
        };

        Ok(Self { port, base_url, child, watchdog })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

/// Sidecar shell that kills `target` once `parent` has exited. `SERVER` is a
/// static and never dropped, so this is what stops the server after the test
/// binary finishes.
pub fn stop_when_gone(parent: u32, target: u32) -> Result<Child> {
    Command::new("sh")
        .arg("-c")
        .arg("while kill -0 \"$1\" 2>/dev/null; do sleep 1; done; kill \"$2\" 2>/dev/null")
        .arg("watchdog")
        .arg(parent.to_string())
        .arg(target.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("failed to spawn server watchdog")
}

/// `None` when no database is configured; callers return early in that case
pub async fn ensure_server() -> Result<Option<&'static TestServer>> {
    let server = SERVER.get_or_init(|| {
        let _ = dotenvy::dotenv();
        if std::env::var("DATABASE_URL").map(|v| v.trim().is_empty()).unwrap_or(true) {
            eprintln!("DATABASE_URL not set; skipping integration test");
            return None;
        }
        Some(TestServer::spawn().expect("failed to start server"))
    });
    match server {
        Some(server) => {
            server.wait_ready(Duration::from_secs(15)).await?;
            Ok(Some(server))
        }
        None => Ok(None),
    }
}

/// Distinct per call, so reruns against the same database do not collide
pub fn unique(prefix: &str) -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or(0);
    format!("{}-{}-{}", prefix, nanos, COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// JSON client bound to one caller
pub struct Api {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl Api {
    pub fn anonymous(server: &TestServer) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: server.base_url.clone(),
            token: None,
        }
    }

    pub async fn login(server: &TestServer, username: &str, password: &str) -> Result<Self> {
        let mut api = Self::anonymous(server);
        let (status, body) = api
            .post("/api/auth/login", json!({ "username": username, "password": password }))
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "login failed for {}: {}", username, body);
        let token = body["data"]["token"].as_str().context("token missing from login response")?;
        api.token = Some(token.to_string());
        Ok(api)
    }

    pub async fn admin(server: &TestServer) -> Result<Self> {
        Self::login(server, ADMIN_USERNAME, ADMIN_PASSWORD).await
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(builder: reqwest::RequestBuilder) -> Result<(StatusCode, Value)> {
        let res = builder.send().await?;
        let status = res.status();
        let body = res.json::<Value>().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    pub async fn get(&self, path: &str) -> Result<(StatusCode, Value)> {
        Self::send(self.request(reqwest::Method::GET, path)).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        Self::send(self.request(reqwest::Method::POST, path).json(&body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        Self::send(self.request(reqwest::Method::PUT, path).json(&body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<(StatusCode, Value)> {
        Self::send(self.request(reqwest::Method::DELETE, path)).await
    }

    pub async fn raw_get(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self.request(reqwest::Method::GET, path).send().await?)
    }

    /// POST that must return 201; yields `data.<id_field>`
    pub async fn create(&self, path: &str, body: Value, id_field: &str) -> Result<i64> {
        let (status, body) = self.post(path, body).await?;
        anyhow::ensure!(status == StatusCode::CREATED, "POST {} returned {}: {}", path, status, body);
        body["data"][id_field].as_i64().with_context(|| format!("{} missing: {}", id_field, body))
    }
}

pub async fn create_branch(admin: &Api) -> Result<i64> {
    admin
        .create("/api/branches", json!({ "branch_name": unique("branch"), "phone": "555-0100" }), "branch_id")
        .await
}

/// Creates an Accountant in `branch_id` and logs in as them
pub async fn create_accountant(server: &TestServer, admin: &Api, branch_id: i64) -> Result<(i64, Api)> {
    let username = unique("acct");
    let user_id = admin
        .create(
            "/api/users",
            json!({ "username": username, "password": "acct-password", "role": "Accountant", "branch_id": branch_id }),
            "user_id",
        )
        .await?;
    let api = Api::login(server, &username, "acct-password").await?;
    Ok((user_id, api))
}

pub fn student_body(branch_id: i64) -> Value {
    json!({
        "first_name": "Lena",
        "last_name": unique("Student"),
        "dob": "2012-04-18",
        "gender": "Female",
        "branch_id": branch_id
    })
}
