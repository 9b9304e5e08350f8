//! Shared e2e harness
//!
//! Boots the real router on an OS-assigned port against a throwaway
//! database and ledger, and exposes small helpers for the flows most
//! suites need (signup, admin signup).

use modam::{AppState, config};
use tempfile::TempDir;
use tokio::net::TcpListener;

pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();

        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                domain: "localhost".to_string(),
                protocol: "http".to_string(),
            },
            database: config::DatabaseConfig {
                path: temp_dir.path().join("test.db"),
            },
            storage: config::StorageConfig {
                community: config::BucketConfig {
                    bucket: "test-community".to_string(),
                    public_url: "https://images.test.example.com".to_string(),
                },
                avatars: config::BucketConfig {
                    bucket: "test-avatars".to_string(),
                    public_url: "https://avatars.test.example.com".to_string(),
                },
            },
            cloudflare: config::CloudflareConfig {
                account_id: "test-account".to_string(),
                r2_access_key_id: "test-key".to_string(),
                r2_secret_access_key: "test-secret".to_string(),
            },
            auth: config::AuthConfig {
                session_secret: "test-secret-key-32-bytes-long!!!".to_string(),
                session_max_age: 604800,
                session_recover_timeout: 5,
            },
            admin: config::AdminConfig {
                username: "modamadmin".to_string(),
                nickname: "Modam Admin".to_string(),
            },
            diagnosis: config::DiagnosisConfig {
                analysis_delay_ms: 0,
                ledger_path: temp_dir.path().join("diagnoses.json"),
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        let state = AppState::new(config).await.unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = format!("http://{}", listener.local_addr().unwrap());

        let app = modam::build_router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        // Give the accept loop a moment before the first request.
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        Self {
            addr,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Sign up a user through the API; returns (token, user_id)
    pub async fn signup(&self, email: &str, username: &str) -> (String, String) {
        let response = self
            .client
            .post(self.url("/api/auth/signup"))
            .json(&serde_json::json!({
                "email": email,
                "password": "correct horse",
                "username": username,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200, "signup failed for {username}");

        let body: serde_json::Value = response.json().await.unwrap();
        let token = body["token"].as_str().unwrap().to_string();
        let user_id = body["user"]["id"].as_str().unwrap().to_string();
        (token, user_id)
    }

    /// Sign up the platform admin (the reserved username from config)
    pub async fn signup_admin(&self) -> (String, String) {
        self.signup("admin@test.example.com", "modamadmin").await
    }
}
