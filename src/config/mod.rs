use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub channel: ChannelConfig,
    pub showcase: ShowcaseConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Endpoints of the externally owned REST backend. The posts URL is the
/// collection root; item operations append `/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub posts_url: String,
    pub upload_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Static display constants for the channel card on the public page.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelConfig {
    pub name: String,
    pub handle: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub subscribers: u64,
    #[serde(default)]
    pub avatar_url: String,
}

impl ChannelConfig {
    pub fn telegram_url(&self) -> String {
        format!("https://t.me/{}", self.handle)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShowcaseConfig {
    #[serde(default = "default_top_posts")]
    pub top_posts: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_cookie")]
    pub cookie: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_top_posts() -> usize {
    3
}

fn default_session_cookie() -> String {
    "showcase_session".to_string()
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("backend.posts_url", "http://localhost:8081/posts")?
            .set_default("backend.upload_url", "http://localhost:8081/upload")?
            .set_default("backend.timeout_secs", 30)?
            .set_default("channel.name", "Channel")?
            .set_default("channel.handle", "channel")?
            .set_default("channel.tagline", "")?
            .set_default("channel.subscribers", 0)?
            .set_default("channel.avatar_url", "")?
            .set_default("showcase.top_posts", 3)?
            .set_default("session.cookie", "showcase_session")?
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
