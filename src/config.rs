use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub api: Api,
    pub server: Server,
    pub limits: Limits,
}

/// Where the remote notebook service lives and how to authenticate to it.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Api {
    pub base_url: String,
    pub token: Option<String>,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5055".to_string(),
            token: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Stdio,
    Http,
}

impl FromStr for Transport {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdio" => Ok(Transport::Stdio),
            "http" | "streamable-http" => Ok(Transport::Http),
            other => anyhow::bail!("unknown transport: {other}"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Server {
    pub transport: Transport,
    pub bind_addr: String,
    pub port: u16,
    pub base_path: String,
    pub stateless_http: bool,
    pub json_response: bool,
    pub allowed_origins: Vec<String>,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            transport: Transport::Stdio,
            bind_addr: "127.0.0.1".to_string(),
            port: 8000,
            base_path: default_base_path(),
            stateless_http: true,
            json_response: true,
            allowed_origins: Vec::new(),
        }
    }
}
fn default_base_path() -> String { "/mcp".to_string() }

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Limits {
    pub request_timeout_s: u64,
    pub max_request_kb: usize,
    /// Stateful HTTP only: sessions unused for this long are forgotten.
    pub session_idle_s: u64,
    pub max_sessions: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            request_timeout_s: 30,
            max_request_kb: 1024,
            session_idle_s: 1800,
            max_sessions: 1024,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)?;
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            Ok(serde_json::from_str(&raw)?)
        } else {
            Ok(toml::from_str(&raw)?)
        }
    }

    /// Overlay environment values onto `self`. `lookup` stands in for the
    /// process environment so callers can inject their own.
    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("OPEN_NOTEBOOK_URL") {
            self.api.base_url = url;
        }
        if let Some(token) = lookup("OPEN_NOTEBOOK_PASSWORD") {
            self.api.token = Some(token).filter(|t| !t.is_empty());
        }
        if let Some(t) = lookup("MCP_TRANSPORT") {
            self.server.transport = t.parse()?;
        }
        if let Some(host) = lookup("HOST") {
            self.server.bind_addr = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a port number, got {port:?}"))?;
        }
        if let Some(path) = lookup("MCP_PATH") {
            self.server.base_path = path;
        }
        if let Some(flag) = lookup("STATELESS_HTTP") {
            self.server.stateless_http = flag.trim() == "1";
        }
        if let Some(flag) = lookup("JSON_RESPONSE") {
            self.server.json_response = flag.trim() == "1";
        }
        if let Some(origins) = lookup("MCP_ALLOWED_ORIGINS") {
            self.server.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let url = self.api.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            anyhow::bail!("base_url must be an http(s) URL: {url}");
        }
        if !self.server.base_path.starts_with('/') { anyhow::bail!("base_path must start with '/'"); }
        if self.limits.request_timeout_s == 0 { anyhow::bail!("request_timeout_s must be > 0"); }
        if self.limits.max_request_kb == 0 { anyhow::bail!("max_request_kb must be > 0"); }
        if self.limits.max_sessions == 0 { anyhow::bail!("max_sessions must be > 0"); }
        Ok(())
    }
}
