use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::cursor::CursorKind;
use crate::error::ConfigError;

/// Tick period observed on the crawl pages.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(900);

/// Largest in-memory log limit among the backend pages; presets use their own.
pub const DEFAULT_MAX_LOG_LINES: usize = 3000;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Cookie the backend issues its CSRF token in.
pub const CSRF_COOKIE: &str = "csrftoken";

/// Header the backend expects the CSRF token in.
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Body sent with the start request.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum StartBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
}

/// How a successful start is recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AckShape {
    /// 2xx JSON body with `ok: true`.
    #[default]
    JsonFlag,
    /// Any 2xx response.
    StatusOnly,
}

/// Known crawl pages of the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobPreset {
    #[default]
    VrainHtml,
    VrainApi,
    VrainSelenium,
}

impl JobPreset {
    pub fn all() -> &'static [JobPreset] {
        &[JobPreset::VrainHtml, JobPreset::VrainApi, JobPreset::VrainSelenium]
    }

    pub fn slug(self) -> &'static str {
        match self {
            JobPreset::VrainHtml => "vrain-html",
            JobPreset::VrainApi => "vrain-api",
            JobPreset::VrainSelenium => "vrain-selenium",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            JobPreset::VrainHtml => "Vrain HTML crawl",
            JobPreset::VrainApi => "Vrain API crawl",
            JobPreset::VrainSelenium => "Vrain Selenium crawl",
        }
    }

    fn start_path(self) -> &'static str {
        match self {
            JobPreset::VrainHtml => "/crawl-vrain-html/start/",
            JobPreset::VrainApi => "/crawl-vrain-api/start/",
            JobPreset::VrainSelenium => "/crawl-vrain-selenium/start/",
        }
    }

    fn tail_path(self) -> &'static str {
        match self {
            JobPreset::VrainHtml => "/crawl-vrain-html/tail/",
            JobPreset::VrainApi => "/crawl-vrain-api/tail/",
            JobPreset::VrainSelenium => "/crawl-vrain-selenium/tail/",
        }
    }

    /// How many log lines the backend page itself retains.
    pub fn log_limit(self) -> usize {
        match self {
            JobPreset::VrainHtml | JobPreset::VrainApi => 2500,
            JobPreset::VrainSelenium => 3000,
        }
    }

    /// Full configuration for this page against `base_url`.
    pub fn config(self, base_url: &str) -> Result<JobConfig, ConfigError> {
        let base = parse_url("base_url", base_url)?;
        let join = |field: &'static str, path: &str| {
            base.join(path)
                .map_err(|source| ConfigError::InvalidUrl { field, source })
        };

        let config = JobConfig::new(self.label(), join("tail_url", self.tail_path())?)
            .with_start_url(join("start_url", self.start_path())?)
            .with_max_log_lines(self.log_limit());

        Ok(match self {
            JobPreset::VrainHtml | JobPreset::VrainApi => config
                .with_cursor(CursorKind::Since)
                .with_ack(AckShape::StatusOnly)
                .with_start_body(StartBody::Json(serde_json::json!({}))),
            JobPreset::VrainSelenium => config
                .with_cursor(CursorKind::JobOffset)
                .with_ack(AckShape::JsonFlag)
                .with_start_body(StartBody::Empty),
        })
    }
}

impl FromStr for JobPreset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        JobPreset::all()
            .iter()
            .copied()
            .find(|preset| preset.slug() == wanted)
            .ok_or_else(|| ConfigError::UnknownPreset(s.to_string()))
    }
}

impl fmt::Display for JobPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Everything the client needs to start and tail one kind of job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobConfig {
    pub name: String,
    /// `None` disables the start trigger; the controller refuses to start.
    pub start_url: Option<Url>,
    pub tail_url: Url,
    pub cursor: CursorKind,
    pub ack: AckShape,
    pub start_body: StartBody,
    pub csrf_token: Option<String>,
    /// Raw `Cookie` header for non-browser clients.
    pub cookie: Option<String>,
    pub poll_interval: Duration,
    pub max_log_lines: usize,
}

impl JobConfig {
    pub fn new(name: impl Into<String>, tail_url: Url) -> Self {
        Self {
            name: name.into(),
            start_url: None,
            tail_url,
            cursor: CursorKind::default(),
            ack: AckShape::default(),
            start_body: StartBody::default(),
            csrf_token: None,
            cookie: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_log_lines: DEFAULT_MAX_LOG_LINES,
        }
    }

    pub fn with_start_url(mut self, url: Url) -> Self {
        self.start_url = Some(url);
        self
    }

    pub fn with_tail_url(mut self, url: Url) -> Self {
        self.tail_url = url;
        self
    }

    pub fn with_cursor(mut self, cursor: CursorKind) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn with_ack(mut self, ack: AckShape) -> Self {
        self.ack = ack;
        self
    }

    pub fn with_start_body(mut self, body: StartBody) -> Self {
        self.start_body = body;
        self
    }

    pub fn with_csrf_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = Some(token.into());
        self
    }

    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_log_lines(mut self, max: usize) -> Self {
        self.max_log_lines = max;
        self
    }

    /// Token for the CSRF header: explicit token first, then the cookie.
    pub fn resolved_csrf_token(&self) -> Option<String> {
        self.csrf_token
            .clone()
            .filter(|token| !token.is_empty())
            .or_else(|| {
                self.cookie
                    .as_deref()
                    .and_then(|header| cookie_value(header, CSRF_COOKIE))
            })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if self.max_log_lines == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_log_lines",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    /// Load configuration from environment variables (and `.env`).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(None, None)
    }

    /// Like [`from_env`](Self::from_env), with the preset and base URL
    /// already decided by the caller (command-line flags win over env).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env_with(
        preset: Option<JobPreset>,
        base_url: Option<&str>,
    ) -> Result<Self, ConfigError> {
        use std::env;

        let _ = dotenvy::dotenv();

        let preset = match preset {
            Some(preset) => preset,
            None => env::var("CRAWL_PRESET")
                .ok()
                .map(|raw| raw.parse::<JobPreset>())
                .transpose()?
                .unwrap_or_default(),
        };
        let base_url = match base_url {
            Some(base_url) => base_url.to_string(),
            None => env::var("CRAWL_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        };

        let mut config = preset.config(&base_url)?;

        if let Ok(raw) = env::var("CRAWL_START_URL") {
            config = config.with_start_url(parse_url("CRAWL_START_URL", &raw)?);
        }
        if let Ok(raw) = env::var("CRAWL_TAIL_URL") {
            config = config.with_tail_url(parse_url("CRAWL_TAIL_URL", &raw)?);
        }
        if let Ok(token) = env::var("CRAWL_CSRF_TOKEN") {
            config = config.with_csrf_token(token);
        }
        if let Ok(cookie) = env::var("CRAWL_COOKIE") {
            config = config.with_cookie(cookie);
        }
        if let Ok(raw) = env::var("CRAWL_POLL_INTERVAL_MS") {
            config = config.with_poll_interval(Duration::from_millis(parse_number(
                "CRAWL_POLL_INTERVAL_MS",
                &raw,
            )?));
        }
        if let Ok(raw) = env::var("CRAWL_MAX_LOG_LINES") {
            config = config.with_max_log_lines(parse_number("CRAWL_MAX_LOG_LINES", &raw)?);
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn parse_number<T: FromStr>(field: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        field,
        value: raw.to_string(),
    })
}

pub fn parse_url(field: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl { field, source })
}

/// Value of cookie `name` in a `Cookie` header or `document.cookie` string.
pub fn cookie_value(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|part| part.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selenium_preset() {
        let config = JobPreset::VrainSelenium.config("http://crawler.local:8000").unwrap();
        assert_eq!(
            config.start_url.unwrap().as_str(),
            "http://crawler.local:8000/crawl-vrain-selenium/start/"
        );
        assert_eq!(
            config.tail_url.as_str(),
            "http://crawler.local:8000/crawl-vrain-selenium/tail/"
        );
        assert_eq!(config.cursor, CursorKind::JobOffset);
        assert_eq!(config.ack, AckShape::JsonFlag);
        assert_eq!(config.start_body, StartBody::Empty);
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
    }

    #[test]
    fn test_html_preset_posts_empty_json() {
        let config = JobPreset::VrainHtml.config(DEFAULT_BASE_URL).unwrap();
        assert_eq!(config.cursor, CursorKind::Since);
        assert_eq!(config.ack, AckShape::StatusOnly);
        assert_eq!(config.start_body, StartBody::Json(serde_json::json!({})));
    }

    #[test]
    fn test_preset_log_bound_follows_backend_limit() {
        let html = JobPreset::VrainHtml.config(DEFAULT_BASE_URL).unwrap();
        let api = JobPreset::VrainApi.config(DEFAULT_BASE_URL).unwrap();
        let selenium = JobPreset::VrainSelenium.config(DEFAULT_BASE_URL).unwrap();

        assert_eq!(html.max_log_lines, 2500);
        assert_eq!(api.max_log_lines, 2500);
        assert_eq!(selenium.max_log_lines, 3000);
    }

    #[test]
    fn test_preset_parse() {
        assert_eq!("vrain_api".parse::<JobPreset>().unwrap(), JobPreset::VrainApi);
        assert!(matches!(
            "weather".parse::<JobPreset>(),
            Err(ConfigError::UnknownPreset(_))
        ));
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            JobPreset::VrainApi.config("not a url"),
            Err(ConfigError::InvalidUrl { field: "base_url", .. })
        ));
    }

    #[test]
    fn test_cookie_value() {
        let header = "sessionid=abc; csrftoken=tok123; theme=dark";
        assert_eq!(cookie_value(header, "csrftoken").as_deref(), Some("tok123"));
        assert_eq!(cookie_value(header, "missing"), None);
        assert_eq!(cookie_value("csrftoken=", "csrftoken"), None);
    }

    #[test]
    fn test_explicit_token_wins_over_cookie() {
        let config = JobPreset::VrainHtml
            .config(DEFAULT_BASE_URL)
            .unwrap()
            .with_cookie("csrftoken=from-cookie");
        assert_eq!(config.resolved_csrf_token().as_deref(), Some("from-cookie"));

        let config = config.with_csrf_token("explicit");
        assert_eq!(config.resolved_csrf_token().as_deref(), Some("explicit"));
    }

    #[test]
    fn test_zero_interval_is_invalid() {
        let config = JobPreset::VrainHtml
            .config(DEFAULT_BASE_URL)
            .unwrap()
            .with_poll_interval(Duration::ZERO);
        assert!(matches!(config.validate(), Err(ConfigError::ZeroInterval)));
    }
}
