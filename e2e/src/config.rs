//! Run configuration, read from the environment.

use std::{
    collections::HashMap,
    fmt::{Display, Formatter},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};
use thiserror::Error;

/// Where the fixture site listens when `BASE_URL` is not set.
pub const FIXTURE_BASE_URL: &str = "http://127.0.0.1:8000";

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                          AppleWebKit/537.36 (KHTML, like Gecko) \
                          Chrome/121.0.0.0 Safari/537.36";

#[derive(Debug, Copy, Clone, PartialOrd, PartialEq, Eq, Hash)]
pub enum BrowserType {
    Chromium,
    Firefox,
    Webkit,
}

impl Display for BrowserType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                BrowserType::Chromium => "Chromium",
                BrowserType::Firefox => "Firefox",
                BrowserType::Webkit => "Webkit",
            }
        )
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown browser {0:?}, expected chromium, firefox or webkit")]
pub struct UnknownBrowser(String);

impl FromStr for BrowserType {
    type Err = UnknownBrowser;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(BrowserType::Chromium),
            "firefox" => Ok(BrowserType::Firefox),
            "webkit" => Ok(BrowserType::Webkit),
            _ => Err(UnknownBrowser(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Origin under test, no trailing slash.
    pub base_url: String,
    /// No `BASE_URL` was given: the runner serves the fixture site itself.
    pub spawn_fixture_site: bool,
    pub ci: bool,
    pub headless: bool,
    pub retries: u32,
    pub workers: usize,
    pub browsers: Vec<BrowserType>,
    pub test_timeout: Duration,
    /// Default wait for a single expectation.
    pub expect_timeout: Duration,
    pub popup_timeout: Duration,
    pub pdf_url_timeout: Duration,
    pub locale: String,
    pub timezone_id: String,
    pub user_agent: String,
    pub extra_http_headers: HashMap<String, String>,
    pub chromium_args: Vec<String>,
    pub pdftotext: String,
    pub results_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, UnknownBrowser> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, UnknownBrowser>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let ci = var("CI").is_some();
        let base_url = var("BASE_URL").map(|url| url.trim().trim_end_matches('/').to_string());
        let headless = var("HEADLESS")
            .and_then(|value| parse_flag(&value))
            .unwrap_or(ci);
        let browsers = match var("E2E_BROWSERS") {
            Some(list) => list
                .split(',')
                .filter(|name| !name.trim().is_empty())
                .map(str::parse)
                .collect::<Result<Vec<_>, _>>()?,
            None => vec![BrowserType::Chromium],
        };

        Ok(Config {
            spawn_fixture_site: base_url.is_none(),
            base_url: base_url.unwrap_or_else(|| FIXTURE_BASE_URL.to_string()),
            ci,
            headless,
            retries: if ci { 1 } else { 0 },
            workers: if ci { 1 } else { default_workers() },
            browsers,
            test_timeout: Duration::from_secs(60),
            expect_timeout: Duration::from_secs(15),
            popup_timeout: Duration::from_secs(10),
            pdf_url_timeout: Duration::from_secs(15),
            locale: "en-AU".to_string(),
            timezone_id: "Australia/Sydney".to_string(),
            user_agent: USER_AGENT.to_string(),
            extra_http_headers: HashMap::from([(
                "Accept-Language".to_string(),
                "en-AU,en;q=0.9".to_string(),
            )]),
            chromium_args: vec!["--disable-dev-shm-usage".to_string()],
            pdftotext: var("PDFTOTEXT").unwrap_or_else(|| "pdftotext".to_string()),
            results_dir: PathBuf::from("test-results"),
        })
    }

    /// `<base>/pricing.html`
    pub fn pricing_url(&self) -> String {
        format!("{}/pricing.html", self.base_url)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|cores| cores.get() / 2)
        .unwrap_or(1)
        .max(1)
}
