#![feature(custom_test_frameworks)]
#![test_runner(e2e_test_runner)]

pub mod config;
pub mod download;
pub mod error;
pub mod expect;
pub mod pages;
pub mod playwright_ext;

pub use config::{BrowserType, Config};
pub use pages::{PlanTab, PricingPage};

use anyhow::Result;
use async_trait::async_trait;
use futures::{stream, FutureExt, StreamExt};
use playwright::{
    api::{Browser, Page},
    Playwright,
};
use std::{
    any::{type_name, Any},
    collections::HashMap,
    error::Error,
    fmt::{Debug, Display, Formatter},
    future::Future,
    net::SocketAddr,
    panic::AssertUnwindSafe,
    path::PathBuf,
    process::{Command, Stdio},
    sync::Arc,
    time::Duration,
};
use tokio::{net::TcpStream, runtime::Runtime, time::Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const FIXTURE_SITE_PACKAGE: &str = "pricing-web";
// Includes compiling the fixture site on a cold cache.
const FIXTURE_SITE_STARTUP: Duration = Duration::from_secs(300);

pub fn e2e_test_runner(tests: &[&dyn Testable]) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();

    if tests.is_empty() {
        println!("0 tests");
        return;
    }

    let config = match Config::from_env() {
        Ok(config) => Arc::new(config),
        Err(err) => {
            println!("{}", err);
            std::process::exit(1);
        }
    };

    let mut fixture_site = if config.spawn_fixture_site {
        Some(
            Command::new("cargo")
                .args(["run", "-p", FIXTURE_SITE_PACKAGE])
                .current_dir("..")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
                .unwrap(),
        )
    } else {
        None
    };

    let runtime = Runtime::new().unwrap();
    let results = runtime.block_on(async {
        if config.spawn_fixture_site {
            wait_for_fixture_site(&config).await?;
        }
        run_tests(tests, config.clone()).await
    });

    let exit_code = match results {
        Ok(test_results) => {
            println!("\nSummary:");

            for test_result in &test_results {
                println!("{}", test_result);
            }

            let successes = test_results
                .iter()
                .filter(|test_result| test_result.result.is_ok())
                .count();
            let flaky = test_results
                .iter()
                .filter(|test_result| test_result.is_flaky())
                .count();
            if successes == test_results.len() {
                println!("{} tests ran with success ({} flaky)", successes, flaky);
                0
            } else {
                println!("{} errors", test_results.len() - successes);
                1
            }
        }
        Err(error) => {
            println!("{:#?}", error);
            1
        }
    };

    if let Some(fixture_site) = &mut fixture_site {
        let _ = fixture_site.kill();
    }

    std::process::exit(exit_code);
}

async fn wait_for_fixture_site(config: &Config) -> Result<()> {
    let addr: SocketAddr = config
        .base_url
        .trim_start_matches("http://")
        .parse()?;
    let deadline = Instant::now() + FIXTURE_SITE_STARTUP;
    info!(%addr, "waiting for fixture site");
    loop {
        match TcpStream::connect(addr).await {
            Ok(_) => return Ok(()),
            Err(err) if Instant::now() >= deadline => {
                return Err(ErrorList::new(FixtureSiteUnreachable(addr), err).into())
            }
            Err(_) => tokio::time::sleep(Duration::from_millis(250)).await,
        }
    }
}

async fn run_tests(
    tests: &[&dyn Testable],
    config: Arc<Config>,
) -> anyhow::Result<Vec<TestResult>> {
    let playwright = Playwright::initialize().await?;
    playwright.prepare()?; // Install browsers

    let mut browser_map = HashMap::new();
    let mut initialization_errors: Option<ErrorList<FailedToInitialize>> = None;
    for &browser_type in &config.browsers {
        let launched = match browser_type {
            BrowserType::Chromium => {
                playwright
                    .chromium()
                    .launcher()
                    .headless(config.headless)
                    .args(&config.chromium_args)
                    .launch()
                    .await
            }
            BrowserType::Firefox => {
                playwright
                    .firefox()
                    .launcher()
                    .headless(config.headless)
                    .launch()
                    .await
            }
            BrowserType::Webkit => {
                playwright
                    .webkit()
                    .launcher()
                    .headless(config.headless)
                    .launch()
                    .await
            }
        };
        match launched {
            Ok(browser) => {
                browser_map.insert(browser_type, browser);
            }
            Err(err) => {
                if let Some(errs) = &mut initialization_errors {
                    errs.push(FailedToInitialize(browser_type), err);
                } else {
                    initialization_errors =
                        Some(ErrorList::new(FailedToInitialize(browser_type), err));
                }
            }
        }
    }

    if let Some(errors) = initialization_errors {
        return Err(errors.into());
    }

    let (results, error_list) = stream::iter(tests)
        .flat_map(|test| {
            let config = config.clone();
            stream::iter(browser_map.iter()).map(move |(&browser_type, browser)| {
                run_with_retries(*test, browser_type, browser, config.clone())
            })
        })
        .buffer_unordered(config.workers)
        .fold(
            (Vec::new(), None),
            |(mut test_results, errors), result| async move {
                match (result, errors) {
                    (Ok(test_result), errors) => {
                        test_results.push(test_result);
                        (test_results, errors)
                    }
                    (Err((context, err)), None) => {
                        (test_results, Some(ErrorList::new(context, err)))
                    }
                    (Err((context, err)), Some(mut error_list)) => {
                        error_list.push(context, err);
                        (test_results, Some(error_list))
                    }
                }
            },
        )
        .await;

    if let Some(error_list) = error_list {
        return Err(error_list.into());
    }

    Ok(results)
}

/// Runs one test in one browser, each attempt on a fresh context, until it
/// passes or retries run out.
async fn run_with_retries(
    test: &dyn Testable,
    browser_type: BrowserType,
    browser: &Browser,
    config: Arc<Config>,
) -> Result<TestResult, (FailedToOpenPage, Arc<playwright::Error>)> {
    let test_name = test.name();
    let failed_to_open = |err: Arc<playwright::Error>| {
        (
            FailedToOpenPage {
                browser_type,
                test_name,
            },
            err,
        )
    };

    let mut attempt = 0;
    loop {
        let context = browser
            .context_builder()
            .locale(&config.locale)
            .timezone_id(&config.timezone_id)
            .user_agent(&config.user_agent)
            .extra_http_headers(config.extra_http_headers.clone())
            .accept_downloads(true)
            .build()
            .await
            .map_err(failed_to_open)?;
        let page = context.new_page().await.map_err(failed_to_open)?;

        let ctx = Context {
            page: page.clone(),
            config: config.clone(),
        };
        let result = match tokio::time::timeout(config.test_timeout, test.run(ctx)).await {
            Ok(result) => result,
            Err(_) => Err(TestTimedOut(config.test_timeout).into()),
        };

        if result.is_err() {
            let screenshot =
                save_failure_screenshot(&page, &config, test_name, browser_type, attempt).await;
            if let Some(path) = screenshot {
                info!(path = %path.display(), "saved failure screenshot");
            }
        }
        let _ = context.close().await;

        match result {
            Err(err) if attempt < config.retries => {
                warn!(test = test_name, browser = %browser_type, error = %err, "retrying");
                attempt += 1;
            }
            result => {
                let test_result = TestResult {
                    test_name,
                    browser_type,
                    attempts: attempt + 1,
                    result,
                };
                println!("{}", test_result);
                return Ok(test_result);
            }
        }
    }
}

async fn save_failure_screenshot(
    page: &Page,
    config: &Config,
    test_name: &str,
    browser_type: BrowserType,
    attempt: u32,
) -> Option<PathBuf> {
    let bytes = page.screenshot_builder().screenshot().await.ok()?;
    let file_name = format!(
        "{}-{}-attempt{}.png",
        test_name.replace("::", "-"),
        browser_type,
        attempt + 1
    );
    let path = config.results_dir.join(file_name);
    tokio::fs::create_dir_all(&config.results_dir).await.ok()?;
    tokio::fs::write(&path, bytes).await.ok()?;
    Some(path)
}

struct TestResult {
    test_name: &'static str,
    browser_type: BrowserType,
    attempts: u32,
    result: anyhow::Result<()>,
}

impl TestResult {
    fn is_flaky(&self) -> bool {
        self.result.is_ok() && self.attempts > 1
    }
}

impl Display for TestResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.result {
            Ok(()) if self.is_flaky() => write!(
                f,
                "{} in {}...\t[FLAKY] passed on attempt {}",
                self.test_name, self.browser_type, self.attempts
            ),
            Ok(()) => write!(f, "{} in {}...\t[OK]", self.test_name, self.browser_type),
            Err(err) => write!(
                f,
                "{} in {}...\t[FAILED] after {} attempt(s)\n{:#?}",
                self.test_name, self.browser_type, self.attempts, err
            ),
        }
    }
}

pub struct Context {
    pub page: Page,
    pub config: Arc<Config>,
}

impl Context {
    pub fn pricing_page(&self) -> PricingPage<'_> {
        PricingPage::new(&self.page, &self.config)
    }
}

#[async_trait]
pub trait Testable {
    fn name(&self) -> &'static str;
    async fn run(&self, ctx: Context) -> Result<()>;
}

#[async_trait]
impl<F, FF> Testable for F
where
    F: Fn(Context) -> FF + Sync,
    FF: Send,
    AssertUnwindSafe<FF>: Future<Output = Result<()>>,
{
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }

    async fn run(&self, ctx: Context) -> Result<()> {
        let result = AssertUnwindSafe(self(ctx)).catch_unwind().await;
        match result {
            Ok(future) => future,
            Err(err) => Err(CaughtPanic::new(err).into()),
        }
    }
}

struct ErrorList<C> {
    vec: Vec<(C, anyhow::Error)>,
}

impl<C> ErrorList<C> {
    fn new<E: Into<anyhow::Error>>(context: C, error: E) -> Self {
        ErrorList {
            vec: vec![(context, error.into())],
        }
    }

    fn push<E: Into<anyhow::Error>>(&mut self, context: C, error: E) {
        self.vec.push((context, error.into()));
    }
}

impl<C: Display> Debug for ErrorList<C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "ErrorList:")?;
        for (context, error) in &self.vec {
            writeln!(f, "\t- {}: {:#?}", context, error)?;
        }
        Ok(())
    }
}

impl<C: Display> Display for ErrorList<C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "ErrorList:")?;
        for (context, error) in &self.vec {
            writeln!(f, "\t- {}: {}", context, error)?;
        }
        Ok(())
    }
}

impl<C: Display> Error for ErrorList<C> {}

struct FailedToInitialize(BrowserType);

impl Display for FailedToInitialize {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to initialize {}", self.0)
    }
}

struct FixtureSiteUnreachable(SocketAddr);

impl Display for FixtureSiteUnreachable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Fixture site ({}) did not start listening on {}",
            FIXTURE_SITE_PACKAGE, self.0
        )
    }
}

struct FailedToOpenPage {
    test_name: &'static str,
    browser_type: BrowserType,
}

impl Display for FailedToOpenPage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Failed to open page in {} of {}",
            self.browser_type, self.test_name
        )
    }
}

#[derive(Debug)]
struct TestTimedOut(Duration);

impl Display for TestTimedOut {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Test timed out after {:?}", self.0)
    }
}

impl Error for TestTimedOut {}

struct CaughtPanic(Option<Box<str>>);

impl CaughtPanic {
    fn new(err: Box<dyn Any + Send + 'static>) -> Self {
        match err.downcast::<String>() {
            Ok(str) => CaughtPanic(Some(str.into_boxed_str())),
            Err(err) => match err.downcast::<&str>() {
                Ok(str) => CaughtPanic(Some(str.to_string().into_boxed_str())),
                Err(_) => CaughtPanic(None),
            },
        }
    }
}

impl Debug for CaughtPanic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for CaughtPanic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(str_err) => write!(f, "{}", str_err),
            None => write!(f, "Unknown error"),
        }
    }
}

impl Error for CaughtPanic {}
