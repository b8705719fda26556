//! Retrying assertions: every check is polled until it holds or its timeout
//! runs out.

use anyhow::Result;
use playwright::api::{ElementHandle, Page};
use std::{
    error::Error,
    fmt::{Display, Formatter},
    future::Future,
    time::Duration,
};
use tokio::time::{sleep, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct ExpectTimeout {
    pub expectation: String,
    pub timeout: Duration,
    pub last_error: Option<String>,
}

impl Display for ExpectTimeout {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Timed out after {:?} waiting for {}",
            self.timeout, self.expectation
        )?;
        if let Some(err) = &self.last_error {
            write!(f, " (last error: {})", err)?;
        }
        Ok(())
    }
}

impl Error for ExpectTimeout {}

/// Polls `check` until it yields `Some`. Errors from `check` count as "not
/// yet" so that elements mid re-render don't fail the wait.
pub async fn poll_for<T, F, Fut>(
    timeout: Duration,
    expectation: impl Display,
    mut check: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let deadline = Instant::now() + timeout;
    let mut last_error = None;
    loop {
        match check().await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {}
            Err(err) => last_error = Some(format!("{:#}", err)),
        }
        if Instant::now() >= deadline {
            return Err(ExpectTimeout {
                expectation: expectation.to_string(),
                timeout,
                last_error,
            }
            .into());
        }
        sleep(POLL_INTERVAL).await;
    }
}

pub async fn poll_until<F, Fut>(
    timeout: Duration,
    expectation: impl Display,
    mut check: F,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    poll_for(timeout, expectation, || {
        let fut = check();
        async move { Ok::<_, anyhow::Error>(fut.await?.then(|| ())) }
    })
    .await
}

pub async fn to_be_visible(page: &Page, selector: &str, timeout: Duration) -> Result<()> {
    poll_until(timeout, format!("{} to be visible", selector), || async move {
        Ok::<_, anyhow::Error>(page.is_visible(selector, None).await?)
    })
    .await
}

pub async fn to_be_hidden(page: &Page, selector: &str, timeout: Duration) -> Result<()> {
    poll_until(timeout, format!("{} to be hidden", selector), || async move {
        Ok::<_, anyhow::Error>(page.is_hidden(selector, None).await?)
    })
    .await
}

pub async fn to_be_enabled(page: &Page, selector: &str, timeout: Duration) -> Result<()> {
    poll_until(timeout, format!("{} to be enabled", selector), || async move {
        Ok::<_, anyhow::Error>(page.is_enabled(selector, None).await?)
    })
    .await
}

pub async fn to_be_checked(
    page: &Page,
    selector: &str,
    checked: bool,
    timeout: Duration,
) -> Result<()> {
    let expectation = if checked { "checked" } else { "not checked" };
    poll_until(timeout, format!("{} to be {}", selector, expectation), || async move {
        Ok::<_, anyhow::Error>(page.is_checked(selector, None).await? == checked)
    })
    .await
}

pub async fn element_to_be_visible(
    element: &ElementHandle,
    what: &str,
    timeout: Duration,
) -> Result<()> {
    poll_until(timeout, format!("{} to be visible", what), || async move {
        Ok::<_, anyhow::Error>(element.is_visible().await?)
    })
    .await
}

/// Polls the page URL until `matches` accepts it.
pub async fn url_to_match<F>(
    page: &Page,
    expectation: &str,
    timeout: Duration,
    matches: F,
) -> Result<String>
where
    F: Fn(&str) -> bool,
{
    poll_for(timeout, format!("URL to match {}", expectation), || {
        let url = page.url();
        let matched = url.map(|url| matches(&url).then(|| url));
        async move { Ok::<_, anyhow::Error>(matched?) }
    })
    .await
}
