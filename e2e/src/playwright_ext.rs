use crate::error::E2eError;
use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use playwright::api::{
    page::{Event, Page},
    ElementHandle,
};
use serde::Deserialize;
use std::time::Duration;

const BODY_SAMPLE_LEN: usize = 200;

#[async_trait]
pub trait PageFetchExt {
    /// GETs `url` from inside the page, so the request carries the page's
    /// cookies and origin, and returns the response body.
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;
}

#[async_trait]
impl PageFetchExt for Page {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let fetched = self
            .evaluate::<_, FetchedBytes>(
                r#"async ([url, sampleLen]) => {
                const res = await fetch(url, { method: "GET", credentials: "include" });
                const result = { ok: res.ok, status: res.status, statusText: res.statusText };
                if (!res.ok) {
                    const body = await res.text().catch(() => "");
                    return { ...result, body: body.slice(0, sampleLen), bytes: [] };
                }
                const buf = await res.arrayBuffer();
                return { ...result, body: "", bytes: Array.from(new Uint8Array(buf)) };
            }"#,
                (url, BODY_SAMPLE_LEN),
            )
            .await?;

        if !fetched.ok {
            return Err(E2eError::FetchFailed {
                status: fetched.status,
                status_text: fetched.status_text,
                body: fetched.body,
            }
            .into());
        }
        Ok(fetched.bytes)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FetchedBytes {
    ok: bool,
    status: u16,
    status_text: String,
    body: String,
    bytes: Vec<u8>,
}

#[async_trait]
pub trait PagePopupExt {
    /// Clicks `element` and returns the popup it opened, or `None` if no
    /// popup showed up within `timeout`.
    async fn click_for_popup(
        &self,
        element: &ElementHandle,
        timeout: Duration,
    ) -> Result<Option<Page>>;
}

#[async_trait]
impl PagePopupExt for Page {
    async fn click_for_popup(
        &self,
        element: &ElementHandle,
        timeout: Duration,
    ) -> Result<Option<Page>> {
        // We subscribe to the event stream before clicking in order to not miss the popup
        let mut popup_stream = Box::pin(self.subscribe_event()?.filter_map(
            move |event_result| async move {
                match event_result {
                    Err(err) => Some(Err(err)), // Forward errors
                    Ok(Event::Popup(popup)) => Some(Ok(popup)),
                    Ok(_) => None, // Ignore other events
                }
            },
        ));

        element.click_builder().click().await?;

        match tokio::time::timeout(timeout, popup_stream.next()).await {
            Ok(Some(popup)) => Ok(Some(popup?)),
            Ok(None) | Err(_) => Ok(None),
        }
    }
}
