//! Fetching plan fact sheets and checking what they say.

use crate::{
    error::E2eError,
    pages::{PlanTab, PricingPage},
    playwright_ext::PageFetchExt,
};
use anyhow::{ensure, Context as _, Result};
use playwright::api::Page;
use pricing_common::{
    files::{is_pdf_url, read_file_bytes, remove_file_if_exists, write_file_bytes},
    pdf_text::PdfTextExtractor,
    plan_profile::PlanProfile,
};
use std::path::Path;
use tracing::{info, warn};

/// Downloads `pdf_url` through `page` into `out_path`, replacing any earlier
/// download, and returns the bytes.
pub async fn download_pdf_to_file(
    page: &Page,
    pdf_url: &str,
    out_path: &Path,
) -> Result<Vec<u8>> {
    remove_file_if_exists(out_path)
        .await
        .with_context(|| format!("removing old {}", out_path.display()))?;

    let pdf_bytes = page.fetch_bytes(pdf_url).await?;
    write_file_bytes(out_path, &pdf_bytes)
        .await
        .with_context(|| format!("writing {}", out_path.display()))?;

    info!(
        url = %pdf_url,
        path = %out_path.display(),
        bytes = pdf_bytes.len(),
        "saved plan PDF"
    );
    Ok(pdf_bytes)
}

/// Clicks the first plan's link, then downloads its PDF from the popup if
/// one reached the PDF, else from the pricing page, and returns the bytes as
/// saved on disk.
pub async fn robust_download_plan_pdf(
    pricing_page: &PricingPage<'_>,
    pdf_url: &str,
    out_path: &Path,
) -> Result<Vec<u8>> {
    let plan_tab = pricing_page.open_first_plan_in_new_tab().await?;
    let popup;
    let download_page = match plan_tab {
        PlanTab::Popup(page) => {
            let url = page.url()?;
            if !is_pdf_url(&url) {
                return Err(E2eError::NotAPdfUrl(url).into());
            }
            popup = page;
            &popup
        }
        PlanTab::Main => {
            warn!("No popup for PDF, proceeding with direct download on main page.");
            pricing_page.page()
        }
    };

    download_pdf_to_file(download_page, pdf_url, out_path).await?;

    let saved_bytes = read_file_bytes(out_path)
        .await
        .with_context(|| format!("reading back {}", out_path.display()))?;
    ensure!(
        !saved_bytes.is_empty(),
        E2eError::EmptyDownload(out_path.display().to_string())
    );
    Ok(saved_bytes)
}

/// Extracts the PDF's text and requires it to read as a gas plan.
pub async fn expect_pdf_to_be_gas_plan(
    pdf_bytes: &[u8],
    extractor: &PdfTextExtractor,
) -> Result<()> {
    let text = extractor.extract(pdf_bytes).await?;
    PlanProfile::gas().check(&text)?;
    Ok(())
}
