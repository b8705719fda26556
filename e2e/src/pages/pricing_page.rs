//! Page object for the pricing page: address lookup, plan-type filter and the
//! results table with its fact sheet links.

use crate::{
    error::E2eError,
    expect,
    playwright_ext::PagePopupExt,
    Config,
};
use anyhow::{Context as _, Result};
use playwright::api::{DocumentLoadState, ElementHandle, Page};
use pricing_common::{
    address::{match_suggestion, SuggestionMatch},
    files::is_pdf_url,
};
use std::time::Duration;
use tracing::{debug, error, info, warn};

const ADDRESS_SEARCH_INPUT: &str = "#address-lookup";
const ADDRESS_SUGGESTIONS_LISTBOX: &str = r#"[role="listbox"]"#;
const ADDRESS_SUGGESTION_OPTIONS: &str = r#"[role="option"]"#;
const SEARCH_RESULTS_CONTAINER: &str = "#searchResultsContainer";
const RESULT_ROWS: &str = r#"#searchResultsContainer [data-id^="row-"]"#;
// Electricity checkboxes exist in several tabs, only the address tab's counts.
const ADDRESS_TAB_PANEL: &str = "#tabpanel-0";
/// Plan BPID/EFS column
const PLAN_LINK_COLUMN: usize = 2;

const LOADED_TIMEOUT: Duration = Duration::from_secs(30);
const BODY_SAMPLE_LEN: usize = 200;

/// Where the plan's PDF ended up after clicking its link.
pub enum PlanTab {
    /// A popup that navigated to the PDF.
    Popup(Page),
    /// No usable popup; download from the pricing page itself.
    Main,
}

pub struct PricingPage<'a> {
    page: &'a Page,
    config: &'a Config,
}

impl<'a> PricingPage<'a> {
    pub fn new(page: &'a Page, config: &'a Config) -> Self {
        PricingPage { page, config }
    }

    pub fn page(&self) -> &'a Page {
        self.page
    }

    pub fn config(&self) -> &'a Config {
        self.config
    }

    pub async fn open(&self) -> Result<()> {
        self.goto(&self.config.pricing_url()).await
    }

    /// Opens the pricing page with `query` appended, e.g. `links=inert` to
    /// select a fixture site variant.
    pub async fn open_with_query(&self, query: &str) -> Result<()> {
        self.goto(&format!("{}?{}", self.config.pricing_url(), query)).await
    }

    async fn goto(&self, url: &str) -> Result<()> {
        info!(%url, "opening pricing page");
        self.page
            .goto_builder(url)
            .wait_until(DocumentLoadState::DomContentLoaded)
            .goto()
            .await?;
        Ok(())
    }

    /// The address lookup is visible and usable. Logs what did load if not.
    pub async fn expect_loaded(&self) -> Result<()> {
        let ready = async {
            expect::to_be_visible(self.page, ADDRESS_SEARCH_INPUT, LOADED_TIMEOUT).await?;
            let timeout = self.config.expect_timeout;
            expect::to_be_enabled(self.page, ADDRESS_SEARCH_INPUT, timeout).await
        };
        if let Err(err) = ready.await {
            let url = self.page.url().unwrap_or_default();
            let title = self.page.title().await.unwrap_or_default();
            let body = self.page.inner_text("body", None).await.unwrap_or_default();
            error!(
                %url,
                %title,
                body_sample = %body_sample(&body),
                "failed to find {}",
                ADDRESS_SEARCH_INPUT
            );
            return Err(err);
        }
        Ok(())
    }

    /// Types `address` and waits for the autocomplete listbox.
    pub async fn search_address(&self, address: &str) -> Result<()> {
        self.page
            .fill_builder(ADDRESS_SEARCH_INPUT, address)
            .fill()
            .await?;
        let timeout = self.config.expect_timeout;
        expect::to_be_visible(self.page, ADDRESS_SUGGESTIONS_LISTBOX, timeout).await
    }

    /// Clicks the suggestion best matching `full_address`: one containing the
    /// whole address, else one matching street and suburb, else the first.
    pub async fn select_address_from_suggestions(
        &self,
        full_address: &str,
    ) -> Result<SuggestionMatch> {
        let timeout = self.config.expect_timeout;
        expect::to_be_visible(self.page, ADDRESS_SUGGESTIONS_LISTBOX, timeout).await?;
        expect::to_be_visible(self.page, ADDRESS_SUGGESTION_OPTIONS, timeout).await?;

        let options = self.page.query_selector_all(ADDRESS_SUGGESTION_OPTIONS).await?;
        let mut labels = Vec::with_capacity(options.len());
        for option in &options {
            labels.push(option.inner_text().await?);
        }

        let found = match_suggestion(&labels, full_address)
            .ok_or_else(|| E2eError::NoSuggestions(full_address.to_string()))?;
        let index = found.index();
        debug!(?found, label = %labels[index], "selecting address suggestion");

        options[index].click_builder().click().await?;
        expect::to_be_hidden(self.page, ADDRESS_SUGGESTIONS_LISTBOX, timeout).await?;
        Ok(found)
    }

    pub async fn search_and_select_address(&self, full_address: &str) -> Result<SuggestionMatch> {
        self.search_address(full_address).await?;
        self.select_address_from_suggestions(full_address).await
    }

    /// At least one plan row is showing.
    pub async fn expect_plans_list_displayed(&self) -> Result<()> {
        let timeout = self.config.expect_timeout;
        expect::to_be_visible(self.page, SEARCH_RESULTS_CONTAINER, timeout).await?;
        expect::to_be_visible(self.page, RESULT_ROWS, timeout).await
    }

    pub async fn set_electricity_checked(&self, checked: bool) -> Result<()> {
        let timeout = self.config.expect_timeout;
        let checkbox = self.labelled_control(ADDRESS_TAB_PANEL, "Electricity").await?;

        expect::to_be_visible(self.page, &checkbox, timeout).await?;
        expect::to_be_enabled(self.page, &checkbox, timeout).await?;

        if checked {
            self.page.check_builder(&checkbox).check().await?;
        } else {
            self.page.uncheck_builder(&checkbox).uncheck().await?;
        }
        expect::to_be_checked(self.page, &checkbox, checked, timeout).await
    }

    /// href of the first row's plan PDF link.
    pub async fn first_plan_pdf_url(&self) -> Result<String> {
        self.expect_plans_list_displayed().await?;

        let link = self.first_plan_link().await?;
        link.scroll_into_view_if_needed(None).await?;
        let timeout = self.config.expect_timeout;
        expect::element_to_be_visible(&link, "first plan PDF link", timeout).await?;

        let href = link
            .get_attribute("href")
            .await?
            .filter(|href| !href.trim().is_empty())
            .ok_or(E2eError::MissingHref)?;
        Ok(href)
    }

    /// Clicks the first plan's link and reports where its PDF can be fetched.
    pub async fn open_first_plan_in_new_tab(&self) -> Result<PlanTab> {
        let link = self.first_plan_link().await?;
        let timeout = self.config.expect_timeout;
        expect::element_to_be_visible(&link, "first plan PDF link", timeout).await?;

        let popup = match self
            .page
            .click_for_popup(&link, self.config.popup_timeout)
            .await?
        {
            Some(popup) => popup,
            None => {
                warn!("Popup window for PDF did not open. Falling back to direct download.");
                return Ok(PlanTab::Main);
            }
        };

        let reached_pdf =
            expect::url_to_match(&popup, "a PDF", self.config.pdf_url_timeout, is_pdf_url).await;
        match reached_pdf {
            Ok(url) => {
                debug!(%url, "popup reached plan PDF");
                Ok(PlanTab::Popup(popup))
            }
            Err(err) => {
                warn!(
                    error = %err,
                    "Popup did not navigate to a PDF URL. Falling back to direct download."
                );
                Ok(PlanTab::Main)
            }
        }
    }

    /// Link in the Plan BPID/EFS cell of the first result row.
    async fn first_plan_link(&self) -> Result<ElementHandle> {
        expect::poll_for(self.config.expect_timeout, "first plan PDF link", || async move {
            let row = match self.page.query_selector(RESULT_ROWS).await? {
                Some(row) => row,
                None => return Ok::<_, anyhow::Error>(None),
            };
            let cells = row.query_selector_all("td").await?;
            match cells.get(PLAN_LINK_COLUMN) {
                Some(cell) => Ok(cell.query_selector("a").await?),
                None => Ok(None),
            }
        })
        .await
    }

    /// Selector for the form control labelled exactly `label` inside
    /// `scope`.
    ///
    /// The control is tagged with a `data-e2e-label` attribute, as plain CSS
    /// can't follow a `<label for>` back to its input.
    async fn labelled_control(&self, scope: &str, label: &str) -> Result<String> {
        expect::poll_for(
            self.config.expect_timeout,
            format!("control labelled {:?} in {}", label, scope),
            || async move {
                let found = self
                    .page
                    .evaluate::<_, bool>(
                        r#"([scope, label]) => {
                        const root = document.querySelector(scope);
                        if (!root) return false;
                        const byLabel = Array.from(root.querySelectorAll("label"))
                            .find(l => l.textContent.trim() === label);
                        const control = (byLabel && (byLabel.control
                                || (byLabel.htmlFor && document.getElementById(byLabel.htmlFor))))
                            || Array.from(root.querySelectorAll("[aria-label]"))
                                .find(el => el.getAttribute("aria-label").trim() === label);
                        if (!control) return false;
                        control.setAttribute("data-e2e-label", label);
                        return true;
                    }"#,
                        (scope, label),
                    )
                    .await?;
                Ok::<_, anyhow::Error>(found.then(|| ()))
            },
        )
        .await
        .with_context(|| E2eError::NotFound(format!("{:?} checkbox in {}", label, scope)))?;

        Ok(format!(r#"{} [data-e2e-label="{}"]"#, scope, label))
    }
}

fn body_sample(body: &str) -> String {
    let sample: String = body.chars().take(BODY_SAMPLE_LEN).collect();
    sample.split_whitespace().collect::<Vec<_>>().join(" ")
}
