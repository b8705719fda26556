use pricing_e2e::{config::FIXTURE_BASE_URL, BrowserType, Config};
use std::collections::HashMap;

fn config_from(vars: &[(&str, &str)]) -> Config {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

#[test]
fn local_run_serves_the_fixture_site() {
    let config = config_from(&[]);
    assert!(config.spawn_fixture_site);
    assert_eq!(config.base_url, FIXTURE_BASE_URL);
    assert_eq!(config.pricing_url(), "http://127.0.0.1:8000/pricing.html");
    assert!(!config.ci);
    assert!(!config.headless);
    assert_eq!(config.retries, 0);
    assert!(config.workers >= 1);
    assert_eq!(config.browsers, vec![BrowserType::Chromium]);
    assert_eq!(config.pdftotext, "pdftotext");
}

#[test]
fn ci_run_is_headless_serial_and_retried() {
    let config = config_from(&[("CI", "true"), ("BASE_URL", "https://www.originenergy.com.au/")]);
    assert!(!config.spawn_fixture_site);
    assert_eq!(config.pricing_url(), "https://www.originenergy.com.au/pricing.html");
    assert!(config.headless);
    assert_eq!(config.retries, 1);
    assert_eq!(config.workers, 1);
}

#[test]
fn blank_variables_count_as_unset() {
    let config = config_from(&[("CI", ""), ("BASE_URL", "  ")]);
    assert!(!config.ci);
    assert!(config.spawn_fixture_site);
}

#[test]
fn headless_can_be_forced_either_way() {
    assert!(config_from(&[("HEADLESS", "1")]).headless);
    assert!(!config_from(&[("CI", "1"), ("HEADLESS", "false")]).headless);
    // unparseable values fall back to the CI default
    assert!(config_from(&[("CI", "1"), ("HEADLESS", "maybe")]).headless);
}

#[test]
fn browsers_are_parsed_from_a_list() {
    let config = config_from(&[("E2E_BROWSERS", "chromium, Firefox,,webkit")]);
    assert_eq!(
        config.browsers,
        vec![BrowserType::Chromium, BrowserType::Firefox, BrowserType::Webkit]
    );

    let err = Config::from_lookup(|key| (key == "E2E_BROWSERS").then(|| "edge".to_string()))
        .unwrap_err();
    assert!(err.to_string().contains("edge"));
}

#[test]
fn pdftotext_program_is_configurable() {
    let config = config_from(&[("PDFTOTEXT", "/opt/poppler/bin/pdftotext")]);
    assert_eq!(config.pdftotext, "/opt/poppler/bin/pdftotext");
}
