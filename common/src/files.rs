//! Filesystem helpers for downloaded plan PDFs.

use once_cell::sync::Lazy;
use regex::Regex;
use std::{
    io,
    path::{Path, PathBuf},
};

const DOWNLOADS_DIR: &str = "downloads";
static PDF_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.pdf(\?.*)?$").unwrap());

/// `<cwd>/downloads`
pub fn downloads_dir() -> io::Result<PathBuf> {
    Ok(std::env::current_dir()?.join(DOWNLOADS_DIR))
}

pub fn build_download_path(file_name: &str) -> io::Result<PathBuf> {
    Ok(downloads_dir()?.join(file_name))
}

/// Creates `dir` and its parents; an existing directory is fine.
pub fn ensure_dir_exists(dir: &Path) -> io::Result<()> {
    std::fs::create_dir_all(dir)
}

/// Writes `bytes` to `path`, replacing any previous content.
pub async fn write_file_bytes(path: &Path, bytes: &[u8]) -> io::Result<()> {
    tokio::fs::write(path, bytes).await
}

pub async fn read_file_bytes(path: &Path) -> io::Result<Vec<u8>> {
    tokio::fs::read(path).await
}

pub async fn remove_file_if_exists(path: &Path) -> io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        result => result,
    }
}

/// Whether `url` points at a PDF document, query string allowed.
pub fn is_pdf_url(url: &str) -> bool {
    PDF_URL.is_match(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_path_is_under_cwd() {
        let path = build_download_path("origin-plan.pdf").unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("downloads/origin-plan.pdf"));
    }

    #[test]
    fn ensure_dir_exists_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a").join("b");
        ensure_dir_exists(&nested).unwrap();
        ensure_dir_exists(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[tokio::test]
    async fn write_overwrites_and_remove_tolerates_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("plan.pdf");

        write_file_bytes(&path, b"first version").await.unwrap();
        write_file_bytes(&path, b"%PDF").await.unwrap();
        assert_eq!(read_file_bytes(&path).await.unwrap(), b"%PDF");

        remove_file_if_exists(&path).await.unwrap();
        assert!(!path.exists());
        remove_file_if_exists(&path).await.unwrap();
    }

    #[tokio::test]
    async fn remove_propagates_other_errors() {
        let tmp = tempfile::tempdir().unwrap();
        // a directory can't be removed as a file
        assert!(remove_file_if_exists(tmp.path()).await.is_err());
    }

    #[test]
    fn recognises_pdf_urls() {
        assert!(is_pdf_url("https://example.com/docs/ORI123GS.pdf"));
        assert!(is_pdf_url("/plans/ORI123GS.PDF?version=3&x=y"));
        assert!(!is_pdf_url("about:blank"));
        assert!(!is_pdf_url("/plan-viewer.html?bpid=ORI2201GS"));
        assert!(!is_pdf_url("https://example.com/plans.pdf.html"));
    }
}
