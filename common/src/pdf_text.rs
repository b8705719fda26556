//! Text extraction from PDF bytes through poppler's `pdftotext`.

use std::{io, process::Stdio};
use thiserror::Error;
use tokio::{io::AsyncWriteExt, process::Command};
use tracing::debug;

#[derive(Error, Debug)]
pub enum PdfTextError {
    #[error(
        "{program} not found. Install poppler-utils (Docker: apt-get install -y poppler-utils)."
    )]
    NotInstalled { program: String },

    #[error("{program} exited with {status}. stderr: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("failed to run {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// Runs an extraction program that reads a PDF on stdin and writes plain
/// text on stdout.
#[derive(Debug, Clone)]
pub struct PdfTextExtractor {
    program: String,
    args: Vec<String>,
}

impl Default for PdfTextExtractor {
    fn default() -> Self {
        Self::pdftotext("pdftotext")
    }
}

impl PdfTextExtractor {
    /// `<program> -layout - -`: keep the page layout, read stdin, write stdout.
    pub fn pdftotext(program: impl Into<String>) -> Self {
        Self::new(program, ["-layout", "-", "-"])
    }

    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PdfTextExtractor {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub async fn extract(&self, pdf_bytes: &[u8]) -> Result<String, PdfTextError> {
        debug!(program = %self.program, bytes = pdf_bytes.len(), "extracting pdf text");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| self.spawn_error(err))?;

        let mut stdin = child.stdin.take().ok_or_else(|| {
            self.io_error(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "stdin was not captured",
            ))
        })?;

        // stdout must be drained while stdin is written, or a large PDF
        // fills the pipe and both sides block.
        let feed = async move {
            stdin.write_all(pdf_bytes).await?;
            stdin.shutdown().await
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output.map_err(|err| self.io_error(err))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(PdfTextError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: if stderr.is_empty() {
                    "(empty)".to_string()
                } else {
                    stderr
                },
            });
        }
        fed.map_err(|err| self.io_error(err))?;

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn spawn_error(&self, err: io::Error) -> PdfTextError {
        if err.kind() == io::ErrorKind::NotFound {
            PdfTextError::NotInstalled {
                program: self.program.clone(),
            }
        } else {
            self.io_error(err)
        }
    }

    fn io_error(&self, source: io::Error) -> PdfTextError {
        PdfTextError::Io {
            program: self.program.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{pdf_fixture, plan_profile::classify, FuelType};

    #[tokio::test]
    async fn pipes_bytes_through_and_trims() {
        let cat = PdfTextExtractor::new("cat", Vec::<String>::new());
        let text = cat.extract(b"\n  Fuel type Gas  \n\n").await.unwrap();
        assert_eq!(text, "Fuel type Gas");
    }

    #[tokio::test]
    async fn handles_input_larger_than_a_pipe_buffer() {
        let cat = PdfTextExtractor::new("cat", Vec::<String>::new());
        let input = "gas charges ".repeat(50_000);
        let text = cat.extract(input.as_bytes()).await.unwrap();
        assert_eq!(text, input.trim());
    }

    #[tokio::test]
    async fn missing_program_is_reported_as_not_installed() {
        let missing = PdfTextExtractor::pdftotext("pdftotext-that-does-not-exist");
        let err = missing.extract(b"%PDF-1.4").await.unwrap_err();
        assert!(matches!(err, PdfTextError::NotInstalled { .. }));
        assert!(err.to_string().contains("poppler-utils"));
    }

    #[tokio::test]
    async fn non_zero_exit_carries_stderr() {
        let failing =
            PdfTextExtractor::new("sh", ["-c", "echo 'Syntax Error: bad xref' >&2; exit 3"]);
        let err = failing.extract(b"not a pdf").await.unwrap_err();
        match &err {
            PdfTextError::Failed { status, stderr, .. } => {
                assert!(status.contains('3'), "{}", status);
                assert_eq!(stderr, "Syntax Error: bad xref");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn exit_status_wins_over_broken_pipe() {
        let failing = PdfTextExtractor::new("false", Vec::<String>::new());
        let input = vec![0u8; 1 << 20];
        let err = failing.extract(&input).await.unwrap_err();
        match err {
            PdfTextError::Failed { stderr, .. } => assert_eq!(stderr, "(empty)"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn extracts_fixture_fact_sheet_when_pdftotext_is_installed() {
        let plan = crate::fixtures::find_plan("ORI2201GS").unwrap();
        let pdf = pdf_fixture::plan_fact_sheet(&plan);
        let text = match PdfTextExtractor::default().extract(&pdf).await {
            Ok(text) => text,
            Err(PdfTextError::NotInstalled { .. }) => return,
            Err(err) => panic!("{}", err),
        };
        assert_eq!(classify(&text), Some(FuelType::Gas), "{}", text);
    }
}
