use crate::obsreport::ReportableError;
use std::fmt::Display;
use thiserror::Error;

/// Why a scrape did not collect every metric point.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScrapeError {
    /// Some points were collected, `failed` were not.
    #[error("{message}")]
    Partial { message: String, failed: usize },

    #[error("{0}")]
    Failed(String),
}

pub type ScrapeResult<T> = Result<T, ScrapeError>;

impl ScrapeError {
    pub fn partial(err: impl Display, failed: usize) -> Self {
        ScrapeError::Partial {
            message: err.to_string(),
            failed,
        }
    }

    pub fn failed(err: impl Display) -> Self {
        ScrapeError::Failed(err.to_string())
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, ScrapeError::Partial { .. })
    }
}

impl ReportableError for ScrapeError {
    fn failed_items(&self) -> Option<usize> {
        match self {
            ScrapeError::Partial { failed, .. } => Some(*failed),
            ScrapeError::Failed(_) => None,
        }
    }
}

/// Collects the errors of the scrapers run in one scrape cycle.
#[derive(Debug, Default)]
pub struct ScrapeErrors {
    errs: Vec<ScrapeError>,
    failed: usize,
}

impl ScrapeErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a scrape that lost `failed` points.
    pub fn add_partial(&mut self, failed: usize, err: impl Display) {
        self.add(ScrapeError::partial(err, failed));
    }

    pub fn add(&mut self, err: ScrapeError) {
        if let ScrapeError::Partial { failed, .. } = &err {
            self.failed += failed;
        }
        self.errs.push(err);
    }

    pub fn is_empty(&self) -> bool {
        self.errs.is_empty()
    }

    /// One error for the whole cycle, `None` when nothing failed.
    ///
    /// The result is partial when any collected error was, with the summed
    /// failed count. Messages are joined with `"; "`.
    pub fn combine(self) -> Option<ScrapeError> {
        if self.errs.is_empty() {
            return None;
        }

        let any_partial = self.errs.iter().any(ScrapeError::is_partial);
        let message = self
            .errs
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");

        Some(if any_partial {
            ScrapeError::Partial {
                message,
                failed: self.failed,
            }
        } else {
            ScrapeError::Failed(message)
        })
    }
}
