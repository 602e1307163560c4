//! Request handling: the whole pipeline from raw form to response page.

use crate::clock::Clock;
use crate::clock::OffsetClock;
use crate::clock::format_timestamp;
use crate::error::IntakeError;
use crate::ledger::Ledger;
use crate::ledger::LedgerRecord;
use crate::pages::Pages;
use crate::pages::Receipt;
use crate::spam::HoneypotFilter;
use crate::spam::SpamFilter;
use crate::spam::SpamVerdict;
use crate::submission::FormFields;
use crate::submission::Submission;

pub const CONTENT_TYPE_HTML: &str = "text/html; charset=utf-8";
pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";

/// Transport-neutral view of one form post.
#[derive(Debug, Clone)]
pub struct IntakeRequest {
    pub method: String,
    pub fields: FormFields,
    pub remote_addr: Option<String>,
    pub user_agent: Option<String>,
}

impl IntakeRequest {
    pub fn new(method: impl Into<String>, fields: FormFields) -> Self {
        Self {
            method: method.into(),
            fields,
            remote_addr: None,
            user_agent: None,
        }
    }

    pub fn post(fields: FormFields) -> Self {
        Self::new("POST", fields)
    }

    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

/// Terminal state of a request.
#[derive(Debug)]
pub enum Outcome {
    Rejected(IntakeError),
    Accepted(Receipt),
}

pub struct Intake {
    ledger: Ledger,
    spam_filter: Box<dyn SpamFilter>,
    clock: Box<dyn Clock>,
    pages: Pages,
}

impl Intake {
    /// Honeypot on `company`, Tokyo timestamps, default pages.
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger,
            spam_filter: Box::new(HoneypotFilter::default()),
            clock: Box::new(OffsetClock::default()),
            pages: Pages::default(),
        }
    }

    pub fn with_spam_filter(mut self, filter: impl SpamFilter + 'static) -> Self {
        self.spam_filter = Box::new(filter);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_pages(mut self, pages: Pages) -> Self {
        self.pages = pages;
        self
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn pages(&self) -> &Pages {
        &self.pages
    }

    /// Run the pipeline. The first failing step decides the rejection and
    /// nothing is written unless every check passes.
    pub fn process(&self, request: &IntakeRequest) -> Outcome {
        match self.accept(request) {
            Ok(receipt) => Outcome::Accepted(receipt),
            Err(err) => Outcome::Rejected(err),
        }
    }

    fn accept(&self, request: &IntakeRequest) -> Result<Receipt, IntakeError> {
        if request.method != "POST" {
            return Err(IntakeError::MethodNotAllowed {
                method: request.method.clone(),
            });
        }

        if self.spam_filter.inspect(&request.fields) == SpamVerdict::Reject {
            return Err(IntakeError::BotSuspected);
        }

        let submission = Submission::from_form(&request.fields)?;

        let record = LedgerRecord::new(
            format_timestamp(&self.clock.now()),
            &submission,
            request.remote_addr.as_deref(),
            request.user_agent.as_deref(),
        );
        self.ledger.append(&record)?;

        Ok(Receipt::from_submission(&submission))
    }

    /// Process and render.
    pub fn handle(&self, request: &IntakeRequest) -> IntakeResponse {
        match self.process(request) {
            Outcome::Accepted(receipt) => {
                tracing::info!(ledger = %self.ledger.path().display(), "submission accepted");
                respond(200, self.pages.render_receipt(&receipt))
            }
            Outcome::Rejected(err) => {
                match &err {
                    IntakeError::BotSuspected => tracing::debug!("submission rejected: {err}"),
                    e if e.is_storage() => tracing::warn!("submission rejected: {err}"),
                    _ => tracing::info!("submission rejected: {err}"),
                }
                respond(err.status(), self.pages.render_error(err.user_message()))
            }
        }
    }
}

fn respond(status: u16, page: askama::Result<String>) -> IntakeResponse {
    match page {
        Ok(body) => IntakeResponse {
            status,
            content_type: CONTENT_TYPE_HTML,
            body,
        },
        Err(err) => {
            tracing::error!("failed to render page: {err}");
            IntakeResponse {
                status: 500,
                content_type: CONTENT_TYPE_TEXT,
                body: "internal server error".to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io;

    use super::*;
    use pretty_assertions::assert_eq;

    fn tanaka() -> FormFields {
        [
            ("name", "田中"),
            ("email", "tanaka@example.com"),
            ("type", "相談"),
            ("message", "よろしくお願いします"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn lock_failure_renders_lock_message() {
        let tmp = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(tmp.path().join("inquiries.csv"))
            .with_lock(|_: &File| Err(io::Error::other("flock refused")));
        let intake = Intake::new(ledger);

        let response = intake.handle(&IntakeRequest::post(tanaka()));

        assert_eq!(response.status, 400);
        assert_eq!(response.content_type, CONTENT_TYPE_HTML);
        assert!(response.body.contains("保存処理に失敗しました（ロック）。"));
        assert_eq!(std::fs::read_to_string(intake.ledger().path()).unwrap(), "");
    }
}
