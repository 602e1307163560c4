//! HTML response pages.
//!
//! Templates live in `templates/` and are compiled in by askama. They run
//! with escaping turned off and every interpolated field is a [`SafeHtml`],
//! so escaping happens exactly once, at the `UntrustedText` boundary.

use askama::Template;

use crate::submission::Submission;
use crate::text::SafeHtml;
use crate::text::escape_html;

/// Default site name shown in the confirmation page title.
pub const DEFAULT_SITE_NAME: &str = "株式会社Jecコンサルティング";

/// Escaped echo of an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub name: SafeHtml,
    pub email: SafeHtml,
    pub inquiry_type: SafeHtml,
}

impl Receipt {
    pub fn from_submission(submission: &Submission) -> Self {
        Self {
            name: submission.name.to_html(),
            email: submission.email.to_html(),
            inquiry_type: submission.inquiry_type.to_html(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html", escape = "none")]
struct ErrorPage<'a> {
    message: &'a SafeHtml,
    back_link: &'a SafeHtml,
}

#[derive(Template)]
#[template(path = "receipt.html", escape = "none")]
struct ReceiptPage<'a> {
    site_name: &'a SafeHtml,
    receipt: &'a Receipt,
    back_link: &'a SafeHtml,
}

/// Site-wide values shared by both pages.
#[derive(Debug, Clone)]
pub struct Pages {
    back_link: SafeHtml,
    site_name: SafeHtml,
}

impl Pages {
    pub fn new(back_link: &str, site_name: &str) -> Self {
        Self {
            back_link: escape_html(back_link),
            site_name: escape_html(site_name),
        }
    }

    pub fn render_error(&self, message: &str) -> askama::Result<String> {
        ErrorPage {
            message: &escape_html(message),
            back_link: &self.back_link,
        }
        .render()
    }

    pub fn render_receipt(&self, receipt: &Receipt) -> askama::Result<String> {
        ReceiptPage {
            site_name: &self.site_name,
            receipt,
            back_link: &self.back_link,
        }
        .render()
    }
}

impl Default for Pages {
    fn default() -> Self {
        Self::new(crate::DEFAULT_BACK_LINK, DEFAULT_SITE_NAME)
    }
}
