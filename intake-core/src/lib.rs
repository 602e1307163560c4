//! Contact-form intake: validation, ledger append, and response pages.
//!
//! The crate is transport-neutral. A host (see `contact-intake-server`)
//! decodes the HTTP request into an [`IntakeRequest`], calls
//! [`Intake::handle`], and writes the returned [`IntakeResponse`] back.
//!
//! ## Pipeline
//!
//! 1. Method check (`POST` only)
//! 2. Spam filter (honeypot by default)
//! 3. Normalization and required-field / email validation
//! 4. Locked append to the CSV ledger
//! 5. Confirmation or error page

pub mod clock;
pub mod email;
pub mod error;
pub mod handler;
pub mod ledger;
pub mod normalize;
pub mod pages;
pub mod spam;
pub mod submission;
pub mod text;

pub use clock::Clock;
pub use clock::OffsetClock;
pub use error::IntakeError;
pub use handler::Intake;
pub use handler::IntakeRequest;
pub use handler::IntakeResponse;
pub use handler::Outcome;
pub use ledger::Ledger;
pub use ledger::LedgerRecord;
pub use pages::Pages;
pub use pages::Receipt;
pub use spam::HoneypotFilter;
pub use spam::SpamFilter;
pub use spam::SpamVerdict;
pub use submission::FormFields;
pub use submission::Submission;
pub use text::SafeHtml;
pub use text::UntrustedText;

/// Default form field used as the honeypot.
pub const DEFAULT_HONEYPOT_FIELD: &str = "company";

/// Default link target for the "back" anchor on every page.
pub const DEFAULT_BACK_LINK: &str = "index.html#contact";
