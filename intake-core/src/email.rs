//! Email address syntax check.
//!
//! Accepts the common `local@domain` shape: an ASCII dot-atom local part and
//! a dotted hostname made of letter-digit-hyphen labels. Single-label hosts
//! (`user@localhost`), quoted local parts, address literals
//! (`user@[192.0.2.1]`) and internationalized addresses are rejected.

use std::sync::LazyLock;

use regex_lite::Regex;

const MAX_ADDRESS_LEN: usize = 254;
const MAX_LOCAL_LEN: usize = 64;

#[allow(clippy::expect_used, reason = "constant pattern")]
static LOCAL_PART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*$")
        .expect("local-part pattern is a valid regex")
});

// At least one dot. The last label must start with a letter, so bare IPs and
// numeric TLDs fail.
#[allow(clippy::expect_used, reason = "constant pattern")]
static DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?$",
    )
    .expect("domain pattern is a valid regex")
});

pub fn is_valid_email(address: &str) -> bool {
    if address.len() > MAX_ADDRESS_LEN {
        return false;
    }
    let Some((local, domain)) = address.rsplit_once('@') else {
        return false;
    };
    if local.is_empty() || local.len() > MAX_LOCAL_LEN {
        return false;
    }
    LOCAL_PART.is_match(local) && DOMAIN.is_match(domain)
}
