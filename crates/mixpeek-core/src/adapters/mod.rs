//! Output adapters for ad-tech platforms.
//!
//! Every adapter is total: any signal set, including an all-default one,
//! produces a complete output.

pub mod gam;
pub mod openrtb;
pub mod prebid;

pub use gam::{
    build_targeting, sanitize_value, validate_targeting, Targeting, TargetingIssue,
    TargetingValue, ValidationReport,
};
pub use openrtb::{enrich_bid_request, site_content, site_content_for, SiteContent};
pub use prebid::{ortb2_fragments, Ortb2Fragments, RtdMode, RtdParams};
