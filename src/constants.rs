//! Application-wide constants
//!
//! Messages shown to students while the catalog runs in free trial mode,
//! and the fixed paths notes are exposed under.

/// Access summary attached to note listings during the free trial.
pub const TRIAL_MESSAGE: &str =
    "Currently in free trial - all content viewable, downloads coming soon!";

/// Short form used on search results.
pub const SEARCH_TRIAL_MESSAGE: &str = "Free trial access - downloads coming soon!";

/// Returned with the full document view during the free trial.
pub const VIEW_TRIAL_MESSAGE: &str =
    "Free trial access - downloads will be available after launch";

/// Body of the locked download response.
pub const DOWNLOAD_DISABLED_ERROR: &str =
    "Downloads are currently disabled during free trial period";
pub const DOWNLOAD_DISABLED_MESSAGE: &str =
    "Download functionality will be available after official launch";

/// Trial status on the student dashboard.
pub const DASHBOARD_TRIAL_MESSAGE: &str =
    "Currently in free trial period - all content viewable, downloads coming soon!";

/// Mobile money providers offered with a payment-required response.
/// Provider calls themselves are not implemented.
pub const PAYMENT_METHODS: [&str; 2] = ["mtn", "airtel"];

/// Key prefix for note attachments.
pub const NOTES_PREFIX: &str = "notes";

/// Key prefix for note previews.
pub const PREVIEWS_PREFIX: &str = "previews";
