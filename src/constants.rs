/// Default bound on a single backing store call (seconds)
/// The remote sheet is the only store expected to come near it
pub const DEFAULT_STORE_TIMEOUT_SECS: u64 = 10;

/// Default base URL of the spreadsheet values API
pub const DEFAULT_SHEET_API_URL: &str = "https://sheets.googleapis.com";

/// Header carrying the editor password under the password access policy
pub const PASSWORD_HEADER: &str = "x-hub-password";

/// Default header set by a hosting proxy with the signed-in user
pub const DEFAULT_TRUSTED_USER_HEADER: &str = "x-forwarded-user";

// =============================================================================
// Table Names
// =============================================================================

pub const KPIS: &str = "kpis";
pub const POLICY_ACTIONS: &str = "policy_actions";
pub const SCORES: &str = "scores";
pub const PROJECTS: &str = "projects";
pub const BUDGETS: &str = "budgets";
pub const RISKS: &str = "risks";
pub const WEEKLY_EVAL: &str = "weekly_eval";
pub const DOCUMENTS: &str = "documents";

// =============================================================================
// Error Messages
// =============================================================================

/// Error message for a submission without a record body
pub const ERR_EMPTY_RECORD: &str = "Record must contain at least one column";

/// Error message for a key column list naming the same column twice
pub const ERR_DUPLICATE_KEY_COLUMN: &str = "Key columns must not repeat";
