//! Caller-info data model and the lookup wire envelope

use serde::{Deserialize, Serialize};

/// Caller record returned by the lookup service.
///
/// `found` is the server's verdict; the optional fields may be absent even
/// on a found record. `phone_number` echoes the number that was looked up,
/// so a stale result can be matched against the call it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerInfo {
    pub name: Option<String>,
    pub campus: Option<String>,
    pub status: Option<String>,
    pub remark: Option<String>,
    pub phone_number: String,
    pub found: bool,
}

impl CallerInfo {
    /// Whether there is anything worth displaying.
    pub fn has_info(&self) -> bool {
        self.found && (self.name.is_some() || self.campus.is_some())
    }

    /// Whether the lead has been worked.
    ///
    /// Completed means the status is none of the open markers. Open
    /// markers arrive in many spellings ("un-assigned", "un_assigned",
    /// "Un Assigned", truncated "unassigne"), so comparison runs on the
    /// normalized form.
    pub fn is_completed(&self) -> bool {
        let status = match &self.status {
            Some(s) => normalize_status(s),
            None => return false,
        };
        !matches!(
            status.as_str(),
            "assigned" | "assign" | "new" | "unassigned" | "unassigne" | "unassign"
        )
    }

    /// Whether the lead is assigned to an agent.
    pub fn is_assigned(&self) -> bool {
        self.status_eq_ignore_case("assigned")
    }

    /// Whether the lead is new.
    pub fn is_new(&self) -> bool {
        self.status_eq_ignore_case("new")
    }

    /// Whether the lead is explicitly unassigned.
    pub fn is_unassigned(&self) -> bool {
        self.status_eq_ignore_case("unassigned")
    }

    fn status_eq_ignore_case(&self, expected: &str) -> bool {
        self.status
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case(expected))
            .unwrap_or(false)
    }
}

/// Lowercase, trim, and strip `-`, `_` and whitespace for comparison.
fn normalize_status(status: &str) -> String {
    status
        .trim()
        .chars()
        .filter(|c| !matches!(c, '-' | '_') && !c.is_whitespace())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Request body of the lookup endpoint.
#[derive(Debug, Serialize)]
pub(crate) struct LookupRequest<'a> {
    pub phone_number: &'a str,
}

/// Response envelope: `status == 1` is success, anything else carries an
/// `error` message. The payload is only read on success.
#[derive(Debug, Deserialize)]
pub(crate) struct LookupEnvelope {
    pub status: i32,
    pub data: Option<LookupData>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LookupData {
    pub name: Option<String>,
    pub campus: Option<String>,
    pub status: Option<String>,
    pub remark: Option<String>,
    pub found: bool,
}
