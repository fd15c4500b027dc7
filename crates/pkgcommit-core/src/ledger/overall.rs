//! Overall commit status: the summary label, percentage and ETA text.

/// Token shown when no estimate is available.
pub const ETA_UNKNOWN: &str = "N/A";

/// Overall status of a commit as computed from the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverallStatus {
    /// "Retrieving 2,3 of 5; installing 1 of 10" etc.; `None` when nothing is in flight.
    pub label: Option<String>,
    /// 0..=100, or -1 when unknown.
    pub percentage: i32,
    /// Seconds left, or -1 when unknown.
    pub eta_seconds: i64,
}

/// Formats an ETA the way historical console output did: `"N/A"`, `"0: 5"`, `"2: 5"`, `"12:30"`.
///
/// Seconds are right-justified to width 2 with spaces, minutes are never padded.
pub fn format_eta(eta_seconds: i64) -> String {
    if eta_seconds < 0 {
        return ETA_UNKNOWN.to_string();
    }
    if eta_seconds < 60 {
        return format!("0:{:2}", eta_seconds);
    }
    format!("{}:{:2}", eta_seconds / 60, eta_seconds % 60)
}

/// Builds the summary label from the active download sequence numbers and the current install.
///
/// `download_seqs` must already be in display order.
pub(crate) fn overall_label(
    download_seqs: &[u32],
    items_to_fetch: u32,
    install_seq: Option<u32>,
    items_to_install: u32,
) -> Option<String> {
    if !download_seqs.is_empty() {
        let seqs = download_seqs
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(",");
        return Some(match install_seq {
            None => format!("Retrieving {} of {}", seqs, items_to_fetch),
            Some(inst) => format!(
                "Retrieving {} of {}; installing {} of {}",
                seqs, items_to_fetch, inst, items_to_install
            ),
        });
    }
    install_seq.map(|inst| format!("Installing {} of {}", inst, items_to_install))
}
