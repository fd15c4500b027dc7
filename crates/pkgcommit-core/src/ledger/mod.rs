//! Authoritative state of one in-progress commit.
//!
//! Downloads may run in parallel, installs are strictly serial. Every mutator
//! tolerates late or duplicate events: an unknown key is a no-op, never an
//! error.

mod item;
mod overall;

pub use item::{key_for_url, CommitTotals, ItemProgress, PackageRef};
pub use overall::{format_eta, OverallStatus, ETA_UNKNOWN};

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::bytes::ByteCount;

/// Progress of the running commit: totals, in-flight items and the one-shot
/// "just finished" buffer.
#[derive(Debug, Clone, Default)]
pub struct ProgressLedger {
    totals: CommitTotals,
    active: BTreeMap<String, ItemProgress>,
    recently_finished: BTreeMap<String, ItemProgress>,
    current_install: ItemProgress,
    last_finished_install: ItemProgress,
    last_download_seq: u32,
    last_install_seq: u32,
    /// Downloads finished or failed since reset.
    downloads_processed: u32,
    /// Installs finished or failed since reset.
    installs_processed: u32,
    overall_percentage: i32,
    overall_eta_seconds: i64,
    running: bool,
}

impl ProgressLedger {
    pub fn new(totals: CommitTotals) -> Self {
        let mut ledger = Self::default();
        ledger.reset(totals);
        ledger
    }

    /// Reinitialize for a new commit. Call once per commit before any event.
    pub fn reset(&mut self, totals: CommitTotals) {
        self.totals = totals;
        self.active.clear();
        self.recently_finished.clear();
        self.current_install = ItemProgress::default();
        self.last_finished_install = ItemProgress::default();
        self.last_download_seq = 0;
        self.last_install_seq = 0;
        self.downloads_processed = 0;
        self.installs_processed = 0;
        self.overall_percentage = -1;
        self.overall_eta_seconds = -1;
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    /// True only while a commit transaction is in progress.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Register a new download and hand back its record for the caller to fill in.
    ///
    /// Starting a key that is already active overwrites it with a fresh record.
    pub fn on_download_start(&mut self, key: &str) -> &mut ItemProgress {
        self.last_download_seq = self.last_download_seq.saturating_add(1);
        let item = ItemProgress::with_sequence(self.last_download_seq);
        if self.active.insert(key.to_string(), item).is_some() {
            tracing::debug!(key, "download restarted while still active");
        }
        self.active
            .entry(key.to_string())
            .or_insert_with(ItemProgress::default)
    }

    /// Update percentage and current speed of an active download. Returns false if unknown.
    pub fn on_download_progress(&mut self, key: &str, percent: i32, speed_now: ByteCount) -> bool {
        let Some(item) = self.active.get_mut(key) else {
            return false;
        };
        item.percentage = percent.clamp(-1, 100);
        item.speed_current = speed_now;
        true
    }

    /// The transfer layer finished the file; the download stays active until the
    /// resolvable-level finish moves it.
    pub fn on_transfer_done(&mut self, key: &str, average_rate: ByteCount) -> bool {
        let Some(item) = self.active.get_mut(key) else {
            return false;
        };
        item.percentage = 100;
        if !average_rate.is_zero() {
            item.speed_average = average_rate;
        }
        true
    }

    /// Move a download from `active` to `recently_finished`. Returns false if unknown.
    pub fn on_download_finish(&mut self, key: &str, final_rate: ByteCount) -> bool {
        let Some(mut item) = self.active.remove(key) else {
            return false;
        };
        item.percentage = 100;
        if !final_rate.is_zero() {
            item.speed_average = final_rate;
        }
        self.recently_finished.insert(key.to_string(), item);
        self.downloads_processed = self.downloads_processed.saturating_add(1);
        self.refresh_estimate();
        true
    }

    /// Drop a failed download from `active`, keeping the message on the returned record.
    pub fn on_download_failed(&mut self, key: &str, message: &str) -> Option<ItemProgress> {
        let mut item = self.active.remove(key)?;
        item.error_message = message.to_string();
        self.downloads_processed = self.downloads_processed.saturating_add(1);
        self.refresh_estimate();
        Some(item)
    }

    // delta rpm sub-events

    pub fn on_delta_download_start(&mut self, key: &str, filename: &str, size: ByteCount) -> bool {
        let Some(item) = self.active.get_mut(key) else {
            return false;
        };
        item.delta_filename = filename.to_string();
        item.delta_size = size;
        item.delta_download_pct = 0;
        true
    }

    pub fn on_delta_download_progress(&mut self, key: &str, percent: i32, speed_now: ByteCount) -> bool {
        let Some(item) = self.active.get_mut(key) else {
            return false;
        };
        item.delta_download_pct = percent.clamp(0, 100);
        item.speed_current = speed_now;
        true
    }

    pub fn on_delta_download_finish(&mut self, key: &str) -> bool {
        let Some(item) = self.active.get_mut(key) else {
            return false;
        };
        item.delta_download_pct = 100;
        true
    }

    pub fn on_delta_apply_start(&mut self, key: &str) -> bool {
        let Some(item) = self.active.get_mut(key) else {
            return false;
        };
        item.delta_download_pct = 100;
        item.delta_apply_pct = 0;
        true
    }

    pub fn on_delta_apply_progress(&mut self, key: &str, percent: i32) -> bool {
        let Some(item) = self.active.get_mut(key) else {
            return false;
        };
        item.delta_apply_pct = percent.clamp(0, 100);
        true
    }

    pub fn on_delta_apply_finish(&mut self, key: &str) -> bool {
        let Some(item) = self.active.get_mut(key) else {
            return false;
        };
        item.delta_apply_pct = 100;
        true
    }

    pub fn on_install_start(&mut self, package: PackageRef) {
        self.last_install_seq = self.last_install_seq.saturating_add(1);
        let mut item = ItemProgress::with_sequence(self.last_install_seq);
        item.package = Some(package);
        self.current_install = item;
    }

    pub fn on_install_progress(&mut self, percent: i32) {
        if !self.current_install.is_empty() {
            self.current_install.percentage = percent.clamp(-1, 100);
        }
    }

    pub fn on_install_finish(&mut self) {
        self.on_install_finish_with(None);
    }

    /// Close the current install; `info` is shown under its "Installed" line.
    ///
    /// The install boundary also flushes `recently_finished`.
    pub fn on_install_finish_with(&mut self, info: Option<&str>) {
        if !self.current_install.is_empty() {
            let mut done = std::mem::take(&mut self.current_install);
            done.percentage = 100;
            if let Some(info) = info {
                done.info_message = info.to_string();
            }
            self.last_finished_install = done;
            self.installs_processed = self.installs_processed.saturating_add(1);
        }
        self.recently_finished.clear();
        self.refresh_estimate();
    }

    /// Abandon the current install, returning it with the error attached.
    pub fn on_install_failed(&mut self, message: &str) -> Option<ItemProgress> {
        if self.current_install.is_empty() {
            return None;
        }
        let mut failed = std::mem::take(&mut self.current_install);
        failed.error_message = message.to_string();
        self.installs_processed = self.installs_processed.saturating_add(1);
        self.refresh_estimate();
        Some(failed)
    }

    /// Engine-provided ETA hook; negative means unknown.
    pub fn set_eta_seconds(&mut self, eta_seconds: i64) {
        self.overall_eta_seconds = eta_seconds.max(-1);
    }

    fn refresh_estimate(&mut self) {
        let total = u64::from(self.totals.items_to_fetch) + u64::from(self.totals.items_to_install);
        if total == 0 {
            self.overall_percentage = -1;
            return;
        }
        let processed = u64::from(self.downloads_processed) + u64::from(self.installs_processed);
        self.overall_percentage = (processed * 100 / total).min(100) as i32;
    }

    /// Summary label plus the current percentage / ETA estimates.
    pub fn compute_overall(&self) -> OverallStatus {
        let mut seqs: Vec<u32> = self.active.values().map(|d| d.sequence_number).collect();
        seqs.sort_unstable();
        let install_seq =
            (!self.current_install.is_empty()).then_some(self.current_install.sequence_number);
        OverallStatus {
            label: overall::overall_label(
                &seqs,
                self.totals.items_to_fetch,
                install_seq,
                self.totals.items_to_install,
            ),
            percentage: self.overall_percentage,
            eta_seconds: self.overall_eta_seconds,
        }
    }

    pub fn eta_as_text(&self) -> String {
        format_eta(self.overall_eta_seconds)
    }

    pub fn totals(&self) -> &CommitTotals {
        &self.totals
    }

    pub fn active(&self) -> &BTreeMap<String, ItemProgress> {
        &self.active
    }

    pub fn recently_finished(&self) -> &BTreeMap<String, ItemProgress> {
        &self.recently_finished
    }

    pub fn current_install(&self) -> &ItemProgress {
        &self.current_install
    }

    pub fn last_finished_install(&self) -> &ItemProgress {
        &self.last_finished_install
    }

    pub fn last_download_seq(&self) -> u32 {
        self.last_download_seq
    }

    pub fn last_install_seq(&self) -> u32 {
        self.last_install_seq
    }

    pub fn overall_percentage(&self) -> i32 {
        self.overall_percentage
    }

    pub fn overall_eta_seconds(&self) -> i64 {
        self.overall_eta_seconds
    }

    /// Multi-line debug dump, traced on every render.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "--- commit ledger start ---");
        let _ = writeln!(
            out,
            "total:   {}/{}",
            self.totals.items_to_fetch, self.totals.items_to_install
        );
        let _ = writeln!(
            out,
            "current: {}/{}",
            self.last_download_seq, self.last_install_seq
        );
        let _ = writeln!(out, "getting: {}", self.active.len());
        for (key, item) in &self.active {
            let _ = writeln!(out, "  {} [{}%]", key, item.percentage);
        }
        let _ = writeln!(out, "--- commit ledger end ---");
        out
    }
}
