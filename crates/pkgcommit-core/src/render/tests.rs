//! Tests for commit progress frames.

use super::*;
use crate::bytes::ByteCount;
use crate::ledger::{CommitTotals, PackageRef};
use crate::output::Verbosity;
use crate::test_support::captured_output;

fn ledger() -> ProgressLedger {
    ProgressLedger::new(CommitTotals::new(5, 5_000, 5))
}

#[test]
fn erase_targets_previous_frame_line_count() {
    let (mut out, stdout, _) = captured_output(Verbosity::Normal, true);
    let mut l = ledger();
    let mut r = TerminalRenderer::new();
    for key in ["a.rpm", "b.rpm", "c.rpm"] {
        l.on_download_start(key);
    }
    r.render(&l, &mut out);
    assert_eq!(r.last_erase(), 0);
    assert_eq!(r.line_count(), 3);
    stdout.take();

    l.on_download_finish("a.rpm", ByteCount(0));
    l.on_download_finish("b.rpm", ByteCount(0));
    r.render(&l, &mut out);
    assert_eq!(r.last_erase(), 3);
    assert_eq!(r.line_count(), 1);
    let frame = stdout.take();
    assert!(frame.starts_with("\u{1b}[3A\r\u{1b}[J\u{1b}[2K\r"), "{frame:?}");

    r.render(&l, &mut out);
    assert_eq!(r.last_erase(), 1);
    assert!(stdout.take().starts_with("\u{1b}[1A"));
}

#[test]
fn first_frame_layout() {
    let (mut out, stdout, _) = captured_output(Verbosity::Normal, true);
    let mut l = ledger();
    let mut r = TerminalRenderer::new();
    l.on_download_start("b.rpm");
    l.on_download_start("a.rpm");
    l.on_download_progress("a.rpm", 40, ByteCount(500));
    l.on_install_start(PackageRef::new("vim", "9.0-1"));
    r.render(&l, &mut out);
    assert_eq!(
        stdout.contents(),
        "Retrieving a.rpm [40% (500 B/s)]\n\
         Retrieving b.rpm [0% (0 B/s)]\n\
         Installing: vim-9.0-1\n\
         Retrieving 1,2 of 5; installing 1 of 5 0% ETA -:--"
    );
    assert!(!out.at_line_start());
}

#[test]
fn history_lines_are_printed_once() {
    let (mut out, stdout, _) = captured_output(Verbosity::Normal, true);
    let mut l = ledger();
    let mut r = TerminalRenderer::new();
    l.on_download_start("a.rpm");
    l.on_download_start("b.rpm");
    l.on_download_finish("a.rpm", ByteCount(500));
    r.render(&l, &mut out);
    r.render(&l, &mut out);
    r.render(&l, &mut out);
    let text = stdout.take();
    assert_eq!(text.matches("Retrieved a.rpm [500 B/s]\n").count(), 1);

    l.on_install_start(PackageRef::new("a", "1.0"));
    l.on_install_finish_with(Some("warning: /etc/a.conf created as /etc/a.conf.rpmnew"));
    r.render(&l, &mut out);
    r.render(&l, &mut out);
    let text = stdout.take();
    assert_eq!(text.matches("Installed a-1.0\n").count(), 1);
    assert_eq!(text.matches("created as /etc/a.conf.rpmnew\n").count(), 1);
}

#[test]
fn history_without_rate_has_no_brackets() {
    let (mut out, stdout, _) = captured_output(Verbosity::Normal, true);
    let mut l = ledger();
    let mut r = TerminalRenderer::new();
    l.on_download_start("a.rpm");
    l.on_download_finish("a.rpm", ByteCount(0));
    r.render(&l, &mut out);
    assert!(stdout.contents().starts_with("Retrieved a.rpm\n"));
}

#[test]
fn delta_modes() {
    let (mut out, stdout, _) = captured_output(Verbosity::Normal, true);
    let mut l = ledger();
    let mut r = TerminalRenderer::new();
    l.on_download_start("foo.rpm");
    l.on_delta_download_start("foo.rpm", "foo.delta.rpm", ByteCount(100));
    l.on_delta_download_progress("foo.rpm", 30, ByteCount(2048));
    r.render(&l, &mut out);
    assert!(stdout
        .take()
        .contains("Retrieving foo.delta.rpm [30% (2.00 KiB/s)]\n"));

    l.on_delta_apply_start("foo.rpm");
    l.on_delta_apply_progress("foo.rpm", 70);
    r.render(&l, &mut out);
    assert!(stdout.take().contains("Applying foo.delta.rpm [70%]\n"));

    l.on_delta_apply_finish("foo.rpm");
    l.on_download_progress("foo.rpm", 100, ByteCount(0));
    r.render(&l, &mut out);
    assert!(stdout.take().contains("Retrieving foo.rpm [100% (0 B/s)]\n"));
}

#[test]
fn empty_ledger_prints_nothing() {
    let (mut out, stdout, _) = captured_output(Verbosity::Normal, true);
    let mut r = TerminalRenderer::new();
    r.render(&ledger(), &mut out);
    assert_eq!(stdout.contents(), "");
    assert_eq!(r.line_count(), 0);
}

#[test]
fn summary_only_frame_clears_the_line() {
    let (mut out, stdout, _) = captured_output(Verbosity::Normal, true);
    let mut l = ledger();
    let mut r = TerminalRenderer::new();
    l.on_install_start(PackageRef::new("a", "1"));
    l.on_install_finish();
    l.on_install_start(PackageRef::new("b", "1"));
    r.render(&l, &mut out);
    stdout.take();
    l.on_install_finish();
    r.render(&l, &mut out);
    // one install line to erase; the summary goes away with nothing in flight
    let frame = stdout.take();
    assert!(frame.starts_with("\u{1b}[1A\r\u{1b}[J\u{1b}[2K\r"));
    assert!(frame.ends_with("Installed b-1\n"));
    assert!(out.at_line_start());

    l.on_download_start("x.rpm");
    r.render(&l, &mut out);
    l.on_download_finish("x.rpm", ByteCount(0));
    stdout.take();
    r.render(&l, &mut out);
    assert!(stdout.take().starts_with("\u{1b}[1A"));
}

#[test]
fn foreign_output_starts_a_fresh_block() {
    let (mut out, stdout, _) = captured_output(Verbosity::Normal, true);
    let mut l = ledger();
    let mut r = TerminalRenderer::new();
    l.on_download_start("a.rpm");
    l.on_download_start("b.rpm");
    r.render(&l, &mut out);
    out.info("Additional rpm output:", Verbosity::Normal);
    stdout.take();

    r.render(&l, &mut out);
    assert_eq!(r.last_erase(), 0);
    let frame = stdout.take();
    assert!(!frame.contains('\u{1b}'), "{frame:?}");
    assert!(frame.starts_with("Retrieving a.rpm"));
}

#[test]
fn plain_mode_appends_without_escapes() {
    let (mut out, stdout, _) = captured_output(Verbosity::Normal, false);
    let mut l = ledger();
    let mut r = TerminalRenderer::new();
    l.on_download_start("a.rpm");
    r.render(&l, &mut out);
    l.on_download_progress("a.rpm", 50, ByteCount(10));
    r.render(&l, &mut out);
    r.render(&l, &mut out);
    l.on_download_finish("a.rpm", ByteCount(500));
    l.on_install_start(PackageRef::new("a", "1.0"));
    r.render(&l, &mut out);
    l.on_install_finish();
    r.render(&l, &mut out);
    r.render(&l, &mut out);
    r.finish(&mut out);

    let text = stdout.contents();
    assert!(!text.contains('\u{1b}'));
    assert_eq!(
        text,
        "Retrieving a.rpm\n\
         ..\n\
         Retrieved a.rpm [500 B/s]\n\
         Installing: a-1.0\n\
         Installed a-1.0\n\
         .\n"
    );
    assert_eq!(r.last_erase(), 0);
}

#[test]
fn finish_closes_summary_line() {
    let (mut out, stdout, _) = captured_output(Verbosity::Normal, true);
    let mut l = ledger();
    let mut r = TerminalRenderer::new();
    l.on_download_start("a.rpm");
    r.render(&l, &mut out);
    r.finish(&mut out);
    assert!(stdout.contents().ends_with("0% ETA -:--\n"));
    assert!(out.at_line_start());
    assert_eq!(r.line_count(), 0);

    // nothing pending: no extra newline
    r.finish(&mut out);
    assert!(stdout.contents().ends_with("-:--\n"));
    assert!(!stdout.contents().ends_with("\n\n"));
}

#[test]
fn reset_forgets_announced_items() {
    let (mut out, stdout, _) = captured_output(Verbosity::Normal, true);
    let mut l = ledger();
    let mut r = TerminalRenderer::new();
    l.on_download_start("a.rpm");
    l.on_download_finish("a.rpm", ByteCount(0));
    r.render(&l, &mut out);
    r.finish(&mut out);

    r.reset();
    l.reset(CommitTotals::new(1, 0, 1));
    l.on_download_start("a.rpm");
    l.on_download_finish("a.rpm", ByteCount(0));
    r.render(&l, &mut out);
    assert_eq!(stdout.contents().matches("Retrieved a.rpm\n").count(), 2);
}

#[test]
fn summary_reports_percentage_and_eta() {
    let mut l = ProgressLedger::new(CommitTotals::new(2, 0, 2));
    assert_eq!(summary_line(&l), None);
    l.on_download_start("a");
    l.on_download_finish("a", ByteCount(0));
    l.on_download_start("b");
    l.set_eta_seconds(125);
    assert_eq!(
        summary_line(&l).as_deref(),
        Some("Retrieving 2 of 2 25% ETA 2: 5")
    );
}
