//! `pkgcommit demo` – a synthetic commit for previewing the console.

use anyhow::Result;
use pkgcommit_core::callbacks::EngineEvent;
use pkgcommit_core::config::PkgcommitConfig;
use pkgcommit_core::event_log::LogRecord;
use pkgcommit_core::ledger::{CommitTotals, PackageRef};
use std::time::Duration;
use url::Url;

use super::replay::{drive_session, finish};

const MIRROR: &str = "http://download.example.org/repo/oss";
const PROGRESS_STEPS: i32 = 5;
const NAMES: &[&str] = &[
    "bash", "coreutils", "glibc", "kernel-default", "libzypp", "openssl", "systemd", "vim",
    "zlib", "zypper",
];

/// Shape of the synthetic commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoPlan {
    pub downloads: u32,
    pub installs: u32,
    /// Downloads in flight at once; 0 is treated as 1.
    pub parallel: u32,
}

pub async fn run_demo(cfg: PkgcommitConfig, plan: DemoPlan, delay_ms: u64) -> Result<()> {
    let records = demo_records(plan)?;
    tracing::info!(?plan, records = records.len(), "starting demo commit");
    let outcome = drive_session(cfg, records, Duration::from_millis(delay_ms)).await?;
    finish(outcome)
}

fn demo_package(n: u32) -> PackageRef {
    let name = NAMES[(n as usize - 1) % NAMES.len()];
    let edition = format!("1.{}-{}", n, n % 3 + 1);
    let size = 512 * 1024 * u64::from(n % 7 + 1);
    PackageRef::new(name, edition.as_str())
        .with_arch("x86_64")
        .with_location(format!("x86_64/{}-{}.x86_64.rpm", name, edition))
        .with_sizes(size, size * 3)
}

fn package_url(package: &PackageRef) -> Result<Url> {
    Ok(Url::parse(&format!("{}/{}", MIRROR, package.location))?)
}

/// Build the event stream: downloads in batches of `parallel`, then serial installs.
pub fn demo_records(plan: DemoPlan) -> Result<Vec<LogRecord>> {
    let packages: Vec<PackageRef> = (1..=plan.downloads).map(demo_package).collect();
    let bytes: u64 = packages.iter().map(|p| p.download_size.get()).sum();
    let mut records = vec![LogRecord::CommitBegin(CommitTotals::new(
        plan.downloads,
        bytes,
        plan.installs,
    ))];

    let width = plan.parallel.max(1) as usize;
    for batch in packages.chunks(width) {
        let urls = batch.iter().map(package_url).collect::<Result<Vec<_>>>()?;
        for (package, url) in batch.iter().zip(&urls) {
            records.push(LogRecord::Event(EngineEvent::ResolvableDownloadStart {
                package: package.clone(),
                url: url.clone(),
            }));
            records.push(LogRecord::Event(EngineEvent::DownloadStart {
                url: url.clone(),
                local_path: None,
            }));
        }
        for step in 1..=PROGRESS_STEPS {
            for (package, url) in batch.iter().zip(&urls) {
                let rate = package.download_size.get() as f64 / 2.0;
                records.push(LogRecord::Event(EngineEvent::DownloadProgress {
                    url: url.clone(),
                    percent: step * 100 / PROGRESS_STEPS,
                    rate_avg: rate,
                    rate_now: rate * (0.8 + 0.1 * f64::from(step)),
                }));
            }
        }
        for (package, url) in batch.iter().zip(&urls) {
            records.push(LogRecord::Event(EngineEvent::DownloadFinish {
                url: url.clone(),
                error: None,
            }));
            records.push(LogRecord::Event(EngineEvent::ResolvableDownloadFinish {
                package: package.clone(),
                error: None,
            }));
        }
    }

    for n in 1..=plan.installs {
        records.push(LogRecord::Event(EngineEvent::InstallStart {
            package: demo_package(n),
        }));
        for step in 1..=PROGRESS_STEPS {
            records.push(LogRecord::Event(EngineEvent::InstallProgress {
                percent: step * 100 / PROGRESS_STEPS,
            }));
        }
        records.push(LogRecord::Event(EngineEvent::InstallFinish {
            error: None,
            info: None,
        }));
    }

    records.push(LogRecord::CommitEnd);
    Ok(records)
}
