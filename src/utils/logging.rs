//! Logging helpers
//!
//! Subscriber setup plus the framed banners printed around a run

use chrono::NaiveDate;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber
///
/// `RUST_LOG` wins when set; otherwise `info`, or `debug` when verbose.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Record run start
///
/// # Arguments
/// - `target_date`: attendance date being registered
/// - `total`: participants for that date
pub fn log_startup(target_date: NaiveDate, total: usize) {
    info!("{}", "=".repeat(60));
    info!("📅 Date {} | participants: {}", target_date, total);
    info!("{}", "=".repeat(60));
}

/// Record group start
///
/// # Arguments
/// - `label`: group display label
/// - `size`: entries in the group
pub fn log_group_start(label: &str, size: usize) {
    info!("\n{}", "─".repeat(60));
    info!("➡️ {} ({} participants)", label, size);
}

/// Print the final run statistics
///
/// # Arguments
/// - `groups_ok`: groups processed to the batch submit
/// - `groups_failed`: groups aborted by an error
/// - `marked`: participants with attendance checked
/// - `failed`: participants that could not be enrolled or marked
pub fn print_final_stats(groups_ok: usize, groups_failed: usize, marked: usize, failed: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📊 Run summary");
    info!(
        "Finished at: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ Groups completed: {}/{}", groups_ok, groups_ok + groups_failed);
    info!("✔ Attendance marked: {}", marked);
    info!("❌ Participants failed: {}", failed);
    info!("{}", "=".repeat(60));
    info!("🏁 Done");
}
