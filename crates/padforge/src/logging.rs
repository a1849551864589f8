// Colorized wrappers for logging

use fern::Dispatch;

/// Crates whose records pass the verbosity filter.
const OWN_TARGETS: [&str; 3] = ["padforge", "padforge_device", "padforge_cache"];

#[inline(always)]
pub(crate) fn timestamp() -> String {
    chrono::Local::now().format("%Y.%m.%d %H:%M:%S").to_string()
}

#[macro_export]
macro_rules! print_error {
    ($($arg:tt)*) => {
        log::error!("{}", format!($($arg)*).bright_red());
    }
}

#[macro_export]
macro_rules! print_info {
    ($($arg:tt)*) => {
        log::info!($($arg)*);
    }
}

#[macro_export]
macro_rules! print_debug {
    ($($arg:tt)*) => {
        log::debug!("{}", format!($($arg)*).dimmed());
    }
}

#[macro_export]
macro_rules! print_warning {
    ($($arg:tt)*) => {
        log::warn!("{}", format!($($arg)*).bright_yellow());
    }
}

/// Setup the logger.
pub(crate) fn setup(verbose: bool, no_color: bool) {
    let log_level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    let dispatch = OWN_TARGETS.iter().fold(
        Dispatch::new()
            .format(|out, message, _record| {
                out.finish(format_args!("[{}] {message}", timestamp()));
            })
            .level(log::LevelFilter::Warn),
        |dispatch, target| dispatch.level_for(*target, log_level),
    );
    dispatch
        .chain(std::io::stdout())
        .apply()
        .expect("Unable to set up logger");

    if no_color {
        colored::control::set_override(false);
    }
}
