//! Guest operating system helpers.

pub const OS_WINDOWS: &str = "windows";

const LITE_ENGINE_LOG_WINDOWS: &str = "C:\\Program Files\\lite-engine\\log.out";
const LITE_ENGINE_LOG_UNIX: &str = "/var/log/lite-engine.log";

/// Path of the in-guest agent's log file for the given guest OS.
#[must_use]
pub fn lite_engine_log_path(os: &str) -> &'static str {
    if os.eq_ignore_ascii_case(OS_WINDOWS) {
        LITE_ENGINE_LOG_WINDOWS
    } else {
        LITE_ENGINE_LOG_UNIX
    }
}
