//! Browser console logging and panic reporting.

use log::{Level, LevelFilter, Log, Metadata, Record};

/// Which console method a record goes to.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConsoleMethod {
    Error,
    Warn,
    Log,
}

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
pub(crate) fn method_for(level: Level) -> ConsoleMethod {
    match level {
        Level::Error => ConsoleMethod::Error,
        Level::Warn => ConsoleMethod::Warn,
        _ => ConsoleMethod::Log,
    }
}

pub(crate) fn format_record(level: Level, target: &str, message: &str) -> String {
    format!("[{level} {target}] {message}")
}

/// `log` backend writing to the browser console.
struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_record(record.level(), record.target(), &record.args().to_string());
        #[cfg(target_arch = "wasm32")]
        {
            let line = wasm_bindgen::JsValue::from_str(&line);
            match method_for(record.level()) {
                ConsoleMethod::Error => web_sys::console::error_1(&line),
                ConsoleMethod::Warn => web_sys::console::warn_1(&line),
                ConsoleMethod::Log => web_sys::console::log_1(&line),
            }
        }
        #[cfg(not(target_arch = "wasm32"))]
        eprintln!("{line}");
    }

    fn flush(&self) {}
}

/// Install the console logger. Later calls only adjust the level.
pub(crate) fn init_logging(level: LevelFilter) {
    if log::set_logger(&LOGGER).is_ok() {
        log::debug!("console logger installed");
    }
    log::set_max_level(level);
}

pub(crate) fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Procedural puzzles panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_map_to_console_methods() {
        assert_eq!(method_for(Level::Error), ConsoleMethod::Error);
        assert_eq!(method_for(Level::Warn), ConsoleMethod::Warn);
        assert_eq!(method_for(Level::Info), ConsoleMethod::Log);
        assert_eq!(method_for(Level::Trace), ConsoleMethod::Log);
    }

    #[test]
    fn record_format() {
        assert_eq!(
            format_record(Level::Warn, "pp_core::lint", "[no-fragments] empty"),
            "[WARN pp_core::lint] [no-fragments] empty"
        );
    }
}
