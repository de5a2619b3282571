use cfg_if::cfg_if;
use std::io;
use tracing_subscriber::fmt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

cfg_if! {
    if #[cfg(feature = "file-log")] {
        use tracing_appender::non_blocking::WorkerGuard;
        use once_cell::sync::OnceCell;
        use std::env;
        use std::path::Path;

        static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

        pub fn init() {
            let filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"));

            // Optional file logging (RUST_LOG_FILE=logs/shotcam.log by default)
            let log_path = env::var("RUST_LOG_FILE").unwrap_or_else(|_| "logs/shotcam.log".to_string());
            let path = Path::new(&log_path);
            let (nb_writer, guard) = tracing_appender::non_blocking(
                tracing_appender::rolling::daily(
                    path.parent().unwrap_or(Path::new(".")),
                    path.file_name().unwrap_or(std::ffi::OsStr::new("shotcam.log")),
                )
            );

            let file_layer = fmt::layer()
                .with_writer(nb_writer)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_level(true)
                .compact();

            let installed = tracing_subscriber::registry()
                .with(filter)
                .with(console_layer())
                .with(file_layer)
                .try_init()
                .is_ok();

            if installed {
                let _ = FILE_GUARD.set(guard);
                install_panic_hook();
            }
        }
    } else {
        pub fn init() {
            let filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"));

            let installed = tracing_subscriber::registry()
                .with(filter)
                .with(console_layer())
                .try_init()
                .is_ok();

            if installed {
                install_panic_hook();
            }
        }
    }
}

/// Console (stderr) layer with file/line
fn console_layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .compact()
}

// Hook panics to log with backtrace
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let mut msg = String::new();
        if let Some(loc) = info.location() {
            msg.push_str(&format!("panic at {}:{}:{} ", loc.file(), loc.line(), loc.column()));
        }
        if let Some(s) = info.payload().downcast_ref::<&str>() { msg.push_str(s); }
        else if let Some(s) = info.payload().downcast_ref::<String>() { msg.push_str(s); }
        else { msg.push_str("<non-string panic>"); }
        let bt = std::backtrace::Backtrace::force_capture();
        tracing::error!("{}\nBacktrace:\n{:?}", msg, bt);
    }));
}
