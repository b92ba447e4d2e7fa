use std::panic::PanicHookInfo;
use std::sync::Once;

use tracing_subscriber::{
    filter::FilterFn, fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt,
};

const TAG: &str = "NearbyTrains-Rust";

fn is_ours(metadata: &tracing::Metadata<'_>) -> bool {
    metadata
        .module_path()
        .unwrap_or_default()
        .starts_with("nearby_trains")
}

pub(crate) fn setup_logging() {
    static LOGGING_SETUP: Once = Once::new();

    LOGGING_SETUP.call_once(|| {
        let filter = FilterFn::new(is_ours);

        #[cfg(target_os = "android")]
        let layer = {
            use tracing_logcat::{LogcatMakeWriter, LogcatTag};

            let writer = match LogcatMakeWriter::new(LogcatTag::Fixed(TAG.to_owned())) {
                Ok(writer) => writer,
                Err(e) => {
                    eprintln!("{TAG}: failed to initialize logcat writer: {e}");
                    return;
                }
            };
            tracing_subscriber::fmt::layer()
                .event_format(Format::default().with_level(false).without_time())
                .with_writer(writer)
                .with_ansi(false)
        };

        #[cfg(not(target_os = "android"))]
        let layer = tracing_subscriber::fmt::layer()
            .event_format(Format::default().with_target(false))
            .with_writer(std::io::stderr)
            .with_ansi(false);

        if tracing_subscriber::registry()
            .with(layer)
            .with(filter)
            .try_init()
            .is_err()
        {
            eprintln!("{TAG}: a global tracing subscriber was already installed");
        }
    })
}

pub(crate) fn panic_hook(info: &PanicHookInfo) {
    let backtrace = std::backtrace::Backtrace::force_capture();
    tracing::error!("{info}\n{backtrace}")
}
