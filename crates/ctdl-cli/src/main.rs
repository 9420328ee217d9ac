use ctdl_core::logging;

mod cli;

fn main() {
    // Fall back to stderr when the state directory is unusable.
    if let Err(err) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable: {:#}", err);
    }

    std::process::exit(cli::run());
}
