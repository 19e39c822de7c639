mod constants;
mod logging;
mod progress;

pub use self::constants::*;
pub use self::logging::init_logging_with_progress;
pub use self::progress::ProgressReporter;
