pub mod io;
pub mod logging;
pub mod time;

pub use io::is_valid_email;
pub use logging::{initialize_logging, log_provision_event, mask_email};
