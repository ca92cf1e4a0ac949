pub mod io_input;
pub(crate) mod logging;
pub(crate) mod serialization;

pub use logging::init_logging;
