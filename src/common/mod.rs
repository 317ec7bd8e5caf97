pub mod display;
pub mod logging;
pub mod progress;
pub mod types;
pub mod utils;

pub use display::*;
pub use logging::*;
pub use progress::create_spinner;
pub use types::*;
pub use utils::*;
