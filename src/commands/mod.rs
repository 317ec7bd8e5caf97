pub mod expand;
pub mod list;
pub mod peek;
pub mod read;

pub use expand::run_expand;
pub use list::run_list;
pub use peek::run_peek;
pub use read::run_read;
