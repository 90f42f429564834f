pub mod file_utils;
pub use file_utils as file;
