pub mod console;
pub mod file_utils;
pub mod logger;
