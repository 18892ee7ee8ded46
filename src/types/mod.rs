pub mod records;
pub mod source;
pub mod uptime;
