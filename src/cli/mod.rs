pub mod check;
pub mod classify;
pub mod decide;
pub mod init;
pub mod log;
pub mod pushback;
