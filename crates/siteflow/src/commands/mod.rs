pub mod artifacts;
pub mod domains;
pub mod init;
pub mod render;
pub mod validate;
