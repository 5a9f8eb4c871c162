pub mod grid;
pub mod init;
pub mod pick;
pub mod root;
