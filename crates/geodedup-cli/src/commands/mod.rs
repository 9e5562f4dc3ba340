pub mod add;
pub mod cleanup;
pub mod compare;
pub mod import;
pub mod process;
