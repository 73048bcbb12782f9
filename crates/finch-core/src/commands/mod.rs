pub mod accounts;
pub mod duplicates;
pub mod sync;
