pub mod core;
pub mod courses;
pub mod exchange;
pub mod grades;
pub mod ledger;
pub mod rollcall;
pub mod students;
