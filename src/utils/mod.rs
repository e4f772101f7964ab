pub mod data;
pub mod fade;
pub mod odds;
pub mod outcome;
pub mod settlement;
