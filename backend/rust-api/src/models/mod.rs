pub mod authoring;
pub mod catalog;
pub mod question;
pub mod topic;
