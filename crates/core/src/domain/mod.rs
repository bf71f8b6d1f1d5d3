pub mod application;
pub mod employee;
pub mod health_check;
pub mod holiday;
pub mod identity;
pub mod job;
pub mod leave;
pub mod meeting;
pub mod overtime;
pub mod review;
pub mod ringi;
