pub mod notification;
pub mod parameter;
pub mod role;
pub mod service;
