pub mod device_client;
pub mod response;
pub mod retry;
