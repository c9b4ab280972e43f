pub mod device;
pub mod http;
pub mod storage;
