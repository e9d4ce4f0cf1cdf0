pub mod envelope;
pub mod recovery;
pub mod request_id;
pub mod request_log;
