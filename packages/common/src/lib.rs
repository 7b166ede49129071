pub mod markdown;
pub mod ordering;
pub mod storage;
