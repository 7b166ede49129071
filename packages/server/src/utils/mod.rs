pub mod hash;
pub mod host;
pub mod jwt;
