pub mod credentials;
pub mod diet;
