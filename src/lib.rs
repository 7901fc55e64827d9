pub mod constants;
pub mod devcaps;
pub mod proto;
pub mod session;
pub mod soap;
pub mod utils;
pub mod xml;
