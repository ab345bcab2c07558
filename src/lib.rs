// Library root, shared by the `demoapp` server, the `demoapp-dash` client
// and the integration tests.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod logger;
pub mod server;
pub mod store;
