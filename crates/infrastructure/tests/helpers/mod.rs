mod builders;
mod dns_server_mock;
mod gateway;

pub use builders::*;
pub use dns_server_mock::MockDnsServer;
pub use gateway::GatewayStub;
