#![allow(dead_code)]

use kvdns_domain::ServiceRecord;

pub struct ServiceRecordBuilder {
    record: ServiceRecord,
}

impl ServiceRecordBuilder {
    pub fn new() -> Self {
        Self {
            record: ServiceRecord::default(),
        }
    }

    pub fn host(mut self, host: &str) -> Self {
        self.record.host = host.to_string();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.record.port = port;
        self
    }

    pub fn ttl(mut self, ttl: u32) -> Self {
        self.record.ttl = ttl;
        self
    }

    pub fn build(self) -> ServiceRecord {
        self.record
    }
}
