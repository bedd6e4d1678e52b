use kvdns_domain::{AnswerSet, DomainError, KeyValue, ServiceRecord};

/// Records decoded before the first undecodable value, and that value's error.
#[derive(Debug)]
pub struct PartialDecode {
    pub partial: AnswerSet,
    pub error: DomainError,
}

/// Decodes every value as a service record, keeping backend order.
pub fn assemble(kvs: &[KeyValue]) -> Result<AnswerSet, PartialDecode> {
    let mut records = Vec::with_capacity(kvs.len());
    for kv in kvs {
        let key = kv.key_str();
        match ServiceRecord::from_json(&key, &kv.value) {
            Ok(record) => records.push(record),
            Err(e) => {
                return Err(PartialDecode {
                    partial: records,
                    error: DomainError::RecordDecode {
                        key,
                        reason: e.to_string(),
                    },
                })
            }
        }
    }
    Ok(records)
}
