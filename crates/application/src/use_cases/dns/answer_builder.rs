use crate::ports::Upstream;
use crate::use_cases::records::ResolveRecordsUseCase;
use crate::QueryContext;
use hickory_proto::rr::rdata::{A, AAAA, CNAME};
use hickory_proto::rr::{Name, RData, Record, RecordType as HickoryRecordType};
use kvdns_domain::{
    normalize_name, to_fqdn, HostKind, Outcome, QueryDescriptor, RecordType, ServiceRecord, Zones,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Upper bound on in-zone CNAME targets followed for one answer.
const MAX_CNAME_CHASE: usize = 8;

/// Converts service records into answer records for an A or AAAA query.
///
/// Address hosts of the queried family become A/AAAA records, the other
/// family is skipped. Name hosts become a CNAME; targets inside a served zone
/// are resolved through the backend, others through the upstream when one is
/// configured.
pub struct AnswerBuilder {
    resolver: Arc<ResolveRecordsUseCase>,
    zones: Zones,
    upstream: Option<Arc<dyn Upstream>>,
    default_ttl: u32,
}

impl AnswerBuilder {
    pub fn new(resolver: Arc<ResolveRecordsUseCase>, zones: Zones, default_ttl: u32) -> Self {
        Self {
            resolver,
            zones,
            upstream: None,
            default_ttl,
        }
    }

    pub fn with_upstream(mut self, upstream: Arc<dyn Upstream>) -> Self {
        self.upstream = Some(upstream);
        self
    }

    pub async fn build(
        &self,
        ctx: &QueryContext,
        query: &QueryDescriptor,
        records: &[ServiceRecord],
    ) -> Vec<Record> {
        let mut answers = Vec::new();
        let mut visited = vec![normalize_name(&query.name)];
        let mut chased = 0;
        let mut pending: Vec<(QueryDescriptor, Vec<ServiceRecord>)> =
            vec![(query.clone(), records.to_vec())];

        while let Some((owner, records)) = pending.pop() {
            let Ok(owner_name) = Name::from_ascii(&*owner.name) else {
                warn!(name = %owner.name, "skipping records for unparsable owner name");
                continue;
            };

            for record in &records {
                let ttl = record.ttl_or(self.default_ttl);
                let target = match record.host_kind() {
                    None => continue,
                    Some(HostKind::V4(v4)) => {
                        if query.record_type == RecordType::A {
                            answers.push(Record::from_rdata(owner_name.clone(), ttl, RData::A(A(v4))));
                        }
                        continue;
                    }
                    Some(HostKind::V6(v6)) => {
                        if query.record_type == RecordType::AAAA {
                            answers.push(Record::from_rdata(
                                owner_name.clone(),
                                ttl,
                                RData::AAAA(AAAA(v6)),
                            ));
                        }
                        continue;
                    }
                    Some(HostKind::Name(target)) => target,
                };

                if target == normalize_name(&owner.name) {
                    continue;
                }
                let Ok(target_name) = Name::from_ascii(to_fqdn(&target)) else {
                    debug!(key = %record.key, host = %record.host, "skipping invalid CNAME target");
                    continue;
                };
                answers.push(Record::from_rdata(
                    owner_name.clone(),
                    ttl,
                    RData::CNAME(CNAME(target_name.clone())),
                ));

                if visited.contains(&target) {
                    continue;
                }
                visited.push(target.clone());

                match self.zones.matches(&target) {
                    Some(zone) => {
                        if chased >= MAX_CNAME_CHASE {
                            debug!(target = %target, "CNAME chase limit reached");
                            continue;
                        }
                        chased += 1;
                        let next = QueryDescriptor::new(to_fqdn(&target), query.record_type, zone);
                        match self.resolver.execute(ctx, &next).await {
                            Outcome::Success { records, .. } => pending.push((next, records)),
                            Outcome::NameError => {
                                debug!(target = %target, "in-zone CNAME target does not exist")
                            }
                            Outcome::TransientError(e) => {
                                warn!(target = %target, error = %e, "failed to resolve in-zone CNAME target")
                            }
                        }
                    }
                    None => self.lookup_upstream(ctx, query, &target_name, &mut answers).await,
                }
            }
        }

        dedup(answers)
    }

    async fn lookup_upstream(
        &self,
        ctx: &QueryContext,
        query: &QueryDescriptor,
        target: &Name,
        answers: &mut Vec<Record>,
    ) {
        let Some(upstream) = &self.upstream else {
            return;
        };
        let record_type = HickoryRecordType::from(query.record_type.to_u16());
        match upstream.lookup(ctx, target, record_type).await {
            Ok(response) => answers.extend(response.answers().iter().cloned()),
            Err(e) => warn!(target = %target, error = %e, "upstream lookup of CNAME target failed"),
        }
    }
}

fn dedup(records: Vec<Record>) -> Vec<Record> {
    let mut unique: Vec<Record> = Vec::with_capacity(records.len());
    for record in records {
        if !unique.contains(&record) {
            unique.push(record);
        }
    }
    unique
}
