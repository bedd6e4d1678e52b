use hickory_proto::rr::rdata::SOA;
use hickory_proto::rr::{Name, RData, Record};
use std::time::{SystemTime, UNIX_EPOCH};

const HOSTMASTER: &str = "hostmaster";
const NAMESERVER: &str = "ns.dns";
const REFRESH: i32 = 7200;
const RETRY: i32 = 1800;
const EXPIRE: i32 = 86400;
const MAX_SOA_TTL: u32 = 300;

/// Zone serial: seconds since the epoch.
fn serial() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or_default()
}

fn join(label: &str, zone: &str) -> String {
    if zone == "." {
        format!("{}.", label)
    } else {
        format!("{}.{}", label, zone)
    }
}

/// SOA placed in the authority section of negative and NODATA answers.
///
/// `zone` is fully qualified. Returns `None` only if the zone is not a valid name.
pub fn soa_record(zone: &str, min_ttl: u32) -> Option<Record> {
    let origin = Name::from_ascii(zone).ok()?;
    let mname = Name::from_ascii(join(NAMESERVER, zone)).ok()?;
    let rname = Name::from_ascii(join(HOSTMASTER, zone)).ok()?;

    let soa = SOA::new(mname, rname, serial(), REFRESH, RETRY, EXPIRE, min_ttl);
    Some(Record::from_rdata(
        origin,
        min_ttl.min(MAX_SOA_TTL),
        RData::SOA(soa),
    ))
}
