pub mod dns;
pub mod records;

pub use dns::{AnswerBuilder, HandleDnsQueryUseCase};
pub use records::{
    assemble, BackendQueryExecutor, PartialDecode, RawEntries, ResolveRecordsUseCase,
};
