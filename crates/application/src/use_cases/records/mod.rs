mod assembler;
mod executor;
mod resolve_records;

pub use assembler::{assemble, PartialDecode};
pub use executor::{BackendQueryExecutor, RawEntries};
pub use resolve_records::ResolveRecordsUseCase;
