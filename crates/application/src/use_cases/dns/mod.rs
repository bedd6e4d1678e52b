mod answer_builder;
mod handle_dns_query;
mod soa;

pub use answer_builder::AnswerBuilder;
pub use handle_dns_query::HandleDnsQueryUseCase;
pub use soa::soa_record;
