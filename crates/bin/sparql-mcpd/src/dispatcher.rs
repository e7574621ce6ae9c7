use sparql_core::client::http_client;
use sparql_core::{Dispatcher, SparqlError};

use crate::config::SparqlConfig;

pub fn build_dispatcher(config: &SparqlConfig) -> Result<Dispatcher, SparqlError> {
    let http = http_client(config.request_timeout)?;
    Ok(Dispatcher::with_http(config.connection_defaults(), http))
}
