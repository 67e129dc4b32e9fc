/// Object key for the IOCs fetched by one invocation.
///
/// Every invocation handles exactly one page, so the request id keeps keys
/// unique across a chain of re-invocations.
pub fn ioc_object_key(base_prefix: &str, run_date: &str, request_id: &str) -> String {
    let trimmed = base_prefix.trim_matches('/');
    format!("{trimmed}/run_date={run_date}/request_id={request_id}/iocs.jsonl")
}
