//! API Handler
//!
//! Fixed request flow, the same for every source:
//! 1. Look up the dataset descriptor
//! 2. Check required parameters
//! 3. Check the auth token, before any storage access
//! 4. Choose the output format
//! 5. Plan sub-queries; an empty filter skips storage entirely
//! 6. Execute into one printer with the global row cap
//! 7. Close the printer and return the buffered body
//!
//! Failures before step 6 produce the JSON error envelope. A storage
//! failure during step 6 discards whatever was printed.

use tracing::{debug, info, warn};

use crate::observability::request_span;
use crate::printer::ResultPrinter;
use crate::stream::QueryExecutor;

use super::context::{RequestContext, ServiceState};
use super::errors::{ApiError, ApiResult, ErrorClass};
use super::params::QueryParams;
use super::response::EpidataResponse;

/// Serves requests against shared service state
#[derive(Clone)]
pub struct ApiHandler {
    state: ServiceState,
}

impl ApiHandler {
    pub fn new(state: ServiceState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &ServiceState {
        &self.state
    }

    /// Handles one request. Never fails: errors become error responses.
    pub fn handle(&self, source: &str, params: &QueryParams) -> EpidataResponse {
        let ctx = RequestContext::new(&self.state);
        let span = request_span(&ctx.request_id, source);
        let _guard = span.enter();

        let response = match self.run(&ctx, source, params) {
            Ok(response) => response,
            Err(err) => {
                match err.class() {
                    ErrorClass::Storage => warn!(code = err.code(), error = %err, "request failed"),
                    _ => debug!(code = err.code(), error = %err, "request rejected"),
                }
                EpidataResponse::error(&err)
            }
        };

        info!(
            status = response.status,
            result = response.result,
            bytes = response.body.len(),
            elapsed_ms = ctx.elapsed_ms() as u64,
            "request complete"
        );
        response
    }

    fn run(
        &self,
        ctx: &RequestContext,
        source: &str,
        params: &QueryParams,
    ) -> ApiResult<EpidataResponse> {
        let dataset = ctx
            .datasets()
            .get(source)
            .ok_or_else(|| ApiError::unknown_source(source))?;
        dataset.check_required(params)?;

        let resources = dataset.auth_resources(params);
        ctx.tokens()
            .session(params.token())
            .check(&dataset.auth, &resources)?;

        let format = params.format()?;
        let mut printer = ResultPrinter::new(format, dataset.tree_field, ctx.row_cap(), Vec::new())?;

        let queries = match dataset.plan(params) {
            Ok(queries) => queries,
            Err(err) if err.is_empty_match() => {
                debug!(code = err.code(), "filter matches nothing, storage skipped");
                Vec::new()
            }
            Err(err) => return Err(err),
        };

        let summary = QueryExecutor::new(ctx.store()).execute(&queries, &mut printer)?;
        let code = printer.end()?;
        debug!(
            sub_queries = summary.dispatched,
            rows = summary.emitted,
            truncated = summary.truncated,
            "execution finished"
        );

        Ok(EpidataResponse::rows(format, code, printer.into_inner()))
    }
}
