use async_trait::async_trait;

use crate::{request_context::GraphQLRequestContext, BoxError};

pub type RequestDidStartResult = Result<Option<Box<dyn RequestListener>>, BoxError>;

/// Returned from `request_did_start`. Dropped once the request is answered.
///
/// Every hook receives the request context as it is at that stage:
/// `source` and `query_hash` are set from `did_resolve_source` on,
/// `operation` from `did_resolve_operation` on, and `errors` is filled
/// before `did_encounter_errors`.
#[async_trait]
pub trait RequestListener: Send + Sync {
    #[inline]
    async fn did_resolve_source(&self, _context: &GraphQLRequestContext) -> Result<(), BoxError> {
        Ok(())
    }
    #[inline]
    async fn parsing_did_start(&self, _context: &GraphQLRequestContext) -> Result<(), BoxError> {
        Ok(())
    }
    #[inline]
    async fn validation_did_start(
        &self,
        _context: &GraphQLRequestContext,
    ) -> Result<(), BoxError> {
        Ok(())
    }
    #[inline]
    async fn did_resolve_operation(
        &self,
        _context: &GraphQLRequestContext,
    ) -> Result<(), BoxError> {
        Ok(())
    }
    #[inline]
    async fn did_encounter_errors(
        &self,
        _context: &GraphQLRequestContext,
    ) -> Result<(), BoxError> {
        Ok(())
    }
}
