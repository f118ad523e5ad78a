use std::{convert::Infallible, sync::Arc};

use percent_encoding::percent_decode_str;
use warp::{Filter, Rejection};

use crate::{
    error::{ApiError, ValidationError},
    types::ResourceId,
    validation::Pipeline,
};

/// Take the next path segment and let it through only if it is a UUID.
pub fn uuid_param() -> impl Filter<Extract = (ResourceId,), Error = Rejection> + Clone {
    validated_param(Arc::new(Pipeline::uuid()))
}

/// Take the next path segment, percent-decode it and run it through `pipeline`.
///
/// An empty segment (`/users//...`) never reaches the gate: warp treats it as
/// a missing parameter and the route does not match.
pub fn validated_param(
    pipeline: Arc<Pipeline>,
) -> impl Filter<Extract = (ResourceId,), Error = Rejection> + Clone {
    warp::path::param::<String>()
        .and(with_pipeline(pipeline))
        .and_then(check_param)
}

async fn check_param(raw: String, pipeline: Arc<Pipeline>) -> Result<ResourceId, Rejection> {
    let decoded = match percent_decode_str(&raw).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => return Err(ApiError::from(ValidationError::malformed("UUID", &raw)).into()),
    };
    let value = pipeline.run(decoded).map_err(ApiError::from)?;

    Ok(ResourceId(value))
}

// functor that adds a reference to the shared pipeline into the filter chain
fn with_pipeline(
    pipeline: Arc<Pipeline>,
) -> impl Filter<Extract = (Arc<Pipeline>,), Error = Infallible> + Clone {
    warp::any().map(move || pipeline.clone())
}
