//! Response envelope for the admin API.
//!
//! Admin endpoints wrap payloads as `{ "data": ... }`. The storefront
//! endpoints (`/catalog`, `/generate`, `/jobs`) return bare bodies because
//! their shape is a public contract.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
