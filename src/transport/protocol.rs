//! Transport Protocol Definitions
//!
//! Endpoints served by the payload proxy and the types exchanged over them.

use super::lease::LeaseId;
use serde::{Deserialize, Serialize};

pub const ENDPOINT_PAYLOAD: &str = "/payload/:id";
pub const ENDPOINT_PAYLOAD_ACK: &str = "/payload/:id/ack";

/// Everything a receiver needs to download and acknowledge one payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PayloadRef {
    pub lease: LeaseId,
    pub url: String,
    pub ack_url: String,
}

impl PayloadRef {
    pub fn new(base_url: &str, lease: LeaseId) -> Self {
        Self {
            url: format!("{}/payload/{}", base_url, lease),
            ack_url: format!("{}/payload/{}/ack", base_url, lease),
            lease,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AckResponse {
    pub lease: LeaseId,
    pub hosted: bool,
}
