//! Requester address resolution.
//!
//! Proxy headers are only as trustworthy as the deployment in front of the
//! server, so which ones are honored (and in what order) comes from
//! [`ClientIpConfig`]. An empty list means only the TCP peer address is used.

use actix_web::{dev::Payload, http::header::HeaderMap, web, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use std::net::IpAddr;

use crate::config::{ClientIpConfig, Config};
use crate::error::AppError;

/// Used when neither headers nor the connection yield an address
pub const FALLBACK_IP: &str = "127.0.0.1";

/// Resolves the requester address from trusted headers, then the peer address
pub fn resolve_client_ip(
    headers: &HeaderMap,
    peer_ip: Option<IpAddr>,
    trusted_headers: &[String],
) -> String {
    trusted_headers
        .iter()
        .find_map(|name| first_header_value(headers, name))
        .or_else(|| peer_ip.map(|ip| ip.to_string()))
        .unwrap_or_else(|| FALLBACK_IP.to_string())
}

/// First non-empty element of a (possibly comma-separated) header
fn first_header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').map(str::trim).find(|v| !v.is_empty()))
        .map(str::to_string)
}

/// Extractor for the requester address and user agent
///
/// Usage in handlers:
/// ```ignore
/// async fn my_handler(client: ClientInfo) -> HttpResponse {
///     // client.ip is never empty
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub ip: String,
    pub user_agent: Option<String>,
}

impl FromRequest for ClientInfo {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let trusted_headers = match req.app_data::<web::Data<Config>>() {
            Some(config) => config.client_ip.trusted_headers.clone(),
            None => ClientIpConfig::default().trusted_headers,
        };

        let peer_ip = req.peer_addr().map(|addr| addr.ip());
        let ip = resolve_client_ip(req.headers(), peer_ip, &trusted_headers);

        let user_agent = req
            .headers()
            .get("User-Agent")
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string());

        ready(Ok(ClientInfo { ip, user_agent }))
    }
}
