//! Request metadata used for rate limiting and the magic-link audit trail.

use crate::app::AppState;
use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, header::USER_AGENT, request::Parts},
};
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

/// Caller's network address and user agent.
#[derive(Debug, Clone)]
pub struct ClientMeta {
    pub ip: String,
    pub user_agent: String,
}

impl<S> FromRequestParts<S> for ClientMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        let trusted = parts
            .extensions
            .get::<AppState>()
            .map(|state| state.config.trusted_proxies.as_slice())
            .unwrap_or_default();

        Ok(ClientMeta {
            ip: client_ip(peer, &parts.headers, trusted),
            user_agent: parts
                .headers
                .get(USER_AGENT)
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default()
                .to_string(),
        })
    }
}

/// The peer address, unless the peer is a trusted proxy: then the nearest
/// `X-Forwarded-For` hop that is not itself a trusted proxy.
fn client_ip(peer: Option<IpAddr>, headers: &HeaderMap, trusted: &[IpAddr]) -> String {
    let Some(peer) = peer else {
        return "unknown".to_string();
    };
    if !trusted.contains(&peer) {
        return peer.to_string();
    }

    forwarded_hops(headers)
        .into_iter()
        .rev()
        .find(|hop| !trusted.contains(hop))
        .unwrap_or(peer)
        .to_string()
}

/// `X-Forwarded-For` hops, client first. Unparseable entries end the chain.
fn forwarded_hops(headers: &HeaderMap) -> Vec<IpAddr> {
    headers
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .map_while(|hop| hop.parse::<IpAddr>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request};

    fn ip(raw: &str) -> IpAddr {
        raw.parse().unwrap()
    }

    fn forwarded(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_forwarded_header_ignored_from_untrusted_peer() {
        let headers = forwarded("203.0.113.7");
        assert_eq!(client_ip(Some(ip("198.51.100.9")), &headers, &[]), "198.51.100.9");
        assert_eq!(
            client_ip(Some(ip("198.51.100.9")), &headers, &[ip("127.0.0.1")]),
            "198.51.100.9"
        );
    }

    #[test]
    fn test_trusted_proxy_forwards_nearest_untrusted_hop() {
        let trusted = [ip("127.0.0.1"), ip("10.0.0.1")];
        let headers = forwarded("1.2.3.4, 203.0.113.7, 10.0.0.1");
        assert_eq!(client_ip(Some(ip("127.0.0.1")), &headers, &trusted), "203.0.113.7");
    }

    #[test]
    fn test_trusted_proxy_without_header_keeps_peer() {
        let trusted = [ip("127.0.0.1")];
        assert_eq!(
            client_ip(Some(ip("127.0.0.1")), &HeaderMap::new(), &trusted),
            "127.0.0.1"
        );
        assert_eq!(
            client_ip(Some(ip("127.0.0.1")), &forwarded("garbage"), &trusted),
            "127.0.0.1"
        );
    }

    #[tokio::test]
    async fn test_extractor_uses_peer_and_user_agent() {
        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.7")
            .header(USER_AGENT, "curl/8")
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();
        parts
            .extensions
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 5], 9000))));

        let meta = ClientMeta::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(meta.ip, "192.0.2.5");
        assert_eq!(meta.user_agent, "curl/8");
    }

    #[tokio::test]
    async fn test_unknown_without_peer() {
        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.7")
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();
        let meta = ClientMeta::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(meta.ip, "unknown");
    }
}
