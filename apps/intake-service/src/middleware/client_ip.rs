//! # クライアント IP 抽出ミドルウェア
//!
//! CAPTCHA 検証に渡すクライアント IP をリクエストから取り出し、
//! [`ClientIp`] として extensions に格納する。
//!
//! 優先順位:
//!
//! 1. `X-Forwarded-For` の先頭（リバースプロキシ経由）
//! 2. `X-Real-IP`
//! 3. ソケットのピアアドレス（`ConnectInfo`）

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};

/// リクエスト元のクライアント IP（取得できなければ `None`）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientIp(pub Option<String>);

/// クライアント IP を extensions に格納するミドルウェア
pub async fn extract_client_ip(mut request: Request<Body>, next: Next) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());

    let client_ip = ClientIp(client_ip_from_headers(request.headers()).or(peer));
    request.extensions_mut().insert(client_ip);

    next.run(request).await
}

fn client_ip_from_headers(headers: &HeaderMap) -> Option<String> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };

    let forwarded = header("x-forwarded-for").and_then(|value| {
        value
            .split(',')
            .next()
            .map(|ip| ip.trim().to_string())
            .filter(|ip| !ip.is_empty())
    });

    forwarded.or_else(|| {
        header("x-real-ip")
            .map(|ip| ip.trim().to_string())
            .filter(|ip| !ip.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::forwarded_forの先頭を使う(Some("203.0.113.7, 10.0.0.1"), Some("198.51.100.2"), Some("203.0.113.7"))]
    #[case::forwarded_forがなければreal_ip(None, Some("198.51.100.2"), Some("198.51.100.2"))]
    #[case::空のforwarded_forは無視する(Some(" "), Some("198.51.100.2"), Some("198.51.100.2"))]
    #[case::どちらもなければnone(None, None, None)]
    fn test_ヘッダーからクライアントipを取り出す(
        #[case] forwarded_for: Option<&str>,
        #[case] real_ip: Option<&str>,
        #[case] expected: Option<&str>,
    ) {
        let mut headers = HeaderMap::new();
        if let Some(value) = forwarded_for {
            headers.insert("x-forwarded-for", HeaderValue::from_str(value).unwrap());
        }
        if let Some(value) = real_ip {
            headers.insert("x-real-ip", HeaderValue::from_str(value).unwrap());
        }

        assert_eq!(
            client_ip_from_headers(&headers),
            expected.map(str::to_string)
        );
    }
}
