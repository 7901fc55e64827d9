use std::time::Duration;

use color_eyre::eyre;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use tracing::{Level, event};
use url::Url;

use crate::devcaps::DeviceCapabilities;
use crate::proto::{ProtoCtx, Protocol};

/// Asks the device at `base_url` for its capabilities, speaking `protocol`
pub async fn query_capabilities(
    client: &reqwest::Client,
    protocol: Protocol,
    base_url: Url,
    timeout: Duration,
) -> Result<DeviceCapabilities, eyre::Report> {
    let handler = protocol.handler();

    let mut ctx = ProtoCtx::new(base_url);

    let query = handler.devcaps_query(&ctx);

    event!(
        Level::INFO,
        %protocol,
        url = %query.url,
        message_id = %query.message_id,
        "querying device capabilities"
    );

    let response = client
        .request(query.method, query.url)
        .header(CONTENT_TYPE, query.content_type)
        .header(USER_AGENT, env!("CARGO_PKG_NAME"))
        .body(query.body)
        .timeout(timeout)
        .send()
        .await?
        .error_for_status()?;

    let body = response.bytes().await?;

    event!(Level::DEBUG, length = body.len(), "received device capabilities");

    ctx.set_response(body);

    let mut caps = DeviceCapabilities::new();

    handler.devcaps_decode(&ctx, &mut caps)?;

    if handler.scan_query(&ctx).is_none() {
        event!(
            Level::INFO,
            %protocol,
            "protocol only supports capability discovery, scanning needs another protocol"
        );
    }

    Ok(caps)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use url::Url;

    use crate::devcaps::SourceKind;
    use crate::proto::Protocol;
    use crate::session::query_capabilities;

    /// Serves a single HTTP response and hands back the request it received
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (Url, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();

            let mut request = Vec::new();
            let mut buffer = [0_u8; 4096];

            // read until the whole body arrived
            loop {
                let read = stream.read(&mut buffer).await.unwrap();
                request.extend_from_slice(&buffer[..read]);

                let text = String::from_utf8_lossy(&request);

                if let Some((head, content)) = text.split_once("\r\n\r\n") {
                    let length = head
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;

                            if name.eq_ignore_ascii_case("content-length") {
                                value.trim().parse::<usize>().ok()
                            } else {
                                None
                            }
                        })
                        .unwrap_or(0);

                    if content.len() >= length {
                        break;
                    }
                }

                if read == 0 {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/soap+xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );

            stream.write_all(response.as_bytes()).await.unwrap();
            let _r = stream.shutdown().await;

            String::from_utf8(request).unwrap()
        });

        let url = Url::parse(&format!("http://{}/wsd/scan", address)).unwrap();

        (url, handle)
    }

    #[tokio::test]
    async fn queries_and_decodes() {
        let (url, server) = serve_once("200 OK", include_str!("./test/xml/adf-duplex.xml")).await;

        let caps = query_capabilities(
            &reqwest::Client::new(),
            Protocol::Wsd,
            url,
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert_eq!(
            caps.enumerable_source_names,
            ["Flatbed", "ADF", "ADF Duplex"]
        );
        assert_eq!(caps.model.as_deref(), Some("Office Duplex MFP"));
        assert!(caps.source(SourceKind::AdfDuplex).is_some());

        let request = server.await.unwrap();

        assert!(request.starts_with("POST /wsd/scan HTTP/1.1\r\n"));
        assert!(
            request
                .to_ascii_lowercase()
                .contains("content-type: application/soap+xml; charset=utf-8")
        );
        assert!(request.contains("GetScannerElementsRequest"));
    }

    #[tokio::test]
    async fn http_errors_are_reported() {
        let (url, server) = serve_once("500 Internal Server Error", "").await;

        let result = query_capabilities(
            &reqwest::Client::new(),
            Protocol::Wsd,
            url,
            Duration::from_secs(5),
        )
        .await;

        assert!(result.is_err());

        server.await.unwrap();
    }

    #[tokio::test]
    async fn undecodable_capabilities_are_reported() {
        let (url, server) =
            serve_once("200 OK", include_str!("./test/xml/description-only.xml")).await;

        let result = query_capabilities(
            &reqwest::Client::new(),
            Protocol::Wsd,
            url,
            Duration::from_secs(5),
        )
        .await;

        let error = result.unwrap_err();

        assert_eq!(
            error.to_string(),
            "Neither platen nor ADF sources detected"
        );

        server.await.unwrap();
    }
}
