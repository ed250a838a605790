// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::Client;

use crate::errors::ComponentError;
use crate::traits::{Component, ComponentClass, ComponentInfo, Inputs, PortInfo, StepContext};
use crate::value::{TemporaryFile, Value};
use crate::workflow::ComponentDef;

pub const DOWNLOAD_IDENTITY: &str = "cacheflow.builtin.download";

const FILE_SCHEME: &str = "file://";

/// Copies the resource named by input `url` into a temporary file, keeping
/// its extension.
///
/// `http://` and `https://` URLs are fetched with a GET request carrying one
/// header per `headers` entry (`"Name: value"`). `file://` URLs and plain
/// paths are read from the local filesystem. Any other scheme fails the step.
pub struct Download;

impl ComponentClass for Download {
    fn identity(&self) -> &str {
        DOWNLOAD_IDENTITY
    }

    fn info(&self) -> ComponentInfo {
        ComponentInfo {
            label: "Download".to_string(),
            inputs: vec![PortInfo::single("url"), PortInfo::multiple("headers")],
            outputs: vec!["file".to_string()],
        }
    }

    fn instantiate(&self, _step_id: &str, _def: &ComponentDef) -> Result<Box<dyn Component>, ComponentError> {
        let client = Client::builder().build()?;
        Ok(Box::new(DownloadComponent { client }))
    }
}

#[derive(Debug, PartialEq)]
enum Source {
    Local(PathBuf),
    Http(String),
}

fn parse_source(url: &str) -> Result<Source, ComponentError> {
    if let Some(path) = url.strip_prefix(FILE_SCHEME) {
        return Ok(Source::Local(PathBuf::from(path)));
    }
    match url.split_once("://") {
        Some(("http", _)) | Some(("https", _)) => Ok(Source::Http(url.to_string())),
        Some((scheme, _)) => Err(format!("unsupported URL scheme '{}'", scheme).into()),
        None => Ok(Source::Local(PathBuf::from(url))),
    }
}

/// Splits `"Name: value"` on the first colon.
fn parse_header(entry: &Value) -> Result<(String, String), ComponentError> {
    let text = entry.as_str().ok_or("headers must be strings")?;
    let (name, value) = text
        .split_once(':')
        .ok_or_else(|| format!("invalid header '{}' (expected 'Name: value')", text))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext))
}

/// Extension of the last path segment of an http(s) URL. The host never
/// counts, nor do query or fragment.
fn url_extension(url: &str) -> Option<String> {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let rest = rest.split(['?', '#']).next().unwrap_or_default();
    let (_, path) = rest.split_once('/')?;
    extension_of(Path::new(path))
}

struct DownloadComponent {
    client: Client,
}

impl DownloadComponent {
    async fn fetch(&self, url: &str, headers: &[Value]) -> Result<Vec<u8>, ComponentError> {
        let mut request = self.client.get(url);
        for entry in headers {
            let (name, value) = parse_header(entry)?;
            request = request.header(name, value);
        }
        let response = request.send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl Component for DownloadComponent {
    async fn execute(&mut self, inputs: Inputs, ctx: &mut StepContext) -> Result<(), ComponentError> {
        let url = inputs
            .single("url")
            .and_then(|value| value.as_str())
            .ok_or("input 'url' must be a string")?;

        let (contents, suffix) = match parse_source(url)? {
            Source::Local(path) => {
                let contents = tokio::fs::read(&path)
                    .await
                    .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
                (contents, extension_of(&path))
            }
            Source::Http(url) => {
                let headers = inputs.get("headers").unwrap_or(&[]);
                (self.fetch(&url, headers).await?, url_extension(&url))
            }
        };

        let file = TemporaryFile::with_contents(ctx.temp_dir(), suffix.as_deref(), &contents)?;
        ctx.set_output("file", file);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::test_context;
    use crate::value::TempArena;
    use std::collections::BTreeMap;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    fn download_inputs(url: &str, headers: &[&str]) -> Inputs {
        let mut values = BTreeMap::new();
        values.insert("url".to_string(), vec![Value::from(url)]);
        if !headers.is_empty() {
            values.insert(
                "headers".to_string(),
                headers.iter().map(|h| Value::from(*h)).collect(),
            );
        }
        Inputs::new(values)
    }

    /// Serves one request with `status_line` and `body`, handing back the raw
    /// request head.
    async fn serve_once(status_line: &'static str, body: &'static [u8]) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "{}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status_line,
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.write_all(body).await.unwrap();
            socket.shutdown().await.unwrap();
            let _ = tx.send(String::from_utf8_lossy(&head).to_string());
        });
        (format!("http://{}", addr), rx)
    }

    #[test]
    fn test_parse_source() {
        assert_eq!(
            parse_source("file:///data/a.csv").unwrap(),
            Source::Local(PathBuf::from("/data/a.csv"))
        );
        assert_eq!(parse_source("data/a.csv").unwrap(), Source::Local(PathBuf::from("data/a.csv")));
        assert_eq!(
            parse_source("https://example.org/a.csv").unwrap(),
            Source::Http("https://example.org/a.csv".to_string())
        );
        assert!(parse_source("ftp://example.org/a.csv").is_err());
    }

    #[test]
    fn test_parse_header_splits_on_first_colon() {
        assert_eq!(
            parse_header(&Value::from(" X-Token :  a:b ")).unwrap(),
            ("X-Token".to_string(), "a:b".to_string())
        );
        assert!(parse_header(&Value::from("no separator")).is_err());
    }

    #[test]
    fn test_url_extension() {
        assert_eq!(url_extension("http://host/data/table.csv?x=1#top"), Some(".csv".to_string()));
        assert_eq!(url_extension("http://example.com"), None);
        assert_eq!(url_extension("http://example.com/"), None);
    }

    #[tokio::test]
    async fn test_copies_file_url() {
        let source_dir = tempfile::tempdir().unwrap();
        let source = source_dir.path().join("table.csv");
        std::fs::write(&source, b"x,y\n").unwrap();

        let arena = TempArena::new(None).unwrap();
        let mut ctx = test_context("d", arena.path());
        let mut component = Download.instantiate("d", &ComponentDef::new("download")).unwrap();
        let url = format!("file://{}", source.display());
        component.execute(download_inputs(&url, &[]), &mut ctx).await.unwrap();

        let file = ctx.outputs()["file"].as_temp_file().unwrap().clone();
        assert_eq!(file.suffix(), Some(".csv"));
        assert_eq!(file.read().unwrap(), b"x,y\n");
        assert!(file.path().starts_with(arena.path()));
    }

    // Bypasses any proxy configured in the environment.
    fn direct_component() -> DownloadComponent {
        DownloadComponent {
            client: Client::builder().no_proxy().build().unwrap(),
        }
    }

    #[tokio::test]
    async fn test_fetches_http_url_with_headers() {
        let (base, request) = serve_once("HTTP/1.1 200 OK", b"x,y\n").await;

        let arena = TempArena::new(None).unwrap();
        let mut ctx = test_context("d", arena.path());
        let mut component = direct_component();
        let url = format!("{}/exports/table.csv?v=2", base);
        component
            .execute(download_inputs(&url, &["X-Token: abc", "Accept:text/csv"]), &mut ctx)
            .await
            .unwrap();

        let file = ctx.outputs()["file"].as_temp_file().unwrap().clone();
        assert_eq!(file.suffix(), Some(".csv"));
        assert_eq!(file.read().unwrap(), b"x,y\n");

        let head = request.await.unwrap().to_lowercase();
        assert!(head.starts_with("get /exports/table.csv?v=2 "));
        assert!(head.contains("x-token: abc"));
        assert!(head.contains("accept: text/csv"));
    }

    #[tokio::test]
    async fn test_http_error_status_fails() {
        let (base, _request) = serve_once("HTTP/1.1 404 Not Found", b"").await;

        let arena = TempArena::new(None).unwrap();
        let mut ctx = test_context("d", arena.path());
        let mut component = direct_component();
        let result = component
            .execute(download_inputs(&format!("{}/missing.csv", base), &[]), &mut ctx)
            .await;
        assert!(result.is_err());
        assert!(ctx.outputs().is_empty());
    }

    #[tokio::test]
    async fn test_missing_source_fails() {
        let arena = TempArena::new(None).unwrap();
        let mut ctx = test_context("d", arena.path());
        let mut component = Download.instantiate("d", &ComponentDef::new("download")).unwrap();
        let result = component
            .execute(download_inputs("file:///definitely/not/here.bin", &[]), &mut ctx)
            .await;
        assert!(result.unwrap_err().to_string().contains("cannot read"));
    }
}
