use std::thread::sleep;

use ureq::Agent;

use crate::{charset::decode_html, prelude::*, settings::HttpSettings};

/// Blocking HTTP client with one timeout and retry policy for every request.
pub struct Client {
    agent: Agent,
    settings: HttpSettings,
}

impl Client {
    pub fn new(settings: HttpSettings) -> Self {
        let agent =
            Agent::config_builder().timeout_global(Some(settings.timeout())).build().into();
        Self { agent, settings }
    }

    /// Fetch the HTML page and decode it.
    ///
    /// See [`decode_html`] for how the encoding is chosen.
    #[instrument(skip_all, fields(url = url))]
    pub fn get_html(&self, url: &str) -> Result<String> {
        info!("fetching…");
        let (charset, bytes) = self.with_retries(|| {
            let mut response = self.agent.get(url).call()?;
            let charset = response.body().charset().map(str::to_owned);
            Ok((charset, response.body_mut().read_to_vec()?))
        })?;
        info!(n_bytes = bytes.len(), charset = charset.as_deref(), "fetched");
        Ok(decode_html(&bytes, charset.as_deref()))
    }

    #[instrument(skip_all, fields(url = url))]
    pub fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        info!("fetching…");
        let bytes = self.with_retries(|| self.agent.get(url).call()?.body_mut().read_to_vec())?;
        info!(n_bytes = bytes.len(), "fetched");
        Ok(bytes)
    }

    fn with_retries<T>(&self, request: impl Fn() -> Result<T, ureq::Error>) -> Result<T> {
        let max_attempts = self.settings.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match request() {
                Ok(value) => return Ok(value),
                Err(error) if attempt < max_attempts && is_transient(&error) => {
                    warn!(attempt, max_attempts, "request failed, retrying: {error}");
                    sleep(self.settings.retry_delay());
                    attempt += 1;
                }
                Err(error) => {
                    return Err(error)
                        .with_context(|| format!("request failed after {attempt} attempt(s)"));
                }
            }
        }
    }
}

/// Server errors and network failures are worth another attempt, client errors are not.
const fn is_transient(error: &ureq::Error) -> bool {
    match error {
        ureq::Error::StatusCode(status) => *status >= 500,
        ureq::Error::Io(_)
        | ureq::Error::Timeout(_)
        | ureq::Error::HostNotFound
        | ureq::Error::ConnectionFailed => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::Cell,
        io::{BufRead, BufReader, Write},
        net::TcpListener,
        thread,
    };

    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::scrape::scrape_fuel_adjustments;

    fn client(max_attempts: u32) -> Client {
        Client::new(HttpSettings { max_attempts, retry_delay_millis: 0, ..HttpSettings::default() })
    }

    #[test]
    fn server_errors_are_retried() -> Result {
        let n_calls = Cell::new(0);
        let value = client(3).with_retries(|| {
            n_calls.set(n_calls.get() + 1);
            if n_calls.get() < 3 { Err(ureq::Error::StatusCode(503)) } else { Ok(42) }
        })?;
        assert_eq!(value, 42);
        assert_eq!(n_calls.get(), 3);
        Ok(())
    }

    #[test]
    fn client_errors_are_not_retried() {
        let n_calls = Cell::new(0);
        let result = client(3).with_retries(|| -> Result<(), ureq::Error> {
            n_calls.set(n_calls.get() + 1);
            Err(ureq::Error::StatusCode(404))
        });
        assert!(result.is_err());
        assert_eq!(n_calls.get(), 1);
    }

    #[test]
    fn attempts_are_limited() {
        let n_calls = Cell::new(0);
        let result = client(2).with_retries(|| -> Result<(), ureq::Error> {
            n_calls.set(n_calls.get() + 1);
            Err(ureq::Error::ConnectionFailed)
        });
        assert!(result.is_err());
        assert_eq!(n_calls.get(), 2);
    }

    /// Serve one response on a local port and return its URL.
    fn serve_once(content_type: &'static str, body: Vec<u8>) -> Result<String> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let url = format!("http://{}/", listener.local_addr()?);
        thread::spawn(move || -> std::io::Result<()> {
            let (mut stream, _) = listener.accept()?;
            let mut reader = BufReader::new(stream.try_clone()?);
            let mut line = String::new();
            while reader.read_line(&mut line)? > 2 {
                line.clear();
            }
            write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len(),
            )?;
            stream.write_all(&body)
        });
        Ok(url)
    }

    #[test]
    fn shift_jis_page_with_meta_charset_ok() -> Result {
        let html = r#"<html><head><meta charset="Shift_JIS"></head><body><div id="anker01"><table>
            <tr><td>2026年</td><td>3月</td><td>▲1.00</td><td>▲1.22</td></tr>
            </table></div></body></html>"#;
        let body = encoding_rs::SHIFT_JIS.encode(html).0.into_owned();
        let url = serve_once("text/html", body)?;

        let text = client(1).get_html(&url)?;
        assert_eq!(text, html);
        let entries = scrape_fuel_adjustments(&text)?;
        assert_eq!(entries.len(), 1);
        assert_eq!((entries[0].year, entries[0].month), (2026, 3));
        assert_abs_diff_eq!(entries[0].price_kwh, -1.22);
        Ok(())
    }

    #[test]
    fn header_charset_ok() -> Result {
        let html = "<html><body><p>燃料費調整単価 ▲1.22</p></body></html>";
        let body = encoding_rs::EUC_JP.encode(html).0.into_owned();
        let url = serve_once("text/html; charset=EUC-JP", body)?;
        assert_eq!(client(1).get_html(&url)?, html);
        Ok(())
    }

    #[test]
    #[ignore = "makes the HTTP request"]
    fn get_page_ok() -> Result {
        let text = client(1).get_html(crate::settings::PAGE_URL)?;
        assert!(text.contains("燃料費調整"));
        Ok(())
    }
}
