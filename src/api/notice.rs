//! Yearly renewable energy levy notices, published as PDF.

use crate::{api::client::Client, core::levy::LevyNotices, prelude::*};

pub struct Notices<'a> {
    client: &'a Client,

    /// URL with a `{year}` placeholder.
    url_template: &'a str,
}

impl<'a> Notices<'a> {
    pub const fn new(client: &'a Client, url_template: &'a str) -> Self {
        Self { client, url_template }
    }

    pub fn url(&self, year: i32) -> String {
        self.url_template.replace("{year}", &year.to_string())
    }
}

impl LevyNotices for Notices<'_> {
    #[instrument(skip_all, fields(year = year))]
    fn fetch_text(&self, year: i32) -> Result<String> {
        let url = self.url(year);
        info!(%url, "checking the levy notice…");
        let bytes = self.client.get_bytes(&url)?;
        extract_text(&bytes).with_context(|| format!("the notice URL is `{url}`"))
    }
}

/// Extract the text of all pages.
pub fn extract_text(pdf: &[u8]) -> Result<String> {
    // `pdf-extract` panics on some malformed documents.
    std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(pdf))
        .map_err(|_| anyhow!("the PDF text extractor panicked"))?
        .context("failed to extract the PDF text")
}
