use url::Url;

use crate::models::DocumentId;

/// Query parameter carrying a document id in shared links.
pub const DOC_PARAM: &str = "doc";

/// Builds `<origin><path>?doc=<id>` links from the public base URL.
#[derive(Debug, Clone)]
pub struct ShareLinks {
    base: Url,
}

impl ShareLinks {
    pub fn new(public_url: &str) -> Result<Self, url::ParseError> {
        let mut base = Url::parse(public_url)?;
        base.set_query(None);
        base.set_fragment(None);
        Ok(Self { base })
    }

    pub fn url_for(&self, id: &DocumentId) -> String {
        let mut url = self.base.clone();
        url.query_pairs_mut().append_pair(DOC_PARAM, id.as_str());
        url.to_string()
    }
}

/// Split the `doc` parameter off `url`.
///
/// Returns the parameter (if any) and the URL with every `doc` parameter
/// removed; other parameters keep their order.
pub fn take_doc_param(url: &Url) -> (Option<String>, Url) {
    let mut doc = None;
    let mut rest = Vec::new();
    for (key, value) in url.query_pairs() {
        if key == DOC_PARAM {
            doc.get_or_insert_with(|| value.into_owned());
        } else {
            rest.push((key.into_owned(), value.into_owned()));
        }
    }

    let mut stripped = url.clone();
    stripped.set_query(None);
    if !rest.is_empty() {
        stripped.query_pairs_mut().extend_pairs(rest.iter());
    }
    (doc, stripped)
}

/// Accept either a bare document id or a full shared link.
pub fn extract_document_id(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(url) = Url::parse(trimmed) {
        if let (Some(doc), _) = take_doc_param(&url) {
            return Some(doc);
        }
    }
    Some(trimmed.to_string())
}
