use super::ids::{RequestId, REQUEST_ID_HEADER};
use crate::registry::ResourceId;
use crate::template::MultiMap;
use http::Method;
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Cursor, Read};

/// Request body as seen by the resolver.
///
/// A streamed body can be read once; buffering it turns it into
/// [`Body::Buffered`], which can be read any number of times.
#[derive(Default)]
pub enum Body {
    #[default]
    Empty,
    Stream(Box<dyn Read + Send>),
    Buffered(Vec<u8>),
    Consumed,
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => f.write_str("Empty"),
            Body::Stream(_) => f.write_str("Stream(..)"),
            Body::Buffered(bytes) => write!(f, "Buffered({} bytes)", bytes.len()),
            Body::Consumed => f.write_str("Consumed"),
        }
    }
}

/// Keys of the per-request parse cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    QueryParams,
    MatrixParams,
    FormParams,
}

/// One step of a resolution chain, pushed when an operation is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionFrame {
    pub resource: ResourceId,
    pub resource_name: String,
    pub operation: String,
    /// Values of the resource template variables followed by those of the
    /// operation template variables.
    pub template_values: Vec<String>,
}

/// Everything the resolver knows about one inbound request.
///
/// Created by the transport layer, threaded through resource selection,
/// operation selection and parameter extraction, and dropped with the
/// request. Parsed query, matrix and form maps are cached here so that
/// each is computed at most once.
#[derive(Debug)]
pub struct RequestContext {
    request_id: RequestId,
    method: Method,
    path: String,
    query: Option<String>,
    headers: Vec<(String, String)>,
    body: Body,
    cache: HashMap<CacheKey, MultiMap>,
    stack: Vec<ResolutionFrame>,
}

impl RequestContext {
    /// Context for `method` on `uri` (path plus optional `?query`).
    pub fn new(method: Method, uri: &str) -> Self {
        let (path, query) = match uri.split_once('?') {
            Some((p, q)) => (p, Some(q.to_string())),
            None => (uri, None),
        };
        let path = if path.is_empty() { "/" } else { path };
        Self {
            request_id: RequestId::new(),
            method,
            path: path.to_string(),
            query,
            headers: Vec::new(),
            body: Body::Empty,
            cache: HashMap::new(),
            stack: Vec::new(),
        }
    }

    /// Append a header. Names are case-insensitive; repeated headers keep
    /// every value. An `x-request-id` header sets the request id.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        let name = name.to_ascii_lowercase();
        if name == REQUEST_ID_HEADER {
            self.request_id = RequestId::from_header_or_new(Some(value));
        }
        self.headers.push((name, value.to_string()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.body = Body::Buffered(bytes.into());
        self
    }

    /// Body read lazily from `reader`, at most once unless buffered.
    #[must_use]
    pub fn with_body_reader(mut self, reader: impl Read + Send + 'static) -> Self {
        self.body = Body::Stream(Box::new(reader));
        self
    }

    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Raw request path, matrix parameters included.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw query string without the leading `?`.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First value of a header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every value of a header, in arrival order.
    #[must_use]
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    #[must_use]
    pub fn accept(&self) -> Option<&str> {
        self.header("accept")
    }

    /// Path used for template matching: matrix parameters (`;k=v`) are
    /// removed from every segment.
    #[must_use]
    pub fn path_to_match(&self) -> String {
        if !self.path.contains(';') {
            return self.path.clone();
        }
        self.path
            .split('/')
            .map(|segment| segment.split(';').next().unwrap_or_default())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Cookies from every `Cookie` header, in order.
    #[must_use]
    pub fn cookies(&self) -> Vec<(String, String)> {
        self.header_values("cookie")
            .into_iter()
            .flat_map(|header| header.split(';'))
            .filter_map(|pair| {
                let mut parts = pair.trim().splitn(2, '=');
                let name = parts.next()?.trim();
                if name.is_empty() {
                    return None;
                }
                let value = parts.next().unwrap_or("").trim();
                Some((name.to_string(), value.to_string()))
            })
            .collect()
    }

    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.cookies()
            .into_iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    #[must_use]
    pub fn cached(&self, key: CacheKey) -> Option<&MultiMap> {
        self.cache.get(&key)
    }

    /// Return the cached map for `key`, computing it with `parse` on first
    /// use.
    pub fn cached_or_insert(
        &mut self,
        key: CacheKey,
        parse: impl FnOnce(&Self) -> MultiMap,
    ) -> &MultiMap {
        if !self.cache.contains_key(&key) {
            let map = parse(self);
            self.cache.insert(key, map);
        }
        self.cache.entry(key).or_default()
    }

    /// Fallible variant of [`RequestContext::cached_or_insert`]. Nothing is
    /// cached when `parse` fails.
    pub fn cached_or_insert_with<E>(
        &mut self,
        key: CacheKey,
        parse: impl FnOnce(&mut Self) -> Result<MultiMap, E>,
    ) -> Result<&MultiMap, E> {
        if !self.cache.contains_key(&key) {
            let map = parse(self)?;
            self.cache.insert(key, map);
        }
        let map: &MultiMap = self.cache.entry(key).or_default();
        Ok(map)
    }

    /// `true` when the request carries at least one body byte.
    ///
    /// A streamed body is peeked: a stream already at EOF becomes
    /// [`Body::Empty`], otherwise the peeked byte is put back in front of
    /// the stream.
    ///
    /// # Errors
    ///
    /// Propagates read failures of a streamed body.
    pub fn has_body(&mut self) -> io::Result<bool> {
        match std::mem::take(&mut self.body) {
            Body::Stream(mut reader) => {
                let mut first = [0u8; 1];
                let n = loop {
                    match reader.read(&mut first) {
                        Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                        other => break other,
                    }
                };
                match n {
                    Ok(0) => Ok(false),
                    Ok(_) => {
                        self.body = Body::Stream(Box::new(Cursor::new(first).chain(reader)));
                        Ok(true)
                    }
                    Err(e) => {
                        self.body = Body::Consumed;
                        Err(e)
                    }
                }
            }
            body => {
                let present = matches!(&body, Body::Buffered(bytes) if !bytes.is_empty());
                self.body = body;
                Ok(present)
            }
        }
    }

    /// Read a streamed body into memory. Buffered bodies are returned as-is.
    ///
    /// # Errors
    ///
    /// Propagates read failures, and fails if the body was already handed
    /// out as a stream.
    pub fn buffer_body(&mut self) -> io::Result<&[u8]> {
        if let Body::Stream(reader) = &mut self.body {
            let mut bytes = Vec::new();
            reader.read_to_end(&mut bytes)?;
            self.body = Body::Buffered(bytes);
        }
        match &self.body {
            Body::Buffered(bytes) => Ok(bytes),
            Body::Empty => Ok(&[]),
            Body::Consumed => Err(consumed()),
            Body::Stream(_) => Err(io::Error::other("request body stream not buffered")),
        }
    }

    /// Hand out the body as a reader. A buffered body stays available; a
    /// streamed one can only be taken once.
    ///
    /// # Errors
    ///
    /// Fails if a streamed body was already taken.
    pub fn take_body(&mut self) -> io::Result<Box<dyn Read + Send>> {
        match std::mem::replace(&mut self.body, Body::Consumed) {
            Body::Empty => {
                self.body = Body::Empty;
                Ok(Box::new(io::empty()))
            }
            Body::Buffered(bytes) => {
                let reader = Cursor::new(bytes.clone());
                self.body = Body::Buffered(bytes);
                Ok(Box::new(reader))
            }
            Body::Stream(reader) => Ok(reader),
            Body::Consumed => Err(consumed()),
        }
    }

    pub fn push_frame(&mut self, frame: ResolutionFrame) {
        self.stack.push(frame);
    }

    /// Frames pushed so far, outermost first.
    #[must_use]
    pub fn resolution_stack(&self) -> &[ResolutionFrame] {
        &self.stack
    }
}

fn consumed() -> io::Error {
    io::Error::other("request body already consumed")
}
