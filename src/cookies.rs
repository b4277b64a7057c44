use axum::http::{HeaderMap, header};

/// Every `name=value` pair across all `Cookie` headers, in order of appearance.
pub fn parse(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// First value of the named cookie.
pub fn value(headers: &HeaderMap, name: &str) -> Option<String> {
    parse(headers)
        .into_iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_pairs_across_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1; b = 2"));
        headers.append(header::COOKIE, HeaderValue::from_static("c=3;;junk"));

        assert_eq!(value(&headers, "a").as_deref(), Some("1"));
        assert_eq!(value(&headers, "b").as_deref(), Some("2"));
        assert_eq!(value(&headers, "c").as_deref(), Some("3"));
        assert_eq!(value(&headers, "junk"), None);
        assert_eq!(parse(&headers).len(), 3);
    }
}
