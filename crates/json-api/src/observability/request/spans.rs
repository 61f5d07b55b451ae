//! HTTP span and metric route labels.

use uuid::Uuid;

#[derive(Debug, Clone)]
pub(super) struct RequestSpanName {
    pub(super) route: String,
    pub(super) span_name: String,
}

pub(super) fn request_span_name(method: &str, path: &str) -> RequestSpanName {
    let route = route_label(path);
    let span_name = format!("{method} {route}");

    RequestSpanName { route, span_name }
}

/// Path with identifiers and natural keys replaced by placeholders.
fn route_label(path: &str) -> String {
    if path == "/" {
        return "/".to_owned();
    }

    let mut label = String::from("/");
    let mut previous = "";

    for (index, segment) in path.trim_start_matches('/').split('/').enumerate() {
        if index > 0 {
            label.push('/');
        }

        if Uuid::parse_str(segment).is_ok() {
            label.push_str("{guid}");
        } else if previous == "code" {
            label.push_str("{code}");
        } else {
            label.push_str(segment);
        }

        previous = segment;
    }

    label
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_and_codes_collapse_into_placeholders() {
        assert_eq!(
            route_label("/sale-channel/0192b6a4-7c1e-7a41-9d3c-5f0e2a6b8c11"),
            "/sale-channel/{guid}"
        );
        assert_eq!(
            route_label("/sale-channel/code/GRAB"),
            "/sale-channel/code/{code}"
        );
        assert_eq!(route_label("/master-sync/status"), "/master-sync/status");
        assert_eq!(route_label("/"), "/");
    }

    #[test]
    fn span_name_prefixes_the_method() {
        let names = request_span_name("GET", "/sale-channel/code/LINE");

        assert_eq!(names.span_name, "GET /sale-channel/code/{code}");
    }
}
