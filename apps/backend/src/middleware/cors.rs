use actix_cors::Cors;
use actix_web::http::header;

const DEV_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://localhost:4200"];

/// Split a comma-separated origin list, dropping blanks, `null` and anything
/// that is not an http(s) origin.
pub fn parse_allowed_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "null")
        .filter(|s| s.starts_with("http://") || s.starts_with("https://"))
        .map(|s| s.trim_end_matches('/').to_string())
        .collect()
}

/// CORS for the API surface. Falls back to local dev origins when none are
/// configured.
pub fn cors_middleware(allowed_origins: &[String]) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
        ])
        .expose_headers(vec![
            header::HeaderName::from_static("x-trace-id"),
            header::HeaderName::from_static("x-request-id"),
        ])
        .max_age(3600);

    if allowed_origins.is_empty() {
        for origin in DEV_ORIGINS {
            cors = cors.allowed_origin(origin);
        }
    } else {
        for origin in allowed_origins {
            cors = cors.allowed_origin(origin);
        }
    }
    cors
}

#[cfg(test)]
mod tests {
    use super::parse_allowed_origins;

    #[test]
    fn keeps_only_http_origins() {
        let parsed = parse_allowed_origins(
            " https://app.example.test/ ,null,,ftp://x.test,http://localhost:4200",
        );
        assert_eq!(
            parsed,
            vec!["https://app.example.test", "http://localhost:4200"]
        );
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(parse_allowed_origins("").is_empty());
    }
}
