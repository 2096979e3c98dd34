//! Page for unknown controller names
//!
//! Every action name renders the same page, so `/martians/land` is a 404
//! rather than an unknown-action error.

use hyper::StatusCode;

use super::ActionOutput;

const NOT_FOUND_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Not Found - UFO Atlas</title>
</head>
<body>
    <h1>404</h1>
    <p>Whatever you were looking for has left the atmosphere.</p>
    <p><a href="/">Back to the map</a></p>
</body>
</html>
"#;

pub fn invoke() -> ActionOutput {
    ActionOutput::html(NOT_FOUND_PAGE).with_status(StatusCode::NOT_FOUND)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_page() {
        let out = invoke();
        assert_eq!(out.status, StatusCode::NOT_FOUND);
        assert!(std::str::from_utf8(&out.body).unwrap().contains("404"));
    }
}
