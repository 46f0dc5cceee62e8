//! Request routing and path matching.
//!
//! The router maps an incoming method + path to an operation ID, extracting
//! path parameters from `{param}` template segments. Routes are checked in
//! registration order; first match wins.
//!
//! # Example
//!
//! ```rust
//! use portcullis_server::Router;
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.add_route(Method::POST, "/users", "createUser");
//! router.add_route(Method::GET, "/users/{userId}", "getUser");
//!
//! let matched = router.match_route(&Method::GET, "/users/42").unwrap();
//! assert_eq!(matched.operation_id(), "getUser");
//! assert_eq!(matched.param("userId"), Some("42"));
//! ```

use http::Method;
use std::collections::HashMap;

/// A matched route with extracted path parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// The matched operation ID.
    operation_id: String,

    /// Extracted path parameters (e.g. `userId` from `/users/{userId}`).
    params: HashMap<String, String>,
}

impl RouteMatch {
    /// Creates a new route match.
    #[must_use]
    pub fn new(operation_id: impl Into<String>, params: HashMap<String, String>) -> Self {
        Self {
            operation_id: operation_id.into(),
            params,
        }
    }

    /// Returns the operation ID for this route.
    #[must_use]
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// Returns the extracted path parameters.
    #[must_use]
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Returns a specific path parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// A segment of a path template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    /// A literal segment (e.g. "users").
    Literal(String),
    /// A parameter segment (e.g. "{userId}").
    Param(String),
}

/// A registered route.
#[derive(Debug, Clone)]
struct Route {
    method: Method,
    segments: Vec<PathSegment>,
    operation_id: String,
}

impl Route {
    fn new(method: Method, pattern: &str, operation_id: impl Into<String>) -> Self {
        Self {
            method,
            segments: Self::parse_segments(pattern),
            operation_id: operation_id.into(),
        }
    }

    fn parse_segments(pattern: &str) -> Vec<PathSegment> {
        pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                if s.starts_with('{') && s.ends_with('}') {
                    PathSegment::Param(s[1..s.len() - 1].to_string())
                } else {
                    PathSegment::Literal(s.to_string())
                }
            })
            .collect()
    }

    /// Matches this route against a path, extracting parameters on success.
    fn match_path(&self, path: &str) -> Option<HashMap<String, String>> {
        let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        if path_segments.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (pattern, actual) in self.segments.iter().zip(path_segments.iter()) {
            match pattern {
                PathSegment::Literal(expected) => {
                    if expected != *actual {
                        return None;
                    }
                }
                PathSegment::Param(name) => {
                    params.insert(name.clone(), (*actual).to_string());
                }
            }
        }

        Some(params)
    }
}

/// HTTP request router mapping method + path to operation IDs.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Creates a new empty router.
    #[must_use]
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Adds a route.
    ///
    /// # Arguments
    ///
    /// * `method` - HTTP method for this route
    /// * `pattern` - path template (e.g. "/users/{userId}")
    /// * `operation_id` - the operation the route resolves to
    pub fn add_route(
        &mut self,
        method: Method,
        pattern: impl AsRef<str>,
        operation_id: impl Into<String>,
    ) {
        self.routes
            .push(Route::new(method, pattern.as_ref(), operation_id));
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Matches a request to a route; first registered match wins.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        for route in &self.routes {
            if route.method == *method {
                if let Some(params) = route.match_path(path) {
                    return Some(RouteMatch::new(&route.operation_id, params));
                }
            }
        }
        None
    }

    /// Checks whether an operation ID is registered.
    #[must_use]
    pub fn has_operation(&self, operation_id: &str) -> bool {
        self.routes.iter().any(|r| r.operation_id == operation_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_simple_path() {
        let mut router = Router::new();
        router.add_route(Method::POST, "/users", "createUser");

        let matched = router.match_route(&Method::POST, "/users").unwrap();
        assert_eq!(matched.operation_id(), "createUser");
        assert!(matched.params().is_empty());
    }

    #[test]
    fn test_match_with_params() {
        let mut router = Router::new();
        router.add_route(Method::GET, "/users/{userId}/posts/{postId}", "getUserPost");

        let matched = router
            .match_route(&Method::GET, "/users/42/posts/99")
            .unwrap();
        assert_eq!(matched.operation_id(), "getUserPost");
        assert_eq!(matched.param("userId"), Some("42"));
        assert_eq!(matched.param("postId"), Some("99"));
    }

    #[test]
    fn test_method_mismatch() {
        let mut router = Router::new();
        router.add_route(Method::POST, "/users", "createUser");

        assert!(router.match_route(&Method::GET, "/users").is_none());
    }

    #[test]
    fn test_path_mismatch() {
        let mut router = Router::new();
        router.add_route(Method::POST, "/users", "createUser");

        assert!(router.match_route(&Method::POST, "/products").is_none());
        assert!(router.match_route(&Method::POST, "/users/extra").is_none());
    }

    #[test]
    fn test_same_path_different_methods() {
        let mut router = Router::new();
        router.add_route(Method::GET, "/users", "listUsers");
        router.add_route(Method::POST, "/users", "createUser");

        assert_eq!(
            router.match_route(&Method::GET, "/users").unwrap().operation_id(),
            "listUsers"
        );
        assert_eq!(
            router.match_route(&Method::POST, "/users").unwrap().operation_id(),
            "createUser"
        );
    }

    #[test]
    fn test_trailing_slash_is_normalized() {
        let mut router = Router::new();
        router.add_route(Method::GET, "/users", "listUsers");

        assert!(router.match_route(&Method::GET, "/users/").is_some());
    }

    #[test]
    fn test_has_operation() {
        let mut router = Router::new();
        router.add_route(Method::POST, "/users", "createUser");

        assert!(router.has_operation("createUser"));
        assert!(!router.has_operation("unknown"));
        assert_eq!(router.route_count(), 1);
    }
}
