//! Route extraction for both routing dialects.
//!
//! Decorator dialect: method and path read from an annotation directly above
//! a handler (`@router.get("/users", auth=session_auth)`). File-convention
//! dialect: method inferred from exported handler names in a `route.*` file
//! whose path under `app/` encodes the URL.
//!
//! Both dialects normalize path parameters to `{name}` placeholders so that
//! routes differing only in parameter spelling compare equal.

use once_cell::sync::Lazy;
use regex::Regex;

use super::types::Route;
use crate::scan;

static DECORATOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"@(?:\w+)\.(?i)(get|post|put|delete|patch)\s*\(\s*['"]([^'"]+)['"]([^)]*)\)"#)
        .unwrap()
});

static HTTP_DECORATOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"@http_(?i)(get|post|put|delete|patch)\s*\(\s*['"]([^'"]+)['"]([^)]*)\)"#).unwrap()
});

static AUTH_ARG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"auth\s*=\s*(\w+)").unwrap());

static FUNC_DEF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(?:async\s+)?def\s+(\w+)\s*\(").unwrap());

static PY_STUB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s+(?:pass|\.\.\.|raise NotImplementedError)\s*(?:#.*)?$").unwrap()
});

static METHOD_EXPORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)export\s+(?:async\s+)?function\s+(GET|POST|PUT|DELETE|PATCH|HEAD|OPTIONS)\s*\(")
        .unwrap()
});

static METHOD_ARROW_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)export\s+const\s+(GET|POST|PUT|DELETE|PATCH|HEAD|OPTIONS)\s*=").unwrap()
});

static TS_AUTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)getServerSession|\bauth\(\)|cookies\(\)|getToken|withAuth|NextAuth|authOptions|currentUser|requireUser",
    )
    .unwrap()
});

static TS_STUB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)return\s+(?:new\s+)?(?:Response|NextResponse)\.json\(\s*\{\s*\}\s*\)|throw\s+new\s+Error\(['"]not implemented|//\s*TODO"#,
    )
    .unwrap()
});

static PARAM_RE: Lazy<Regex> = Lazy::new(|| {
    // <int:pk>, <pk>, [id], :id, {id} -- all collapse to {name}
    Regex::new(r"<(?:\w+:)?(\w+)>|\[(\w+)\]|:(\w+)|\{(\w+)\}").unwrap()
});

/// Rewrite every path-parameter spelling to the canonical `{name}` form.
pub fn normalize_path(path: &str) -> String {
    let normalized = PARAM_RE.replace_all(path, |caps: &regex::Captures| {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| m.as_str())
            .unwrap_or("param");
        format!("{{{}}}", name)
    });
    let mut p = normalized.into_owned();
    if p.len() > 1 && p.ends_with('/') {
        p.pop();
    }
    p
}

/// Extract decorator-dialect routes from one source file.
pub fn extract_decorator_routes(file: &str, text: &str) -> Vec<Route> {
    let mut routes = Vec::new();

    for re in [&*DECORATOR_RE, &*HTTP_DECORATOR_RE] {
        for caps in re.captures_iter(text) {
            let m = caps.get(0).unwrap();
            let method = caps[1].to_uppercase();
            let path = normalize_path(&caps[2]);
            let tail = caps.get(3).map(|c| c.as_str()).unwrap_or("");

            let requires_auth = AUTH_ARG_RE
                .captures(tail)
                .map(|a| !matches!(a[1].to_lowercase().as_str(), "none" | "false"))
                .unwrap_or(false);

            let (handler, is_stub) = handler_after(text, m.end());

            routes.push(Route {
                method,
                path,
                handler,
                requires_auth,
                is_stub,
                file: file.to_string(),
                line: scan::line_at(text, m.start()),
            });
        }
    }

    routes.sort_by(|a, b| a.line.cmp(&b.line).then_with(|| a.method.cmp(&b.method)));
    routes
}

/// Name of the next handler definition and whether its body is a stub.
fn handler_after(text: &str, from: usize) -> (String, bool) {
    let rest = &text[from..];
    let Some(caps) = FUNC_DEF_RE.captures(rest) else {
        return ("unknown".to_string(), false);
    };
    let name = caps[1].to_string();

    // Stub check looks at the handful of lines after the def.
    let def_end = from + caps.get(0).unwrap().end();
    let body: String = text[def_end..].lines().take(5).collect::<Vec<_>>().join("\n");
    let is_stub = PY_STUB_RE.is_match(&body);

    (name, is_stub)
}

/// Derive the URL path a convention-routed handler file serves.
///
/// The relative file path encodes the route: segments after the `app/`
/// directory up to the filename, with `(group)` segments stripped.
/// `app/api/users/[id]/route.ts` serves `/api/users/{id}`.
pub fn convention_path(rel_file: &str) -> Option<String> {
    let norm = rel_file.replace('\\', "/");
    let idx = norm
        .split('/')
        .position(|seg| seg == "app")?;
    let segments: Vec<&str> = norm.split('/').collect();
    let dir_segments = &segments[idx + 1..segments.len().saturating_sub(1)];

    let parts: Vec<&str> = dir_segments
        .iter()
        .copied()
        .filter(|s| !(s.starts_with('(') && s.ends_with(')')))
        .collect();

    let raw = if parts.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", parts.join("/"))
    };
    Some(normalize_path(&raw))
}

/// Extract file-convention routes from a `route.*` handler file.
pub fn extract_convention_routes(rel_file: &str, text: &str) -> Vec<Route> {
    let Some(path) = convention_path(rel_file) else {
        return Vec::new();
    };

    let mut methods: Vec<(String, usize)> = Vec::new();
    for re in [&*METHOD_EXPORT_RE, &*METHOD_ARROW_RE] {
        for caps in re.captures_iter(text) {
            let method = caps[1].to_string();
            if !methods.iter().any(|(m, _)| *m == method) {
                let line = scan::line_at(text, caps.get(0).unwrap().start());
                methods.push((method, line));
            }
        }
    }
    if methods.is_empty() {
        methods.push(("GET".to_string(), 1));
    }

    let requires_auth = TS_AUTH_RE.is_match(text);
    let is_stub = TS_STUB_RE.is_match(text);

    let mut routes: Vec<Route> = methods
        .into_iter()
        .map(|(method, line)| Route {
            handler: method.clone(),
            method,
            path: path.clone(),
            requires_auth,
            is_stub,
            file: rel_file.to_string(),
            line,
        })
        .collect();

    routes.sort_by(|a, b| a.line.cmp(&b.line).then_with(|| a.method.cmp(&b.method)));
    routes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_spellings() {
        assert_eq!(normalize_path("/users/<int:pk>"), "/users/{pk}");
        assert_eq!(normalize_path("/users/<id>"), "/users/{id}");
        assert_eq!(normalize_path("/users/[id]"), "/users/{id}");
        assert_eq!(normalize_path("/users/:id"), "/users/{id}");
        assert_eq!(normalize_path("/users/{id}"), "/users/{id}");
        assert_eq!(normalize_path("/users/"), "/users");
        assert_eq!(normalize_path("/"), "/");
    }

    #[test]
    fn test_decorator_route_basics() {
        let text = "@router.get(\"/users\")\ndef list_users(request):\n    return []\n";
        let routes = extract_decorator_routes("api.py", text);
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].method, "GET");
        assert_eq!(routes[0].path, "/users");
        assert_eq!(routes[0].handler, "list_users");
        assert!(!routes[0].requires_auth);
        assert!(!routes[0].is_stub);
    }

    #[test]
    fn test_decorator_auth_argument() {
        let text = concat!(
            "@router.post(\"/users\", auth=session_auth)\n",
            "def create_user(request):\n    return {}\n",
            "@router.delete(\"/users/<int:pk>\", auth=None)\n",
            "def delete_user(request, pk):\n    return {}\n",
        );
        let routes = extract_decorator_routes("api.py", text);
        assert!(routes.iter().any(|r| r.method == "POST" && r.requires_auth));
        let del = routes.iter().find(|r| r.method == "DELETE").unwrap();
        assert!(!del.requires_auth);
        assert_eq!(del.path, "/users/{pk}");
    }

    #[test]
    fn test_decorator_stub_detection() {
        let text = concat!(
            "@router.get(\"/health\")\n",
            "def health(request):\n    pass\n",
            "@router.get(\"/todo\")\n",
            "def todo(request):\n    raise NotImplementedError\n",
        );
        let routes = extract_decorator_routes("api.py", text);
        assert!(routes.iter().all(|r| r.is_stub));
    }

    #[test]
    fn test_http_decorator_variant() {
        let text = "@http_put(\"/items/<id>\")\ndef update_item(request, id):\n    return {}\n";
        let routes = extract_decorator_routes("api.py", text);
        assert_eq!(routes[0].method, "PUT");
        assert_eq!(routes[0].path, "/items/{id}");
    }

    #[test]
    fn test_convention_path_derivation() {
        assert_eq!(
            convention_path("frontend/app/api/users/route.ts").unwrap(),
            "/api/users"
        );
        assert_eq!(
            convention_path("app/api/users/[id]/route.ts").unwrap(),
            "/api/users/{id}"
        );
        assert_eq!(
            convention_path("app/(auth)/login/route.ts").unwrap(),
            "/login"
        );
        assert_eq!(convention_path("app/route.ts").unwrap(), "/");
        assert_eq!(convention_path("src/no_marker/route.ts"), None);
    }

    #[test]
    fn test_convention_method_exports() {
        let text = concat!(
            "export async function GET(req: Request) {\n  return NextResponse.json(data);\n}\n",
            "export const POST = async (req: Request) => {\n  return NextResponse.json({});\n};\n",
        );
        let routes = extract_convention_routes("app/api/users/route.ts", text);
        let methods: Vec<_> = routes.iter().map(|r| r.method.as_str()).collect();
        assert!(methods.contains(&"GET"));
        assert!(methods.contains(&"POST"));
    }

    #[test]
    fn test_convention_auth_and_stub() {
        let with_auth = "export async function GET(req) {\n  const session = await getServerSession();\n  return NextResponse.json(session);\n}\n";
        let routes = extract_convention_routes("app/api/me/route.ts", with_auth);
        assert!(routes[0].requires_auth);

        let stub = "export async function POST(req) {\n  return NextResponse.json({});\n}\n";
        let routes = extract_convention_routes("app/api/x/route.ts", stub);
        assert!(routes[0].is_stub);
    }
}
