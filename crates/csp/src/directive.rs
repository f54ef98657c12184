//! Standard CSP directive names.
//!
//! Reference: https://developer.mozilla.org/en-US/docs/Web/HTTP/Headers/Content-Security-Policy

// Fetch directives
pub const CHILD_SRC: &str = "child-src";
pub const CONNECT_SRC: &str = "connect-src";
pub const DEFAULT_SRC: &str = "default-src";
pub const FONT_SRC: &str = "font-src";
pub const FRAME_SRC: &str = "frame-src";
pub const IMG_SRC: &str = "img-src";
pub const MANIFEST_SRC: &str = "manifest-src";
pub const MEDIA_SRC: &str = "media-src";
pub const OBJECT_SRC: &str = "object-src";
/// Deprecated, still honored by some browsers
pub const PREFETCH_SRC: &str = "prefetch-src";
pub const SCRIPT_SRC: &str = "script-src";
pub const SCRIPT_SRC_ATTR: &str = "script-src-attr";
pub const SCRIPT_SRC_ELEM: &str = "script-src-elem";
pub const STYLE_SRC: &str = "style-src";
pub const STYLE_SRC_ATTR: &str = "style-src-attr";
pub const STYLE_SRC_ELEM: &str = "style-src-elem";
pub const WORKER_SRC: &str = "worker-src";

// Document directives
pub const BASE_URI: &str = "base-uri";
/// Deprecated
pub const PLUGIN_TYPES: &str = "plugin-types";
pub const SANDBOX: &str = "sandbox";

// Navigation directives
pub const FORM_ACTION: &str = "form-action";
pub const FRAME_ANCESTORS: &str = "frame-ancestors";
/// Experimental
pub const NAVIGATE_TO: &str = "navigate-to";

// Reporting directives
pub const REPORT_TO: &str = "report-to";
/// Deprecated in favor of `report-to`
pub const REPORT_URI: &str = "report-uri";

// Other directives
pub const BLOCK_ALL_MIXED_CONTENT: &str = "block-all-mixed-content";
pub const REQUIRE_SRI_FOR: &str = "require-sri-for";
pub const TRUSTED_TYPES: &str = "trusted-types";
pub const UPGRADE_INSECURE_REQUESTS: &str = "upgrade-insecure-requests";

/// Directives that are meaningful with no sources at all.
///
/// `sandbox` may also carry values; an empty `sandbox` applies every restriction.
pub const VALUELESS_DIRECTIVES: [&str; 3] = [
    BLOCK_ALL_MIXED_CONTENT,
    SANDBOX,
    UPGRADE_INSECURE_REQUESTS,
];

/// Whether a normalized directive name may appear without sources.
pub fn is_valueless(directive: &str) -> bool {
    VALUELESS_DIRECTIVES.contains(&directive)
}

/// Trims and lowercases a directive name. Returns `None` for blank input.
pub fn normalize_directive(directive: &str) -> Option<String> {
    let key = directive.trim().to_lowercase();
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}
