// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Output-path templating.
//
// The substitution map is closed: exactly `${stem}` and `${suffix}` are
// recognised. Any other placeholder name, and any unterminated `${`, is a
// typed per-job error rather than a loosely-typed lookup failure — a
// malformed template never produces a partial path.

use stempel_core::error::{Result, StempelError};

/// Expand `${stem}` and `${suffix}` in `template` with the given values.
///
/// Literal text passes through untouched. A `$` not followed by `{` is
/// literal as well, so templates like `a$b.pdf` stay valid.
pub fn expand_template(template: &str, stem: &str, suffix: &str) -> Result<String> {
    let mut out = String::with_capacity(template.len() + stem.len() + suffix.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            return Err(StempelError::Template {
                template: template.to_string(),
                placeholder: after.to_string(),
            });
        };
        let name = &after[..end];
        match name {
            "stem" => out.push_str(stem),
            "suffix" => out.push_str(suffix),
            other => {
                return Err(StempelError::Template {
                    template: template.to_string(),
                    placeholder: other.to_string(),
                });
            }
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
