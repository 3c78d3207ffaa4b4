//! Parser for the replacements document a formatter prints.
//!
//! ```xml
//! <?xml version='1.0'?>
//! <replacements xml:space='preserve' incomplete_format='false'>
//! <cursor>6</cursor>
//! <replacement offset='3' length='3'> </replacement>
//! </replacements>
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::edit::{Edit, EditBatch};
use crate::error::{Error, Result};

static ROOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<replacements\b([^>]*?)(/?)>").expect("valid regex"));
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_][\w:.-]*)\s*=\s*(?:'([^']*)'|"([^"]*)")"#).expect("valid regex")
});
static CURSOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<cursor>\s*([^<]*?)\s*</cursor>").expect("valid regex"));
static CURSOR_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<cursor\b").expect("valid regex"));
static REPLACEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<replacement\b([^>]*?)(?:/>|>([^<]*)</replacement\s*>)").expect("valid regex")
});
static REPLACEMENT_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<replacement\b").expect("valid regex"));

/// Parse formatter output into an [`EditBatch`].
///
/// `tool` names the formatter in error messages.
pub fn parse_replacements(tool: &str, output: &str) -> Result<EditBatch> {
    let root = ROOT
        .captures(output)
        .ok_or_else(|| Error::malformed(tool, "missing <replacements> element"))?;
    let root_attrs = attributes(&root[1]);
    let incomplete = root_attrs
        .get("incomplete_format")
        .is_some_and(|value| *value == "true");
    // A self-closing root has no children to read.
    let body = if root[2].is_empty() {
        let start = root.get(0).map_or(0, |m| m.end());
        &output[start..]
    } else {
        ""
    };

    let relocated_cursor = parse_cursor(tool, body)?;

    let opened = REPLACEMENT_OPEN.find_iter(body).count();
    let mut edits = Vec::with_capacity(opened);
    for caps in REPLACEMENT.captures_iter(body) {
        let attrs = attributes(&caps[1]);
        let offset = required_number(tool, &attrs, "offset")?;
        let length = required_number(tool, &attrs, "length")?;
        let text = caps
            .get(2)
            .map(|m| m.as_str())
            .filter(|raw| !raw.is_empty())
            .map(|raw| html_escape::decode_html_entities(raw).into_owned());
        edits.push(Edit {
            offset,
            length,
            text,
        });
    }
    if edits.len() != opened {
        return Err(Error::malformed(
            tool,
            "<replacement> element is unterminated or has more than one text child",
        ));
    }

    Ok(EditBatch {
        edits,
        relocated_cursor,
        incomplete,
    })
}

fn parse_cursor(tool: &str, body: &str) -> Result<Option<usize>> {
    let opened = CURSOR_OPEN.find_iter(body).count();
    if opened > 1 {
        return Err(Error::malformed(tool, "more than one <cursor> element"));
    }
    let Some(caps) = CURSOR.captures(body) else {
        if opened == 1 {
            return Err(Error::malformed(tool, "unterminated <cursor> element"));
        }
        return Ok(None);
    };
    let value = &caps[1];
    value
        .parse()
        .map(Some)
        .map_err(|_| Error::malformed(tool, format!("cursor {value:?} is not a byte offset")))
}

fn attributes(raw: &str) -> HashMap<&str, &str> {
    ATTRIBUTE
        .captures_iter(raw)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str();
            let value = caps.get(2).or_else(|| caps.get(3))?.as_str();
            Some((name, value))
        })
        .collect()
}

fn required_number(tool: &str, attrs: &HashMap<&str, &str>, name: &str) -> Result<usize> {
    let value = attrs
        .get(name)
        .ok_or_else(|| Error::malformed(tool, format!("<replacement> without {name}")))?;
    value.parse().map_err(|_| {
        Error::malformed(tool, format!("<replacement> {name} {value:?} is not a number"))
    })
}
