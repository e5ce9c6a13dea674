//! Small quick-xml helpers shared by the package part parsers.

use quick_xml::events::BytesStart;

use super::error::WorkbookResult;

/// Value of the attribute whose local name is `name` (namespace prefixes ignored).
pub(crate) fn attr(e: &BytesStart<'_>, name: &[u8]) -> WorkbookResult<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Attribute parsed as `u32`; absent or unparsable values yield `None`.
pub(crate) fn attr_u32(e: &BytesStart<'_>, name: &[u8]) -> WorkbookResult<Option<u32>> {
    Ok(attr(e, name)?.and_then(|v| v.trim().parse().ok()))
}

/// Attribute parsed as `f64`; absent or unparsable values yield `None`.
pub(crate) fn attr_f64(e: &BytesStart<'_>, name: &[u8]) -> WorkbookResult<Option<f64>> {
    Ok(attr(e, name)?.and_then(|v| v.trim().parse().ok()))
}

/// OOXML boolean attribute: absent means `default`, `0`/`false` mean false.
pub(crate) fn attr_flag(e: &BytesStart<'_>, name: &[u8], default: bool) -> WorkbookResult<bool> {
    Ok(match attr(e, name)? {
        Some(v) => !matches!(v.as_str(), "0" | "false"),
        None => default,
    })
}
