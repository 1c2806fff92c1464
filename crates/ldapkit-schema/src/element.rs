//! Shared pieces of all schema element kinds.

use std::collections::BTreeMap;
use std::fmt::Write;

/// Vendor extension properties: `X-` keyword to ordered value list.
pub type ExtraProperties = BTreeMap<String, Vec<String>>;

/// Append `NAME 'x'` or `NAME ( 'x' 'y' )` to a definition under assembly.
pub(crate) fn write_names(buf: &mut String, names: &[String]) {
    match names {
        [] => {}
        [single] => {
            let _ = write!(buf, " NAME '{single}'");
        }
        many => {
            buf.push_str(" NAME (");
            for name in many {
                let _ = write!(buf, " '{name}'");
            }
            buf.push_str(" )");
        }
    }
}

/// Append `DESC '...'` if a description is present.
pub(crate) fn write_description(buf: &mut String, description: &str) {
    if !description.is_empty() {
        let _ = write!(buf, " DESC '{description}'");
    }
}

/// Append `KEYWORD oid` or `KEYWORD ( oid $ oid )`.
pub(crate) fn write_oids(buf: &mut String, keyword: &str, oids: &[String]) {
    match oids {
        [] => {}
        [single] => {
            let _ = write!(buf, " {keyword} {single}");
        }
        many => {
            let _ = write!(buf, " {keyword} (");
            for (i, oid) in many.iter().enumerate() {
                if i > 0 {
                    buf.push_str(" $");
                }
                let _ = write!(buf, " {oid}");
            }
            buf.push_str(" )");
        }
    }
}

/// Append the vendor extensions, each as `X-KEY 'v'` or `X-KEY ( 'v' 'w' )`.
pub(crate) fn write_extra_properties(buf: &mut String, properties: &ExtraProperties) {
    for (key, values) in properties {
        match values.as_slice() {
            [] => {}
            [single] => {
                let _ = write!(buf, " {key} '{single}'");
            }
            many => {
                let _ = write!(buf, " {key} (");
                for value in many {
                    let _ = write!(buf, " '{value}'");
                }
                buf.push_str(" )");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_names() {
        let mut buf = String::new();
        write_names(&mut buf, &["cn".to_string()]);
        assert_eq!(buf, " NAME 'cn'");

        let mut buf = String::new();
        write_names(&mut buf, &["cn".to_string(), "commonName".to_string()]);
        assert_eq!(buf, " NAME ( 'cn' 'commonName' )");
    }

    #[test]
    fn test_write_oids() {
        let mut buf = String::new();
        write_oids(&mut buf, "MUST", &["cn".to_string(), "sn".to_string()]);
        assert_eq!(buf, " MUST ( cn $ sn )");

        let mut buf = String::new();
        write_oids(&mut buf, "SUP", &["top".to_string()]);
        assert_eq!(buf, " SUP top");
    }

    #[test]
    fn test_write_extra_properties() {
        let mut props = ExtraProperties::new();
        props.insert("X-ORIGIN".to_string(), vec!["RFC 4519".to_string()]);
        let mut buf = String::new();
        write_extra_properties(&mut buf, &props);
        assert_eq!(buf, " X-ORIGIN 'RFC 4519'");
    }
}
