//! Import of `searchindex.js` files written by Sphinx.
//!
//! Sphinx emits a JavaScript object literal rather than JSON: identifier keys
//! are left unquoted, documents are split across parallel `docnames`,
//! `filenames` and `titles` arrays, and objects are grouped under their parent
//! prefix with an integer type referring to the `objtypes` table.

use super::persisted::{RawPostings, postings};
use crate::error::LoadError;
use crate::search::{
    Document, DocumentId, ObjectEntry, ObjectKind, SearchIndex, TokenizerSettings,
};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
struct SphinxIndex {
    docnames: Vec<String>,
    #[serde(default)]
    filenames: Vec<String>,
    titles: Vec<String>,
    #[serde(default)]
    objects: BTreeMap<String, SphinxMembers>,
    #[serde(default)]
    objtypes: BTreeMap<String, String>,
    terms: BTreeMap<String, RawPostings>,
    #[serde(default)]
    titleterms: BTreeMap<String, RawPostings>,
}

/// Objects sharing one prefix.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SphinxMembers {
    /// `name: [document, objtype, priority, anchor]`
    Named(BTreeMap<String, (u32, u32, i64, String)>),
    /// `[document, objtype, priority, anchor, name]`, written by newer Sphinx releases
    Listed(Vec<(u32, u32, i64, String, String)>),
}

/// Whether a parsed script looks like a Sphinx index rather than a docindex file.
pub(super) fn is_sphinx_index(value: &serde_json::Value) -> bool {
    value.get("docnames").is_some() && value.get("documents").is_none()
}

/// Converts a Sphinx index into a [`SearchIndex`].
///
/// Objects whose type has no [`ObjectKind`] counterpart (labels, C functions,
/// and so on) are skipped.
pub(super) fn import(value: serde_json::Value) -> Result<SearchIndex, LoadError> {
    let sphinx: SphinxIndex = serde_json::from_value(value)?;

    let count = sphinx.docnames.len();
    for (table, len) in [("titles", sphinx.titles.len()), ("filenames", sphinx.filenames.len())] {
        if len != count && !(table == "filenames" && len == 0) {
            return Err(LoadError::DocumentTableMismatch {
                table,
                len,
                count,
            });
        }
    }

    let mut filenames = sphinx.filenames.into_iter();
    let documents = sphinx
        .docnames
        .into_iter()
        .zip(sphinx.titles)
        .enumerate()
        .map(|(position, (docname, title))| Document {
            id: DocumentId::from_index(position),
            path: filenames.next().unwrap_or(docname),
            title,
        })
        .collect();

    let mut objects = BTreeMap::new();
    for (prefix, members) in sphinx.objects {
        let members: Vec<(String, u32, u32)> = match members {
            SphinxMembers::Named(map) => map
                .into_iter()
                .map(|(name, (document, objtype, _, _))| (name, document, objtype))
                .collect(),
            SphinxMembers::Listed(list) => list
                .into_iter()
                .map(|(document, objtype, _, _, name)| (name, document, objtype))
                .collect(),
        };

        for (name, document, objtype) in members {
            let qualified = if prefix.is_empty() {
                name
            } else {
                format!("{prefix}.{name}")
            };

            let Some(kind) = sphinx
                .objtypes
                .get(&objtype.to_string())
                .map(String::as_str)
                .and_then(object_kind)
            else {
                tracing::debug!("Skipping Sphinx object {} with type {}", qualified, objtype);
                continue;
            };

            let entry = ObjectEntry {
                document: DocumentId::new(document),
                kind,
                display_name: None,
            };
            objects.insert(qualified, entry);
        }
    }

    let index = SearchIndex::from_parts(
        documents,
        objects,
        postings(sphinx.terms)?,
        postings(sphinx.titleterms)?,
        TokenizerSettings::default(),
    )?;
    tracing::debug!(
        "Imported Sphinx index ({} documents, {} objects)",
        index.document_count(),
        index.objects().len()
    );
    Ok(index)
}

/// Maps a Sphinx `domain:role` object type onto an [`ObjectKind`].
fn object_kind(objtype: &str) -> Option<ObjectKind> {
    let role = objtype.rsplit(':').next().unwrap_or(objtype);
    match role {
        "module" => Some(ObjectKind::Module),
        "class" | "exception" => Some(ObjectKind::Class),
        "method" | "classmethod" | "staticmethod" => Some(ObjectKind::Method),
        "attribute" | "data" | "property" => Some(ObjectKind::Attribute),
        "function" => Some(ObjectKind::Function),
        _ => None,
    }
}

/// Quotes the bare identifier keys of a JavaScript object literal so it parses as JSON.
///
/// Already quoted keys, string contents and bare values such as `true` are left alone.
pub(super) fn quote_object_keys(input: &str) -> String {
    let mut output = String::with_capacity(input.len() + input.len() / 8);
    let mut chars = input.char_indices().peekable();
    let mut in_string = false;
    let mut escaped = false;
    let mut expect_key = false;

    while let Some((start, c)) = chars.next() {
        if in_string {
            output.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        if expect_key && is_identifier_start(c) {
            let mut end = start + c.len_utf8();
            while let Some(&(position, next)) = chars.peek() {
                if !is_identifier_part(next) {
                    break;
                }
                end = position + next.len_utf8();
                chars.next();
            }

            let identifier = &input[start..end];
            if input[end..].trim_start().starts_with(':') {
                output.push('"');
                output.push_str(identifier);
                output.push('"');
            } else {
                output.push_str(identifier);
            }
            expect_key = false;
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                expect_key = false;
            }
            '{' | ',' => expect_key = true,
            c if c.is_whitespace() => {}
            _ => expect_key = false,
        }
        output.push(c);
    }

    output
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_part(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::parse;
    use assert2::{check, let_assert};
    use rstest::rstest;

    const SMALL: &str = r#"Search.setIndex({docnames:["index","pages/regions"],envversion:50,filenames:["index.rst","pages/regions.rst"],objects:{fwdpy:{fwdpy:[0,0,0,"-"]},"fwdpy.fwdpy":{Region:[1,1,1,""],evolve_regions:[1,2,1,""],regions:[1,3,1,""]}},objnames:{"0":["py","module","Python module"],"1":["py","class","Python class"],"2":["py","function","Python function"],"3":["std","label","label"]},objtypes:{"0":"py:module","1":"py:class","2":"py:function","3":"std:label"},terms:{region:[0,1],recombin:1,"class":1},titles:["Welcome","Mutation and recombination regions"],titleterms:{region:1,welcom:0}})"#;

    #[rstest]
    #[case("{a:1}", r#"{"a":1}"#)]
    #[case(r#"{"a":1}"#, r#"{"a":1}"#)]
    #[case("{a: [1,true], b :null}", r#"{"a": [1,true], "b" :null}"#)]
    #[case(r#"{a:"x,y:z"}"#, r#"{"a":"x,y:z"}"#)]
    #[case(r#"{a:"say \"b:\""}"#, r#"{"a":"say \"b:\""}"#)]
    #[case("{$ref:{_x1:2}}", r#"{"$ref":{"_x1":2}}"#)]
    fn test_quote_object_keys(#[case] input: &str, #[case] expected: &str) {
        check!(quote_object_keys(input) == expected);
    }

    #[rstest]
    #[case("py:module", Some(ObjectKind::Module))]
    #[case("py:exception", Some(ObjectKind::Class))]
    #[case("py:staticmethod", Some(ObjectKind::Method))]
    #[case("py:data", Some(ObjectKind::Attribute))]
    #[case("py:function", Some(ObjectKind::Function))]
    #[case("std:label", None)]
    fn test_object_kind(#[case] objtype: &str, #[case] expected: Option<ObjectKind>) {
        check!(object_kind(objtype) == expected);
    }

    #[test]
    fn test_import_documents_and_objects() {
        let_assert!(Ok(index) = parse(SMALL));
        check!(index.document_count() == 2);
        check!(index.documents()[1].path == "pages/regions.rst");
        check!(index.documents()[1].title == "Mutation and recombination regions");

        let_assert!(Some(module) = index.object("fwdpy.fwdpy"));
        check!(module.kind == ObjectKind::Module);
        let_assert!(Some(class) = index.object("fwdpy.fwdpy.Region"));
        check!(class.kind == ObjectKind::Class);
        check!(class.document == DocumentId::new(1));
        check!(index.object("fwdpy.fwdpy.regions").is_none());
        check!(index.objects().len() == 3);
    }

    #[test]
    fn test_import_postings() {
        let_assert!(Ok(index) = parse(SMALL));
        check!(index.terms().get("region").len() == 2);
        check!(index.terms().get("class").len() == 1);
        check!(index.title_terms().get("welcom").len() == 1);

        let_assert!(Ok(mut results) = index.search("recombination"));
        let_assert!(Some(hit) = results.next());
        check!(hit.path() == "pages/regions.rst");
    }

    #[test]
    fn test_import_listed_objects() {
        let input = r#"Search.setIndex({docnames:["index"],filenames:["index.rst"],objects:{"fwdpy":[[0,0,1,"","Spop"]]},objtypes:{"0":"py:class"},terms:{},titles:["Welcome"],titleterms:{}})"#;
        let_assert!(Ok(index) = parse(input));
        let_assert!(Some(entry) = index.object("fwdpy.Spop"));
        check!(entry.kind == ObjectKind::Class);
    }

    #[test]
    fn test_import_without_filenames_uses_docnames() {
        let input = r#"Search.setIndex({docnames:["index"],objects:{},objtypes:{},terms:{},titles:["Welcome"],titleterms:{}})"#;
        let_assert!(Ok(index) = parse(input));
        check!(index.documents()[0].path == "index");
    }

    #[test]
    fn test_import_rejects_mismatched_titles() {
        let input = r#"Search.setIndex({docnames:["index","api"],filenames:["index.rst","api.rst"],terms:{},titles:["Welcome"]})"#;
        let_assert!(Err(LoadError::DocumentTableMismatch { table, len, count }) = parse(input));
        check!(table == "titles");
        check!(len == 1);
        check!(count == 2);
    }

    #[test]
    fn test_import_rejects_dangling_object() {
        let input = r#"Search.setIndex({docnames:["index"],filenames:["index.rst"],objects:{fwdpy:{Spop:[3,0,1,""]}},objtypes:{"0":"py:class"},terms:{},titles:["Welcome"]})"#;
        let_assert!(Err(LoadError::DanglingDocument { id, .. }) = parse(input));
        check!(id == 3);
    }
}
