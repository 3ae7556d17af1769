//! Lookup helpers for FIM documents.
//!
//! FIM exports prefix every element with `xdf:` but some tools emit a default
//! namespace or none at all, so all lookups compare local names only.

use roxmltree::Node;

/// Find the first child element with the given local name.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use ozg_xdatenfelder::xml::find_child;
///
/// let xml = r#"<xdf:datenfeld xmlns:xdf="urn:x"><xdf:name>Vorname</xdf:name></xdf:datenfeld>"#;
/// let doc = Document::parse(xml).unwrap();
///
/// assert!(find_child(doc.root_element(), "name").is_some());
/// assert!(find_child(doc.root_element(), "inhalt").is_none());
/// ```
pub fn find_child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == tag)
}

/// Find all child elements with the given local name, in document order.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use ozg_xdatenfelder::xml::find_children;
///
/// let xml = r#"<gruppe><struktur/><name/><struktur/></gruppe>"#;
/// let doc = Document::parse(xml).unwrap();
///
/// assert_eq!(find_children(doc.root_element(), "struktur").count(), 2);
/// ```
pub fn find_children<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |child| child.is_element() && child.tag_name().name() == tag)
}

/// Follow a slash-separated path of local names (e.g. `identifikation/id`).
///
/// Each step takes the first matching child.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use ozg_xdatenfelder::xml::find_by_path;
///
/// let xml = r#"<datenfeld><feldart><code>select</code></feldart></datenfeld>"#;
/// let doc = Document::parse(xml).unwrap();
///
/// let code = find_by_path(doc.root_element(), "feldart/code").unwrap();
/// assert_eq!(code.text(), Some("select"));
/// ```
pub fn find_by_path<'a, 'input>(node: Node<'a, 'input>, path: &str) -> Option<Node<'a, 'input>> {
    path.split('/')
        .try_fold(node, |current, part| find_child(current, part))
}

/// Text content of a node, trimmed. Empty string if the node has no text.
pub fn get_text(node: Node<'_, '_>) -> String {
    node.text()
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Trimmed text of the element at `path`, or `None` if the element is absent.
///
/// An element that exists but is empty yields `Some("")`.
pub fn child_text(node: Node<'_, '_>, path: &str) -> Option<String> {
    find_by_path(node, path).map(get_text)
}
