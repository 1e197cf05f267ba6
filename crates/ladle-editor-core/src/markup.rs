//! HTML-like markup for contenteditable hosts.
//!
//! Text is escaped, `\n` becomes `<br>`, mentions become non-editable spans
//! carrying their canonical reference, groups become `<div>`s.

use pulldown_cmark_escape::escape_html;

use crate::codec::{DisplayNames, ReferenceSyntax};
use crate::sync::render;
use crate::tree::{Node, SurfaceTree};

impl SurfaceTree {
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        write_markup(&self.nodes, &mut out);
        out
    }
}

/// `render` followed by [`SurfaceTree::to_markup`].
pub fn render_markup(
    text: &str,
    syntax: &ReferenceSyntax,
    names: &(impl DisplayNames + ?Sized),
) -> String {
    render(text, syntax, names).to_markup()
}

fn write_markup(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(s) => {
                for (i, line) in s.split('\n').enumerate() {
                    if i > 0 {
                        out.push_str("<br>");
                    }
                    // Writing into a String cannot fail.
                    let _ = escape_html(&mut *out, line);
                }
            }
            Node::LineBreak => out.push_str("<br>"),
            Node::Mention(m) => {
                out.push_str("<span class=\"mention\" contenteditable=\"false\" data-reference=\"");
                let _ = escape_html(&mut *out, &m.reference.to_smolstr());
                out.push_str("\">@");
                let _ = escape_html(&mut *out, &m.label);
                out.push_str("</span>");
            }
            Node::Group(children) => {
                out.push_str("<div>");
                write_markup(children, out);
                out.push_str("</div>");
            }
        }
    }
}
