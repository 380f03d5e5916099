//! A plain-text stand-in for the rich editor.
//!
//! Text is held as paragraphs separated by blank lines and serialized into
//! the same node layout the web editor stores, so posts written from the
//! terminal open normally in the browser.

use scribe_sync::{EditorSurface, SurfaceContent};
use serde_json::{json, Value};

const PARAGRAPH_BREAK: &str = "\n\n";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlainTextSurface {
    paragraphs: Vec<String>,
}

impl PlainTextSurface {
    pub fn from_text(text: &str) -> Self {
        let mut surface = Self::default();
        surface.set_text(text);
        surface
    }

    /// Replace the whole content. Returns false if nothing changed.
    pub fn set_text(&mut self, text: &str) -> bool {
        let paragraphs = split_paragraphs(text);
        if paragraphs == self.paragraphs {
            return false;
        }
        self.paragraphs = paragraphs;
        true
    }

    pub fn text(&self) -> String {
        self.paragraphs.join(PARAGRAPH_BREAK)
    }

    pub fn content(&self) -> SurfaceContent {
        SurfaceContent {
            snapshot: self.snapshot(),
            plain_text: self.text(),
        }
    }

    fn snapshot(&self) -> Value {
        let children: Vec<Value> = self.paragraphs.iter().map(|p| paragraph_node(p)).collect();
        json!({
            "root": {
                "children": children,
                "direction": "ltr",
                "format": "",
                "indent": 0,
                "type": "root",
                "version": 1,
            }
        })
    }
}

impl EditorSurface for PlainTextSurface {
    // A file has no selection; actions fall back to the whole text.
    fn selected_text(&self) -> String {
        String::new()
    }

    fn append_paragraph(&mut self, text: &str) -> SurfaceContent {
        self.paragraphs.extend(split_paragraphs(text));
        self.content()
    }
}

fn split_paragraphs(text: &str) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n");
    normalized
        .split(PARAGRAPH_BREAK)
        .map(|p| p.trim_matches('\n'))
        .filter(|p| !p.trim().is_empty())
        .map(str::to_string)
        .collect()
}

fn paragraph_node(text: &str) -> Value {
    json!({
        "children": [{
            "detail": 0,
            "format": 0,
            "mode": "normal",
            "style": "",
            "text": text,
            "type": "text",
            "version": 1,
        }],
        "direction": "ltr",
        "format": "",
        "indent": 0,
        "type": "paragraph",
        "version": 1,
    })
}
