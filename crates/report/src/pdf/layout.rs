//! Page layout: a top-down cursor emitting content-stream operations.

use lopdf::{Object, StringFormat};
use lopdf::content::Operation;

use super::font::{Font, encode, sanitize, wrap};

pub const PAGE_WIDTH: f32 = 595.0;
pub const PAGE_HEIGHT: f32 = 842.0;
pub const MARGIN: f32 = 50.0;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Align {
    Left,
    Centre,
}

fn real(v: f32) -> Object {
    v.into()
}

/// Accumulates operations per page and breaks pages automatically.
#[derive(Debug, Default)]
pub struct Layout {
    pages: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    y: f32,
    started: bool,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_page(&mut self) {
        if self.started {
            self.pages.push(std::mem::take(&mut self.current));
        }
        self.started = true;
        self.y = PAGE_HEIGHT - MARGIN;
    }

    /// Start a new page unless `height` points still fit above the bottom margin.
    pub fn ensure(&mut self, height: f32) {
        if !self.started || self.y - height < MARGIN {
            self.new_page();
        }
    }

    pub fn space(&mut self, height: f32) {
        self.y -= height;
    }

    pub fn cursor(&self) -> f32 {
        self.y
    }

    pub fn set_cursor(&mut self, y: f32) {
        self.y = y;
    }

    fn fill_color(&mut self, rgb: [u8; 3]) {
        let [r, g, b] = rgb.map(|c| real(f32::from(c) / 255.0));
        self.current.push(Operation::new("rg", vec![r, g, b]));
    }

    /// Filled rectangle with its top edge at the cursor; does not move it.
    pub fn band(&mut self, x: f32, width: f32, height: f32, rgb: [u8; 3]) {
        self.fill_color(rgb);
        self.current.push(Operation::new(
            "re",
            vec![real(x), real(self.y - height), real(width), real(height)],
        ));
        self.current.push(Operation::new("f", vec![]));
        self.fill_color([0, 0, 0]);
    }

    /// Stroked rectangle with its top edge at the cursor; does not move it.
    pub fn frame(&mut self, x: f32, width: f32, height: f32) {
        self.current.push(Operation::new(
            "re",
            vec![real(x), real(self.y - height), real(width), real(height)],
        ));
        self.current.push(Operation::new("S", vec![]));
    }

    /// Place one line of text with its baseline `size` below the cursor; does not move it.
    pub fn text_at(&mut self, text: &str, font: Font, size: f32, x: f32, rgb: [u8; 3]) {
        let bytes = encode(text);
        self.fill_color(rgb);
        self.current.push(Operation::new("BT", vec![]));
        self.current.push(Operation::new(
            "Tf",
            vec![Object::Name(font.resource().as_bytes().to_vec()), real(size)],
        ));
        self.current
            .push(Operation::new("Td", vec![real(x), real(self.y - size)]));
        self.current
            .push(Operation::new("Tj", vec![Object::String(bytes, StringFormat::Literal)]));
        self.current.push(Operation::new("ET", vec![]));
        if rgb != [0, 0, 0] {
            self.fill_color([0, 0, 0]);
        }
    }

    /// One line of text, then advance by `leading`.
    pub fn line(&mut self, text: &str, font: Font, size: f32, align: Align, leading: f32) {
        self.ensure(leading);
        let x = match align {
            Align::Left => MARGIN,
            Align::Centre => {
                let w = font.width(&sanitize(text), size);
                MARGIN + ((CONTENT_WIDTH - w) / 2.0).max(0.0)
            }
        };
        self.text_at(text, font, size, x, [0, 0, 0]);
        self.y -= leading;
    }

    /// Word-wrapped paragraph starting at `indent` points from the left margin.
    pub fn paragraph(&mut self, text: &str, font: Font, size: f32, indent: f32, leading: f32) {
        let clean = sanitize(text);
        for line in wrap(&clean, font, size, CONTENT_WIDTH - indent) {
            self.ensure(leading);
            self.text_at(&line, font, size, MARGIN + indent, [0, 0, 0]);
            self.y -= leading;
        }
    }

    /// Underline spanning `width` points, just below the previous line.
    pub fn underline(&mut self, x: f32, width: f32) {
        let y = self.y + 2.0;
        self.current.push(Operation::new("m", vec![real(x), real(y)]));
        self.current
            .push(Operation::new("l", vec![real(x + width), real(y)]));
        self.current.push(Operation::new("S", vec![]));
    }

    /// Draw an image XObject with its top-left corner at the cursor, then advance.
    pub fn image(&mut self, name: &str, width: f32, height: f32) {
        self.ensure(height);
        let x = MARGIN + (CONTENT_WIDTH - width) / 2.0;
        self.current.push(Operation::new("q", vec![]));
        self.current.push(Operation::new(
            "cm",
            vec![
                real(width),
                real(0.0),
                real(0.0),
                real(height),
                real(x),
                real(self.y - height),
            ],
        ));
        self.current
            .push(Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]));
        self.current.push(Operation::new("Q", vec![]));
        self.y -= height;
    }

    pub fn finish(mut self) -> Vec<Vec<Operation>> {
        if self.started {
            self.pages.push(self.current);
        }
        self.pages
    }
}
