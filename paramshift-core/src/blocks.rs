//! Block-boundary index over raw source text
//!
//! Global invariants enforced:
//! - One linear scan per file, no backtracking
//! - Braces inside string literals, template literals and comments are never indexed
//! - `${ ... }` substitutions inside template literals are scanned as code
//! - Line numbers are 0-indexed
//!
//! Regex literals are not recognized; a brace inside one is indexed like any other.

/// One `{ ... }` region located by the scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    /// Byte offset of the opening brace
    pub open: usize,
    /// Byte offset of the matching closing brace (None if never closed)
    pub close: Option<usize>,
    pub open_line: usize,
    pub close_line: Option<usize>,
}

/// All blocks of a file, ordered by opening offset
#[derive(Debug, Clone, Default)]
pub struct BlockIndex {
    blocks: Vec<Block>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Code,
    LineComment,
    BlockComment,
    Str(u8),
    Template,
}

#[derive(Debug, Clone, Copy)]
enum Frame {
    Block(usize),
    Substitution,
}

impl BlockIndex {
    /// Scan `src` once and record every balanced brace region
    pub fn build(src: &str) -> Self {
        let bytes = src.as_bytes();
        let mut blocks: Vec<Block> = Vec::new();
        let mut frames: Vec<Frame> = Vec::new();
        let mut mode = Mode::Code;
        let mut line = 0usize;
        let mut escaped = false;
        let mut i = 0usize;

        while i < bytes.len() {
            let b = bytes[i];
            let next = bytes.get(i + 1).copied();

            match mode {
                Mode::Code => match b {
                    b'/' if next == Some(b'/') => {
                        mode = Mode::LineComment;
                        i += 1;
                    }
                    b'/' if next == Some(b'*') => {
                        mode = Mode::BlockComment;
                        i += 1;
                    }
                    b'\'' | b'"' => mode = Mode::Str(b),
                    b'`' => mode = Mode::Template,
                    b'{' => {
                        frames.push(Frame::Block(blocks.len()));
                        blocks.push(Block {
                            open: i,
                            close: None,
                            open_line: line,
                            close_line: None,
                        });
                    }
                    b'}' => match frames.pop() {
                        Some(Frame::Block(idx)) => {
                            blocks[idx].close = Some(i);
                            blocks[idx].close_line = Some(line);
                        }
                        Some(Frame::Substitution) => mode = Mode::Template,
                        None => {}
                    },
                    _ => {}
                },
                Mode::LineComment => {
                    if b == b'\n' {
                        mode = Mode::Code;
                    }
                }
                Mode::BlockComment => {
                    if b == b'*' && next == Some(b'/') {
                        mode = Mode::Code;
                        i += 1;
                    }
                }
                Mode::Str(quote) => {
                    if escaped {
                        escaped = false;
                    } else if b == b'\\' {
                        escaped = true;
                    } else if b == quote || b == b'\n' {
                        // An unterminated literal ends at the line break
                        mode = Mode::Code;
                    }
                }
                Mode::Template => {
                    if escaped {
                        escaped = false;
                    } else if b == b'\\' {
                        escaped = true;
                    } else if b == b'`' {
                        mode = Mode::Code;
                    } else if b == b'$' && next == Some(b'{') {
                        frames.push(Frame::Substitution);
                        mode = Mode::Code;
                        i += 1;
                    }
                }
            }

            if b == b'\n' {
                line += 1;
            }
            i += 1;
        }

        BlockIndex { blocks }
    }

    pub fn get(&self, idx: usize) -> Option<&Block> {
        self.blocks.get(idx)
    }

    /// First block whose opening brace sits at or after `offset`
    pub fn first_open_from(&self, offset: usize) -> Option<usize> {
        let idx = self.blocks.partition_point(|b| b.open < offset);
        (idx < self.blocks.len()).then_some(idx)
    }

    /// Block whose opening brace is exactly at `offset`
    pub fn block_at(&self, offset: usize) -> Option<usize> {
        let idx = self.first_open_from(offset)?;
        (self.blocks[idx].open == offset).then_some(idx)
    }
}
