//! Block tree of a FIF file.
//!
//! The flat tag directory is folded into nested [`Node`]s by pairing
//! `FIFF_BLOCK_START` / `FIFF_BLOCK_END` tags, like `mne._fiff.tree.make_dir_tree`.
use std::io::{Read, Seek};
use anyhow::Result;

use super::constants::*;
use super::tag::{read_directory, read_i32, read_tag_header, TagHeader};

#[derive(Debug, Default, Clone)]
pub struct Node {
    /// Block kind (`FIFFB_MEAS`, `FIFFB_RAW_DATA`, ...); 0 for the root.
    pub block:    i32,
    /// Non-structural tags directly inside this block.
    pub entries:  Vec<TagHeader>,
    pub children: Vec<Node>,
}

impl Node {
    /// Depth-first search for the first block of the given kind.
    pub fn find_block(&self, kind: i32) -> Option<&Node> {
        if self.block == kind {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find_block(kind))
    }

    /// Tags of the given kind directly inside this block (no recursion).
    pub fn tags(&self, kind: i32) -> impl Iterator<Item = &TagHeader> {
        self.entries.iter().filter(move |e| e.kind == kind)
    }
}

/// Fold a flat directory into a tree. `block_kind` resolves the payload of
/// each `FIFF_BLOCK_START` tag.
pub fn assemble<F>(directory: &[TagHeader], mut block_kind: F) -> Result<Node>
where
    F: FnMut(&TagHeader) -> Result<i32>,
{
    let mut stack: Vec<Node> = vec![Node::default()];
    for tag in directory {
        match tag.kind {
            FIFF_BLOCK_START => {
                stack.push(Node { block: block_kind(tag)?, ..Node::default() });
            }
            FIFF_BLOCK_END if stack.len() > 1 => {
                let finished = stack.pop().unwrap_or_default();
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(finished);
                }
            }
            FIFF_BLOCK_END => {} // unbalanced end at root level
            _ => {
                if let Some(node) = stack.last_mut() {
                    node.entries.push(*tag);
                }
            }
        }
    }
    // Unterminated blocks are attached to their parents.
    while stack.len() > 1 {
        let orphan = stack.pop().unwrap_or_default();
        if let Some(parent) = stack.last_mut() {
            parent.children.push(orphan);
        }
    }
    Ok(stack.pop().unwrap_or_default())
}

/// Build the tree, reading block kinds from the file.
pub fn read_tree<R: Read + Seek>(reader: &mut R, directory: &[TagHeader]) -> Result<Node> {
    assemble(directory, |tag| read_i32(reader, tag))
}

/// Slow path: follow the `next` chain from offset 0 and collect every header.
pub fn scan_directory<R: Read + Seek>(reader: &mut R) -> Result<Vec<TagHeader>> {
    let mut directory = Vec::new();
    let mut pos = Some(0_u64);
    while let Some(p) = pos {
        let tag = read_tag_header(reader, p)?;
        pos = tag.next_pos();
        directory.push(tag);
    }
    Ok(directory)
}

/// Fast path: the directory embedded at the offset stored in `FIFF_DIR_POINTER`.
/// Returns `None` when the file has no usable embedded directory.
pub fn try_load_directory<R: Read + Seek>(reader: &mut R) -> Result<Option<Vec<TagHeader>>> {
    let id_tag = read_tag_header(reader, 0)?;
    if id_tag.kind != FIFF_FILE_ID {
        return Ok(None);
    }
    let Some(next) = id_tag.next_pos() else { return Ok(None) };
    let ptr_tag = read_tag_header(reader, next)?;
    if ptr_tag.kind != FIFF_DIR_POINTER {
        return Ok(None);
    }
    let dir_pos = read_i32(reader, &ptr_tag)?;
    if dir_pos <= 0 {
        return Ok(None);
    }
    let dir_tag = read_tag_header(reader, dir_pos as u64)?;
    if dir_tag.ftype != FIFFT_DIR_ENTRY_STRUCT {
        return Ok(None);
    }
    Ok(Some(read_directory(reader, &dir_tag)?))
}
