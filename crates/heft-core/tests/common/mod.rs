//! Fixture builders shared by the integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use object::write::{Object, Symbol as WriteSymbol, SymbolSection};
use object::{
    Architecture, BinaryFormat, Endianness, SectionKind, SymbolFlags, SymbolKind, SymbolScope,
};

pub const SENTINEL: &str = "0123456789abcdef";

/// Module info of a binary whose main module is unversioned and which has one dependency.
pub const APP_MODULE_INFO: &str = "path\texample.com/app\n\
                                   mod\texample.com/app\t(devel)\t\n\
                                   dep\texample.com/lib\tv1.2.3\th1:abc=\n";

fn push_uvarint(out: &mut Vec<u8>, mut value: u64)
{
    while value >= 0x80 {
        out.push((value as u8) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

fn push_string(out: &mut Vec<u8>, text: &str)
{
    push_uvarint(out, text.len() as u64);
    out.extend_from_slice(text.as_bytes());
}

/// Inline build-info record as written by current toolchains.
pub fn build_info_blob(version: &str, module_info: &str) -> Vec<u8>
{
    let mut blob = b"\xff Go buildinf:".to_vec();
    blob.push(8);
    blob.push(2);
    blob.resize(32, 0);
    push_string(&mut blob, version);
    push_string(&mut blob, &format!("{SENTINEL}{module_info}{SENTINEL}"));
    blob
}

/// Relocatable object with one text symbol per `(name, size)` and an optional build-info section.
pub fn object_file(format: BinaryFormat, symbols: &[(&str, u64)], build_info: Option<&[u8]>) -> Vec<u8>
{
    let mut object = Object::new(format, Architecture::X86_64, Endianness::Little);

    if !symbols.is_empty() {
        let text = object.section_id(object::write::StandardSection::Text);
        for (name, size) in symbols {
            let code = vec![0x90u8; (*size).max(1) as usize];
            let offset = object.append_section_data(text, &code, 1);
            object.add_symbol(WriteSymbol {
                name: name.as_bytes().to_vec(),
                value: offset,
                size: *size,
                kind: SymbolKind::Text,
                scope: SymbolScope::Linkage,
                weak: false,
                section: SymbolSection::Section(text),
                flags: SymbolFlags::None,
            });
        }
    }

    if let Some(blob) = build_info {
        let (segment, name) = match format {
            BinaryFormat::MachO => (b"__DATA".to_vec(), b"__go_buildinfo".to_vec()),
            _ => (Vec::new(), b".go.buildinfo".to_vec()),
        };
        let section = object.add_section(segment, name, SectionKind::Data);
        object.append_section_data(section, blob, 16);
    }

    object.write().unwrap()
}

/// ELF object carrying the given symbols and the standard app build info.
pub fn app_elf(symbols: &[(&str, u64)]) -> Vec<u8>
{
    let blob = build_info_blob("go1.22.1", APP_MODULE_INFO);
    object_file(BinaryFormat::Elf, symbols, Some(&blob))
}

/// Write `files` (relative path, byte count) below `root`.
pub fn write_tree(root: &Path, files: &[(&str, usize)])
{
    for (relative, len) in files {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, vec![b'x'; *len]).unwrap();
    }
}

/// Section header fields of a little-endian ELF64 image.
struct ElfSectionHeader
{
    header_offset: usize,
    kind: u32,
    offset: usize,
    size: usize,
    link: usize,
}

fn read_u16(data: &[u8], at: usize) -> usize
{
    u16::from_le_bytes(data[at..at + 2].try_into().unwrap()) as usize
}

fn read_u32(data: &[u8], at: usize) -> u32
{
    u32::from_le_bytes(data[at..at + 4].try_into().unwrap())
}

fn read_u64(data: &[u8], at: usize) -> usize
{
    u64::from_le_bytes(data[at..at + 8].try_into().unwrap()) as usize
}

fn elf_section_headers(data: &[u8]) -> Vec<ElfSectionHeader>
{
    let table = read_u64(data, 0x28);
    let entry_size = read_u16(data, 0x3a);
    let count = read_u16(data, 0x3c);
    (0..count)
        .map(|index| {
            let at = table + index * entry_size;
            ElfSectionHeader {
                header_offset: at,
                kind: read_u32(data, at + 4),
                offset: read_u64(data, at + 0x18),
                size: read_u64(data, at + 0x20),
                link: read_u32(data, at + 0x28) as usize,
            }
        })
        .collect()
}

fn elf_symtab(data: &[u8]) -> ElfSectionHeader
{
    elf_section_headers(data)
        .into_iter()
        .find(|header| header.kind == object::elf::SHT_SYMTAB)
        .expect("ELF fixture has a .symtab")
}

/// Relabel the static symbol table of an ELF64 fixture as a dynamic one.
pub fn relabel_symtab_as_dynsym(data: &mut [u8])
{
    let symtab = elf_symtab(data);
    let at = symtab.header_offset + 4;
    data[at..at + 4].copy_from_slice(&object::elf::SHT_DYNSYM.to_le_bytes());
}

/// Point the section index of the ELF64 symbol called `name` at `section`.
pub fn set_symbol_section_index(data: &mut [u8], name: &str, section: u16)
{
    const SYMBOL_SIZE: usize = 24;

    let symtab = elf_symtab(data);
    let strtab = &elf_section_headers(data)[symtab.link];
    let strings = &data[strtab.offset..strtab.offset + strtab.size];

    for start in (symtab.offset..symtab.offset + symtab.size).step_by(SYMBOL_SIZE) {
        let name_offset = read_u32(data, start) as usize;
        let end = strings[name_offset..].iter().position(|byte| *byte == 0).unwrap();
        if &strings[name_offset..name_offset + end] == name.as_bytes() {
            data[start + 6..start + 8].copy_from_slice(&section.to_le_bytes());
            return;
        }
    }
    panic!("symbol {name} not found in fixture");
}
